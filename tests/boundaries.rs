mod support;

use hardsim::core::{EventLog, EventScheduler, ParticleId, StepOutcome};
use hardsim::error::{Error, Result};
use hardsim::potential::{HardSphere, HardWalls, PotentialTable, SquareWell, Tether};
use hardsim::setup::GasSetup;
use support::{assert_close, exact_config, init_tracing, particle};

fn separation(sim: &EventScheduler, a: usize, b: usize) -> Result<f64> {
    let (pa, pb) = (sim.particle(ParticleId(a))?, sim.particle(ParticleId(b))?);
    Ok(pa
        .r
        .iter()
        .zip(&pb.r)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}

#[test]
fn particle_bounces_between_opposite_walls() -> Result<()> {
    init_tracing();
    let table = PotentialTable::uniform(HardSphere::new(1.0)?);
    let walls = HardWalls::from_table([4.0, 4.0, 4.0], &table)?;
    let particles = vec![particle([2.0, 2.0, 2.0], [1.0, 0.0, 0.0])];
    let mut sim = EventScheduler::new(particles, table, exact_config())?.with_walls(walls)?;
    let log = EventLog::new();
    sim.add_listener(log.clone());
    sim.initialize()?;

    assert_eq!(sim.advance_to(10.0)?, 3);
    let events = log.events();
    let walls_hit: Vec<Option<u32>> = events.iter().map(|e| e.wall_id).collect();
    assert_eq!(walls_hit, vec![Some(1), Some(0), Some(1)]);
    for (event, expected) in events.iter().zip([1.5, 4.5, 7.5]) {
        assert!(event.is_wall());
        assert_eq!(event.b, None);
        assert_close(event.time, expected, 1e-12);
        assert_close(event.virial, 2.0, 1e-12);
    }
    assert_close(sim.wall_impulse_total(), 6.0, 1e-12);
    assert_eq!(sim.virial_total(), 0.0);

    let p = sim.particle(ParticleId(0))?;
    assert_close(sim.time(), 10.0, 1e-12);
    assert_close(p.r[0], 3.0, 1e-12);
    assert_close(p.velocity()[0], 1.0, 1e-12);
    Ok(())
}

#[test]
fn boxed_gas_stays_inside_and_keeps_its_energy() -> Result<()> {
    init_tracing();
    let box_size = [6.0, 6.0, 6.0];
    let table = PotentialTable::uniform(HardSphere::new(0.6)?);
    let walls = HardWalls::from_table(box_size, &table)?;
    let particles = GasSetup::new(30, box_size, 0.6).seed(99).build()?;
    let mut sim = EventScheduler::new(particles, table, exact_config())?.with_walls(walls)?;
    sim.initialize()?;
    let ke0 = sim.kinetic_energy();

    let processed = sim.advance_to(20.0)?;
    assert!(processed > 30);
    assert_close(sim.kinetic_energy(), ke0, 1e-9 * ke0);
    assert_eq!(sim.potential_energy()?, 0.0);
    assert!(sim.wall_impulse_total() > 0.0);
    sim.verify_against_all_pairs()?;
    Ok(())
}

#[test]
fn particle_outside_the_box_is_rejected() -> Result<()> {
    init_tracing();
    let table = PotentialTable::uniform(HardSphere::new(1.0)?);
    let walls = HardWalls::from_table([4.0, 4.0, 4.0], &table)?;
    let particles = vec![particle([0.2, 2.0, 2.0], [1.0, 0.0, 0.0])];
    let mut sim = EventScheduler::new(particles, table, exact_config())?.with_walls(walls)?;
    assert!(matches!(sim.initialize(), Err(Error::InvalidParam(_))));
    Ok(())
}

#[test]
fn tether_keeps_a_bonded_pair_within_its_length() -> Result<()> {
    init_tracing();
    let particles = vec![
        particle([0.0, 0.0, 0.0], [-1.0, 0.0, 0.0]),
        particle([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    let mut sim = EventScheduler::new(particles, PotentialTable::ideal(1), exact_config())?;
    sim.add_bond(ParticleId(0), ParticleId(1), Tether::new(2.0)?)?;
    sim.initialize()?;
    let ke0 = sim.kinetic_energy();

    let StepOutcome::Collision(first) = sim.step()? else {
        panic!("tether must catch the pair");
    };
    assert_eq!(first.potential, "tether");
    assert_close(first.time, 0.5, 1e-12);
    assert!(separation(&sim, 0, 1)? < 2.0);

    // coreless: the pair passes through itself and is caught on the far side
    let StepOutcome::Collision(second) = sim.step()? else {
        panic!("tether must catch the pair again");
    };
    assert_close(second.time, 2.5, 1e-9);

    for _ in 0..8 {
        sim.step()?;
        assert!(separation(&sim, 0, 1)? <= 2.0 * (1.0 + 1e-9));
    }
    assert_close(sim.kinetic_energy(), ke0, 1e-9);
    assert_eq!(sim.potential_energy()?, 0.0);
    assert_eq!(sim.bonds().len(), 1);
    assert_eq!(sim.catalog().pair_count(), 0);
    Ok(())
}

#[test]
fn overstretched_tether_halts_the_engine() -> Result<()> {
    init_tracing();
    let particles = vec![
        particle([0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        particle([3.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
    ];
    let mut sim = EventScheduler::new(particles, PotentialTable::ideal(1), exact_config())?;
    sim.add_bond(ParticleId(0), ParticleId(1), Tether::new(2.0)?)?;
    let err = sim.initialize().unwrap_err();
    assert!(matches!(err, Error::ContractViolation(_)));
    assert!(sim.step().is_err());
    Ok(())
}

#[test]
fn square_well_reflects_a_slow_pair_and_releases_a_fast_one() -> Result<()> {
    init_tracing();
    let table = || -> Result<PotentialTable> { Ok(PotentialTable::uniform(SquareWell::new(1.0, 1.5, 0.5)?)) };

    // normal kinetic energy 0.01 < depth: bounced back into the well
    let slow = vec![
        particle([0.0, 0.0, 0.0], [-0.1, 0.0, 0.0]),
        particle([1.2, 0.0, 0.0], [0.1, 0.0, 0.0]),
    ];
    let mut sim = EventScheduler::new(slow, table()?, exact_config())?;
    sim.initialize()?;
    assert_close(sim.potential_energy()?, -0.5, 1e-12);
    let StepOutcome::Collision(bounce) = sim.step()? else {
        panic!("slow pair must reach the well edge");
    };
    assert_eq!(bounce.energy_change, 0.0);
    assert_close(bounce.virial, 0.2, 1e-12);
    assert_close(sim.particle(ParticleId(0))?.velocity()[0], 0.1, 1e-12);
    assert!(separation(&sim, 0, 1)? < 1.5);
    assert_close(sim.potential_energy()?, -0.5, 1e-12);

    // normal kinetic energy 1 > depth: escapes, slower, just outside
    let fast = vec![
        particle([0.0, 0.0, 0.0], [-1.0, 0.0, 0.0]),
        particle([1.2, 0.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    let mut sim = EventScheduler::new(fast, table()?, exact_config())?;
    sim.initialize()?;
    let ke0 = sim.kinetic_energy();
    let StepOutcome::Collision(escape) = sim.step()? else {
        panic!("fast pair must reach the well edge");
    };
    assert_eq!(escape.energy_change, 0.5);
    assert_close(sim.kinetic_energy(), ke0 - 0.5, 1e-12);
    assert!(separation(&sim, 0, 1)? > 1.5);
    assert_eq!(sim.potential_energy()?, 0.0);
    assert_close(sim.energy_change_total(), 0.5, 1e-12);
    Ok(())
}
