mod support;

use hardsim::config::EngineConfig;
use hardsim::core::{EngineState, EventScheduler, ParticleId, StepOutcome};
use hardsim::error::{Error, Result};
use hardsim::potential::{HardSphere, PotentialTable, Tether};
use hardsim::setup::GasSetup;
use support::{assert_close, exact_config, init_tracing, particle};

fn approaching_pair(config: EngineConfig) -> Result<EventScheduler> {
    let particles = vec![
        particle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
        particle([5.0, 0.0, 0.0], [-1.0, 0.0, 0.0]),
    ];
    EventScheduler::new(particles, PotentialTable::uniform(HardSphere::new(1.0)?), config)
}

#[test]
fn state_machine_transitions() -> Result<()> {
    init_tracing();
    let mut sim = approaching_pair(exact_config())?;
    assert_eq!(sim.state(), EngineState::Uninitialized);
    assert!(matches!(sim.pause(), Err(Error::InvalidState(_))));
    assert!(matches!(sim.advance_to(1.0), Err(Error::InvalidState(_))));

    sim.initialize()?;
    assert_eq!(sim.state(), EngineState::Initialized);
    assert!(sim.unpause().is_err());

    sim.advance_to(0.5)?;
    assert_eq!(sim.state(), EngineState::Running);

    sim.pause()?;
    assert_eq!(sim.state(), EngineState::Paused);
    assert!(matches!(sim.step(), Err(Error::InvalidState(_))));
    assert_close(sim.time(), 0.5, 1e-12);

    sim.unpause()?;
    assert!(matches!(sim.step()?, StepOutcome::Collision(_)));

    sim.halt()?;
    assert_eq!(sim.state(), EngineState::Halted);
    assert!(sim.step().is_err());
    assert!(sim.halt().is_err());
    assert!(sim.unpause().is_err());
    Ok(())
}

#[test]
fn setup_is_frozen_after_initialization() -> Result<()> {
    init_tracing();
    let mut sim = approaching_pair(exact_config())?;
    sim.initialize()?;
    let err = sim.add_bond(ParticleId(0), ParticleId(1), Tether::new(8.0)?);
    assert!(matches!(err, Err(Error::InvalidState(_))));
    Ok(())
}

#[test]
fn advance_rejects_going_backwards() -> Result<()> {
    init_tracing();
    let mut sim = approaching_pair(exact_config())?;
    sim.initialize()?;
    sim.advance_to(3.0)?;
    assert!(matches!(sim.advance_to(1.0), Err(Error::InvalidParam(_))));
    assert!(matches!(sim.advance_by(-1.0), Err(Error::InvalidParam(_))));
    assert!(sim.advance_to(f64::NAN).is_err());
    // rejected input is not fatal
    assert_eq!(sim.state(), EngineState::Running);
    assert_eq!(sim.advance_by(1.0)?, 0);
    assert_close(sim.time(), 4.0, 1e-12);
    Ok(())
}

#[test]
fn advance_drifts_past_the_last_collision() -> Result<()> {
    init_tracing();
    let mut sim = approaching_pair(exact_config())?;
    sim.initialize()?;
    assert_eq!(sim.advance_to(5.0)?, 1);
    // after the bounce at t = 2 both particles recede at unit speed
    let a = sim.particle(ParticleId(0))?;
    assert_close(a.r[0], 2.0 - 3.0, 1e-12);
    assert_eq!(sim.next_collision_time(), f64::INFINITY);
    Ok(())
}

#[test]
fn verification_accepts_a_fresh_catalog_under_the_default_policy() -> Result<()> {
    init_tracing();
    let config = EngineConfig {
        verify_neighbors: true,
        ..EngineConfig::default()
    };
    // the pair is outside the catalog but cannot meet before the next rebuild
    let mut sim = approaching_pair(config)?;
    sim.initialize()?;
    assert_eq!(sim.catalog().pair_count(), 0);
    sim.verify_against_all_pairs()?;
    assert_eq!(sim.advance_to(3.0)?, 1);
    assert_eq!(sim.state(), EngineState::Running);
    Ok(())
}

#[test]
fn interval_policy_keeps_displacement_within_half_the_margin() -> Result<()> {
    init_tracing();
    let particles = GasSetup::new(60, [6.0, 6.0, 6.0], 0.8).seed(2).build()?;
    let config = EngineConfig {
        neighbor_rebuild_interval: 10,
        ..EngineConfig::default()
    };
    let limit = 0.5 * config.neighbor_safety_margin;
    let mut sim = EventScheduler::new(particles, PotentialTable::uniform(HardSphere::new(0.8)?), config)?;
    sim.initialize()?;
    assert_eq!(sim.catalog().rebuilds(), 1);
    for _ in 0..200 {
        if sim.step()? == StepOutcome::NoFurtherEvents {
            break;
        }
        assert!(sim.catalog().max_displacement(sim.particles()) < limit);
    }
    assert!(sim.catalog().rebuilds() > 1);
    Ok(())
}

#[test]
fn inserted_particle_joins_the_catalog() -> Result<()> {
    init_tracing();
    let mut sim = approaching_pair(exact_config())?;
    sim.initialize()?;
    // lands between the pair, heading for the first particle
    let id = sim.insert_particle(particle([2.5, 0.0, 0.0], [-2.0, 0.0, 0.0]))?;
    assert_eq!(id, ParticleId(2));
    assert_eq!(sim.num_particles(), 3);

    let StepOutcome::Collision(event) = sim.step()? else {
        panic!("inserted particle must collide");
    };
    assert_eq!((event.a, event.b), (ParticleId(0), Some(id)));
    // gap 1.5 closed at relative speed 3
    assert_close(event.time, 0.5, 1e-12);
    sim.verify_against_all_pairs()?;
    Ok(())
}

#[test]
fn removed_particle_frees_its_partner() -> Result<()> {
    init_tracing();
    let wide = EngineConfig {
        neighbor_safety_margin: 5.0,
        ..exact_config()
    };
    let mut sim = approaching_pair(wide)?;
    sim.initialize()?;
    assert_eq!(sim.record(ParticleId(0)).partner(), Some(ParticleId(1)));
    sim.advance_to(1.0)?;

    let removed = sim.remove_particle(ParticleId(1))?;
    assert_close(removed.r[0], 4.0, 1e-12);
    assert_eq!(sim.num_particles(), 1);
    assert_eq!(sim.record(ParticleId(0)).time, f64::INFINITY);
    assert!(sim.particle(ParticleId(1)).is_err());
    assert!(sim.remove_particle(ParticleId(1)).is_err());
    assert_eq!(sim.step()?, StepOutcome::NoFurtherEvents);

    // handles are not reused
    let id = sim.insert_particle(particle([4.0, 0.0, 0.0], [0.0, 0.0, 0.0]))?;
    assert_eq!(id, ParticleId(2));
    Ok(())
}

#[test]
fn config_document_drives_the_engine() -> Result<()> {
    init_tracing();
    let config = EngineConfig::from_toml_str(
        r#"
        neighbor_safety_margin = 1.0
        neighbor_rebuild_policy = "displacement"
        verify_neighbors = true
        "#,
    )?;
    assert_eq!(config.neighbor_rebuild_interval, 20);
    let mut sim = approaching_pair(config)?;
    sim.initialize()?;
    assert_eq!(sim.config().neighbor_safety_margin, 1.0);
    assert_eq!(sim.advance_to(3.0)?, 1);

    assert!(matches!(
        EngineConfig::from_toml_str("neighbor_safety_margin = \"wide\""),
        Err(Error::Config(_))
    ));
    Ok(())
}
