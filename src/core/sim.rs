use super::directive::{Direction, TraversalDirective};
use super::event::{CollisionEvent, CollisionListener};
use super::particle::{Particle, ParticleId, DIM};
use super::sequence::OrderedParticleSequence;
use super::state::{Collider, CollisionRecord, ParticleCollisionState};
use super::vector::{self, Vector};
use crate::config::{EngineConfig, RebuildPolicy};
use crate::error::{Error, Result};
use crate::neighbor::{Criterion, CutoffCriterion, NeighborCatalog};
use crate::potential::{
    BondList, CollisionPotential, HardWalls, PairKinematics, Potential, PotentialTable,
};
use std::fmt;
use tracing::{debug, error, info, trace, warn};

/// Small numeric tolerance for time checks.
const EPS_TIME: f64 = 1e-12;

/// How far in the past a record may point before it counts as a missed
/// collision rather than rounding.
const PAST_TOLERANCE: f64 = 1e-9;

/// Fraction of the half safety margin a particle may use up before the
/// displacement policy rebuilds, so unlisted pairs stay strictly out of range.
const DEADLINE_SLACK: f64 = 0.999;

/// Lifecycle of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
    Running,
    Paused,
    Halted,
}

/// Result of a single [`EventScheduler::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Collision(CollisionEvent),
    /// No record predicts a finite collision.
    NoFurtherEvents,
}

/// Event-driven integrator: advances all particles from one collision to
/// the next and keeps every particle's prediction current.
///
/// Each particle's record holds its earliest collision with an up-neighbor,
/// an up bonded partner or a wall. After a collision only the records that
/// involve the colliders are recomputed:
/// - down-neighbors that were predicting a collision with a collider
/// - the colliders themselves, looking up
/// - down-neighbors of the colliders, if a collider is now their earliest hit
pub struct EventScheduler {
    config: EngineConfig,
    state: EngineState,
    particles: OrderedParticleSequence,
    potentials: PotentialTable,
    bonds: BondList,
    walls: Option<HardWalls>,
    catalog: NeighborCatalog,
    criterion: CutoffCriterion,
    records: ParticleCollisionState,
    listeners: Vec<Box<dyn CollisionListener>>,
    time_now: f64,
    /// Absolute time by which some particle may have moved half the
    /// safety margin.
    rebuild_deadline: f64,
    collisions: u64,
    since_rebuild: u64,
    virial_since_query: f64,
    virial_total: f64,
    wall_impulse_total: f64,
    energy_change_total: f64,
}

impl fmt::Debug for EventScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventScheduler")
            .field("state", &self.state)
            .field("time", &self.time_now)
            .field("particles", &self.particles.len())
            .field("collisions", &self.collisions)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl EventScheduler {
    /// Create a scheduler over `particles`, ordered as given. Handles are
    /// assigned in the same order starting from `ParticleId(0)`.
    pub fn new<I>(particles: I, potentials: PotentialTable, config: EngineConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Particle>,
    {
        config.validate()?;
        let catalog = NeighborCatalog::new(config.neighbor_safety_margin)?;
        let criterion = CutoffCriterion::new(potentials.max_range() + config.neighbor_safety_margin)?;
        Ok(Self {
            config,
            state: EngineState::Uninitialized,
            particles: OrderedParticleSequence::from_particles(particles),
            potentials,
            bonds: BondList::new(),
            walls: None,
            catalog,
            criterion,
            records: ParticleCollisionState::new(),
            listeners: Vec::new(),
            time_now: 0.0,
            rebuild_deadline: f64::INFINITY,
            collisions: 0,
            since_rebuild: 0,
            virial_since_query: 0.0,
            virial_total: 0.0,
            wall_impulse_total: 0.0,
            energy_change_total: 0.0,
        })
    }

    /// Builder form of [`set_walls`](Self::set_walls).
    pub fn with_walls(mut self, walls: HardWalls) -> Result<Self> {
        self.set_walls(walls)?;
        Ok(self)
    }

    /// Confine the particles to a hard-walled box. Only before initialization.
    pub fn set_walls(&mut self, walls: HardWalls) -> Result<()> {
        self.require_uninitialized("install walls")?;
        self.walls = Some(walls);
        Ok(())
    }

    /// Bond two particles with their own potential. Only before initialization.
    pub fn add_bond(&mut self, a: ParticleId, b: ParticleId, potential: impl Into<Potential>) -> Result<()> {
        self.require_uninitialized("add bonds")?;
        self.particles.particle(a)?;
        self.particles.particle(b)?;
        self.bonds.add_bond(a, b, potential)
    }

    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: CollisionListener + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn require_uninitialized(&self, what: &str) -> Result<()> {
        if self.state != EngineState::Uninitialized {
            return Err(Error::InvalidState(format!(
                "cannot {what} once the engine is {:?}",
                self.state
            )));
        }
        Ok(())
    }

    // ---------- lifecycle ----------

    /// Build the neighbor catalog and every particle's record.
    pub fn initialize(&mut self) -> Result<()> {
        self.require_uninitialized("initialize")?;
        let result = self.validate_setup().and_then(|()| self.rebuild_neighbors());
        self.guard(result)?;
        self.state = EngineState::Initialized;
        info!(
            particles = self.particles.len(),
            neighbor_pairs = self.catalog.pair_count(),
            bonds = self.bonds.len(),
            walls = self.walls.is_some(),
            neighbor_radius = self.criterion.radius(),
            "event scheduler initialized"
        );
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            EngineState::Initialized | EngineState::Running => {
                self.state = EngineState::Paused;
                Ok(())
            }
            s => Err(Error::InvalidState(format!("cannot pause while {s:?}"))),
        }
    }

    pub fn unpause(&mut self) -> Result<()> {
        match self.state {
            EngineState::Paused => {
                self.state = EngineState::Running;
                Ok(())
            }
            s => Err(Error::InvalidState(format!("cannot unpause while {s:?}"))),
        }
    }

    /// Stop for good. Every later step or advance fails.
    pub fn halt(&mut self) -> Result<()> {
        if self.state == EngineState::Halted {
            return Err(Error::InvalidState("engine already halted".into()));
        }
        self.state = EngineState::Halted;
        info!(time = self.time_now, collisions = self.collisions, "event scheduler halted");
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn require_steppable(&self) -> Result<()> {
        match self.state {
            EngineState::Initialized | EngineState::Running => Ok(()),
            s => Err(Error::InvalidState(format!("cannot advance while {s:?}"))),
        }
    }

    /// Halt on a fatal error before handing it back.
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() {
                error!(error = %e, time = self.time_now, "halting after fatal error");
                self.state = EngineState::Halted;
            }
        }
        result
    }

    // ---------- stepping ----------

    /// Process the earliest pending collision.
    pub fn step(&mut self) -> Result<StepOutcome> {
        self.require_steppable()?;
        self.state = EngineState::Running;
        let result = self.step_inner();
        self.guard(result)
    }

    fn step_inner(&mut self) -> Result<StepOutcome> {
        let Some((owner, record)) = self.next_event(f64::INFINITY)? else {
            return Ok(StepOutcome::NoFurtherEvents);
        };
        let Some(collider) = record.collider else {
            return Ok(StepOutcome::NoFurtherEvents);
        };
        if record.time < -PAST_TOLERANCE {
            return Err(Error::ContractViolation(format!(
                "collision of {owner} scheduled {} in the past",
                -record.time
            )));
        }
        self.free_flight(record.time.max(0.0));

        let event = match collider {
            Collider::Pair { partner, potential } => self.collide_pair(owner, partner, potential)?,
            Collider::Wall { wall_id } => self.collide_wall(owner, wall_id)?,
        };
        self.collisions += 1;
        self.since_rebuild += 1;
        trace!(
            time = event.time,
            a = %event.a,
            b = ?event.b,
            wall = ?event.wall_id,
            potential = event.potential,
            virial = event.virial,
            "collision"
        );
        for listener in &mut self.listeners {
            listener.on_collision(&event);
        }

        self.refresh_after(event.a, event.b)?;
        for id in std::iter::once(event.a).chain(event.b) {
            let deadline = self.deadline_for(self.particles.particle(id)?);
            self.rebuild_deadline = self.rebuild_deadline.min(deadline);
        }
        self.maybe_rebuild()?;
        self.records.compact(&self.particles)?;
        Ok(StepOutcome::Collision(event))
    }

    /// Process every collision up to absolute time `target`, then drift the
    /// remainder. Returns the number of collisions processed.
    pub fn advance_to(&mut self, target: f64) -> Result<u64> {
        if !target.is_finite() {
            return Err(Error::InvalidParam("target time must be finite".into()));
        }
        if target < self.time_now - EPS_TIME {
            return Err(Error::InvalidParam(
                "target time cannot be earlier than current time".into(),
            ));
        }
        self.require_steppable()?;
        self.state = EngineState::Running;

        let mut processed = 0;
        loop {
            let next = self.next_event(target);
            if self.guard(next)?.is_none() {
                break;
            }
            match self.step()? {
                StepOutcome::Collision(_) => processed += 1,
                StepOutcome::NoFurtherEvents => break,
            }
        }
        let dt = target - self.time_now;
        if dt > 0.0 {
            self.free_flight(dt);
            let result = self.maybe_rebuild();
            self.guard(result)?;
        }
        Ok(processed)
    }

    /// [`advance_to`](Self::advance_to) relative to the current time.
    pub fn advance_by(&mut self, dt: f64) -> Result<u64> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(Error::InvalidParam("time step must be finite and >= 0".into()));
        }
        self.advance_to(self.time_now + dt)
    }

    /// Earliest pending collision no later than `horizon`.
    ///
    /// Free flight never crosses the rebuild deadline: the catalog is
    /// rebuilt there first, whatever the policy. An empty queue is confirmed
    /// with a full scan before it is reported, since pairs outside the
    /// catalog may still meet.
    fn next_event(&mut self, horizon: f64) -> Result<Option<(ParticleId, CollisionRecord)>> {
        loop {
            let next = self.records.peek_min(&self.particles);
            let t_next = next.map_or(f64::INFINITY, |(_, r)| self.time_now + r.time.max(0.0));
            if self.rebuild_deadline < t_next.min(horizon) {
                if next.is_none() && self.all_pairs_min()?.is_infinite() {
                    return Ok(None);
                }
                self.free_flight(self.rebuild_deadline - self.time_now);
                debug!(time = self.time_now, "rebuild deadline reached");
                self.rebuild_neighbors()?;
                continue;
            }
            return Ok(next.filter(|_| t_next <= horizon));
        }
    }

    /// When `p` could first have moved half the safety margin, at its
    /// current speed.
    fn deadline_for(&self, p: &Particle) -> f64 {
        let speed = vector::norm_sq(&p.velocity()).sqrt();
        if speed == 0.0 {
            return f64::INFINITY;
        }
        let room = 0.5 * self.catalog.safety_margin() * DEADLINE_SLACK - self.catalog.displacement(p);
        self.time_now + room.max(0.0) / speed
    }

    /// Absolute time of the next collision, `+inf` when none is predicted.
    pub fn next_collision_time(&mut self) -> f64 {
        match self.records.peek_min(&self.particles) {
            Some((_, record)) => self.time_now + record.time.max(0.0),
            None => f64::INFINITY,
        }
    }

    fn free_flight(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        for p in self.particles.iter_mut() {
            p.drift(dt);
        }
        self.records.advance(dt);
        self.time_now += dt;
    }

    fn collide_pair(&mut self, a: ParticleId, b: ParticleId, potential: Potential) -> Result<CollisionEvent> {
        let (pa, pb) = self.particles.pair_mut(a, b)?;
        let k = PairKinematics::new(pa, pb)?;
        let bump = potential.impulse(&k)?;
        vector::add_scaled(&mut pa.p, 1.0, &bump.momentum_delta);
        vector::add_scaled(&mut pb.p, -1.0, &bump.momentum_delta);
        if bump.nudge != 0.0 {
            // mass-weighted so the center of mass stays put
            let mu = k.reduced_mass;
            let (sa, sb) = (-bump.nudge * pa.rm() * mu, bump.nudge * pb.rm() * mu);
            vector::add_scaled(&mut pa.r, sa, &k.dr);
            vector::add_scaled(&mut pb.r, sb, &k.dr);
        }
        pa.bump_collision_count();
        pb.bump_collision_count();

        self.virial_since_query += bump.virial;
        self.virial_total += bump.virial;
        self.energy_change_total += bump.energy_change;
        Ok(CollisionEvent {
            time: self.time_now,
            a,
            b: Some(b),
            wall_id: None,
            potential: potential.name(),
            virial: bump.virial,
            normal_velocity: k.normal_velocity(),
            reduced_mass: k.reduced_mass,
            energy_change: bump.energy_change,
        })
    }

    fn collide_wall(&mut self, id: ParticleId, wall_id: u32) -> Result<CollisionEvent> {
        let walls = self.walls.as_ref().ok_or_else(|| {
            Error::ContractViolation(format!("wall collision for {id} without walls"))
        })?;
        let p = self.particles.particle_mut(id)?;
        let v = p.velocity();
        let impulse = walls.bump(p, wall_id)?;
        p.bump_collision_count();
        self.wall_impulse_total += impulse;
        Ok(CollisionEvent {
            time: self.time_now,
            a: id,
            b: None,
            wall_id: Some(wall_id),
            potential: "wall",
            virial: impulse,
            normal_velocity: v[(wall_id / 2) as usize],
            reduced_mass: p.mass(),
            energy_change: 0.0,
        })
    }

    // ---------- record maintenance ----------

    /// Earliest collision of `id` with anything up from it.
    fn predict_up(&self, id: ParticleId) -> Result<CollisionRecord> {
        let p = self.particles.particle(id)?;
        let mut best = match &self.walls {
            Some(walls) => walls
                .collision_time(p)?
                .map_or(CollisionRecord::NONE, |(t, wall_id)| CollisionRecord::wall(t, wall_id)),
            None => CollisionRecord::NONE,
        };
        for (_, other) in TraversalDirective::up_from(id).pairs(&self.particles, &self.catalog) {
            let q = self.particles.particle(other)?;
            let potential = self.potentials.for_pair(p, q)?;
            let t = potential.collision_time(p, q)?;
            if t < best.time {
                best = CollisionRecord::pair(t, other, potential);
            }
        }
        for &(other, potential) in self.bonds.partners(id) {
            if !self.particles.is_up(id, other) {
                continue;
            }
            let t = potential.collision_time(p, self.particles.particle(other)?)?;
            if t < best.time {
                best = CollisionRecord::pair(t, other, potential);
            }
        }
        Ok(best)
    }

    fn recompute_up(&mut self, id: ParticleId) -> Result<()> {
        let record = self.predict_up(id)?;
        self.records.set(id, record)
    }

    /// Let every particle down from `c` adopt `c` if it is now its earliest hit.
    fn recompute_down(&mut self, c: ParticleId) -> Result<()> {
        let pc = self.particles.particle(c)?;
        for (_, d) in TraversalDirective::down_from(c).pairs(&self.particles, &self.catalog) {
            let pd = self.particles.particle(d)?;
            let potential = self.potentials.for_pair(pd, pc)?;
            let t = potential.collision_time(pd, pc)?;
            if t < self.records.get(d).time {
                self.records.set(d, CollisionRecord::pair(t, c, potential))?;
            }
        }
        for &(d, potential) in self.bonds.partners(c) {
            if !self.particles.is_up(d, c) {
                continue;
            }
            let t = potential.collision_time(self.particles.particle(d)?, pc)?;
            if t < self.records.get(d).time {
                self.records.set(d, CollisionRecord::pair(t, c, potential))?;
            }
        }
        Ok(())
    }

    /// Particles down from a collider whose record names a collider.
    fn dependents_of(&self, colliders: &[ParticleId]) -> Vec<ParticleId> {
        let mut stale: Vec<ParticleId> = colliders
            .iter()
            .flat_map(move |&c| {
                let bonded = self
                    .bonds
                    .partners(c)
                    .iter()
                    .map(|&(d, _)| d)
                    .filter(move |&d| self.particles.is_up(d, c));
                self.catalog.neighbors_of(c, Direction::Down).chain(bonded)
            })
            .filter(|d| !colliders.contains(d))
            .filter(|&d| {
                self.records
                    .get(d)
                    .partner()
                    .is_some_and(|partner| colliders.contains(&partner))
            })
            .collect();
        stale.sort_unstable();
        stale.dedup();
        stale
    }

    fn refresh_after(&mut self, a: ParticleId, b: Option<ParticleId>) -> Result<()> {
        let colliders: Vec<ParticleId> = std::iter::once(a).chain(b).collect();
        for d in self.dependents_of(&colliders) {
            self.recompute_up(d)?;
        }
        for &c in &colliders {
            self.recompute_up(c)?;
        }
        for &c in &colliders {
            self.recompute_down(c)?;
        }
        Ok(())
    }

    fn recompute_all(&mut self) -> Result<()> {
        self.records.clear();
        let ids = self.particles.ids().to_vec();
        for id in ids {
            self.recompute_up(id)?;
        }
        self.records.compact(&self.particles)
    }

    // ---------- neighbor catalog ----------

    fn maybe_rebuild(&mut self) -> Result<()> {
        let due = match self.config.neighbor_rebuild_policy {
            RebuildPolicy::Interval => {
                if self.since_rebuild < self.config.neighbor_rebuild_interval {
                    false
                } else {
                    self.since_rebuild = 0;
                    !self.catalog.is_fresh(&self.particles)
                }
            }
            RebuildPolicy::Displacement => !self.catalog.is_fresh(&self.particles),
        };
        if due || self.time_now >= self.rebuild_deadline {
            self.rebuild_neighbors()?;
        }
        Ok(())
    }

    fn rebuild_neighbors(&mut self) -> Result<()> {
        let mut max_displacement = 0.0;
        if self.catalog.rebuilds() > 0 {
            max_displacement = self.catalog.max_displacement(&self.particles);
            let limit = 0.5 * self.catalog.safety_margin();
            if max_displacement >= limit {
                warn!(
                    max_displacement,
                    safe_limit = limit,
                    "particles exceeded the safe neighbor limit between rebuilds"
                );
            }
            if self.config.verify_neighbors {
                self.verify_against_all_pairs()?;
            }
        }

        let bonds = &self.bonds;
        let cutoff = self.criterion;
        let accept = |a: &Particle, b: &Particle| cutoff.accept(a, b) && !bonds.is_bonded(a.id(), b.id());
        let pairs = self.catalog.rebuild(&self.particles, &accept);
        self.since_rebuild = 0;
        debug!(
            pairs,
            max_displacement,
            rebuilds = self.catalog.rebuilds(),
            time = self.time_now,
            "neighbor catalog rebuilt"
        );

        self.rebuild_deadline = self
            .particles
            .iter()
            .map(|p| self.deadline_for(p))
            .fold(f64::INFINITY, f64::min);

        self.recompute_all()?;
        if self.config.verify_neighbors {
            self.verify_against_all_pairs()?;
        }
        Ok(())
    }

    /// Check every type pair present has a potential and every particle
    /// sits inside the walls.
    fn validate_setup(&self) -> Result<()> {
        let mut present = vec![false; self.potentials.n_types()];
        for p in self.particles.iter() {
            match present.get_mut(p.kind) {
                Some(seen) => *seen = true,
                None => return Err(Error::MissingPotential(p.kind, p.kind)),
            }
        }
        for i in 0..present.len() {
            for j in i..present.len() {
                if present[i] && present[j] {
                    self.potentials.get(i, j)?;
                }
            }
        }
        if let Some(walls) = &self.walls {
            if let Some(p) = self.particles.iter().find(|p| walls.energy(p).is_infinite()) {
                return Err(Error::InvalidParam(format!(
                    "particle {} at {:?} lies outside the box",
                    p.id(),
                    p.r
                )));
            }
        }
        Ok(())
    }

    /// Earliest collision time from a full scan of every pair, every bond
    /// and every wall, ignoring the catalog.
    fn all_pairs_min(&self) -> Result<f64> {
        let mut best = f64::INFINITY;
        for p in self.particles.iter() {
            if let Some(walls) = &self.walls {
                if let Some((t, _)) = walls.collision_time(p)? {
                    best = best.min(t);
                }
            }
        }
        for (i, j) in TraversalDirective::all_up().pairs(&self.particles, &self.particles) {
            let (a, b) = (self.particles.particle(i)?, self.particles.particle(j)?);
            let potential = match self.bonds.potential_between(i, j) {
                Some(p) => p,
                None => self.potentials.for_pair(a, b)?,
            };
            best = best.min(potential.collision_time(a, b)?);
        }
        Ok(best)
    }

    /// Assertion-mode check: the records' minimum must match an O(P^2)
    /// scan. Only predictions before the rebuild deadline are compared,
    /// since the catalog is rebuilt before any pair beyond it can matter.
    /// Fails with [`Error::StaleNeighbors`] otherwise.
    pub fn verify_against_all_pairs(&self) -> Result<()> {
        let horizon = (self.rebuild_deadline - self.time_now).max(0.0);
        let expected = self.all_pairs_min()?.min(horizon);
        let actual = self.records.min_time(&self.particles).min(horizon);
        if expected.is_infinite() && actual.is_infinite() {
            return Ok(());
        }
        let tolerance = 1e-8 * (1.0 + expected.abs().min(actual.abs()));
        if (expected - actual).abs() > tolerance {
            return Err(Error::StaleNeighbors(format!(
                "records predict the next collision in {actual}, a full scan finds {expected}"
            )));
        }
        Ok(())
    }

    // ---------- incremental membership ----------

    /// Add a particle at the end of the order.
    pub fn insert_particle(&mut self, particle: Particle) -> Result<ParticleId> {
        if self.state == EngineState::Halted {
            return Err(Error::InvalidState("cannot insert into a halted engine".into()));
        }
        let id = self.particles.push(particle);
        if self.state != EngineState::Uninitialized {
            let result = self.register(id);
            self.guard(result)?;
        }
        Ok(id)
    }

    fn register(&mut self, id: ParticleId) -> Result<()> {
        self.validate_setup()?;
        let bonds = &self.bonds;
        let cutoff = self.criterion;
        let accept = |a: &Particle, b: &Particle| cutoff.accept(a, b) && !bonds.is_bonded(a.id(), b.id());
        self.catalog.insert(id, &self.particles, &accept)?;
        let deadline = self.deadline_for(self.particles.particle(id)?);
        self.rebuild_deadline = self.rebuild_deadline.min(deadline);
        self.recompute_up(id)?;
        self.recompute_down(id)
    }

    /// Remove a particle and its bonds; records that named it are recomputed.
    pub fn remove_particle(&mut self, id: ParticleId) -> Result<Particle> {
        if self.state == EngineState::Halted {
            return Err(Error::InvalidState("cannot remove from a halted engine".into()));
        }
        self.particles.particle(id)?;
        let dependents = self.dependents_of(&[id]);
        self.catalog.remove(id);
        self.bonds.remove_particle(id);
        self.records.reset(id)?;
        let particle = self.particles.remove(id)?;
        if self.state != EngineState::Uninitialized {
            let result = dependents.into_iter().try_for_each(|d| self.recompute_up(d));
            self.guard(result)?;
        }
        Ok(particle)
    }

    // ---------- outbound ----------

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time_now
    }

    /// Pair virial accumulated since the previous call.
    pub fn take_virial(&mut self) -> f64 {
        std::mem::take(&mut self.virial_since_query)
    }

    pub fn virial_total(&self) -> f64 {
        self.virial_total
    }

    /// Sum of normal impulse magnitudes delivered to the walls.
    pub fn wall_impulse_total(&self) -> f64 {
        self.wall_impulse_total
    }

    /// Net potential energy exchanged by collisions so far.
    pub fn energy_change_total(&self) -> f64 {
        self.energy_change_total
    }

    pub fn collision_count(&self) -> u64 {
        self.collisions
    }

    pub fn particles(&self) -> &OrderedParticleSequence {
        &self.particles
    }

    pub fn particle(&self, id: ParticleId) -> Result<&Particle> {
        self.particles.particle(id)
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn record(&self, id: ParticleId) -> &CollisionRecord {
        self.records.get(id)
    }

    pub fn catalog(&self) -> &NeighborCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn potentials(&self) -> &PotentialTable {
        &self.potentials
    }

    pub fn bonds(&self) -> &BondList {
        &self.bonds
    }

    pub fn walls(&self) -> Option<&HardWalls> {
        self.walls.as_ref()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    pub fn total_momentum(&self) -> Vector {
        let mut total = [0.0; DIM];
        for p in self.particles.iter() {
            vector::add_scaled(&mut total, 1.0, &p.p);
        }
        total
    }

    /// Potential energy from a full pair scan; infinite for a forbidden
    /// configuration.
    pub fn potential_energy(&self) -> Result<f64> {
        let mut energy = 0.0;
        for (i, j) in TraversalDirective::all_up().pairs(&self.particles, &self.particles) {
            let (a, b) = (self.particles.particle(i)?, self.particles.particle(j)?);
            let potential = match self.bonds.potential_between(i, j) {
                Some(p) => p,
                None => self.potentials.for_pair(a, b)?,
            };
            energy += potential.energy(a, b);
        }
        if let Some(walls) = &self.walls {
            energy += self.particles.iter().map(|p| walls.energy(p)).sum::<f64>();
        }
        Ok(energy)
    }
}
