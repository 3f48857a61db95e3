use super::particle::ParticleId;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

/// Heap entry pointing at a particle's collision record.
///
/// - `time`: absolute predicted collision time (finite, non-NaN).
/// - `owner`: particle whose record produced the entry.
/// - `version`: record version snapshot for lazy invalidation.
///
/// Entries order by time, then by owner handle, so ties resolve to the
/// lowest particle id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub time: NotNan<f64>,
    pub owner: ParticleId,
    pub version: u64,
}

impl QueueEntry {
    pub fn new(time: f64, owner: ParticleId, version: u64) -> Result<Self> {
        if !time.is_finite() {
            return Err(Error::ContractViolation(format!(
                "queued collision time for {owner} must be finite, got {time}"
            )));
        }
        let time = NotNan::new(time)
            .map_err(|_| Error::ContractViolation("queued collision time cannot be NaN".into()))?;
        Ok(Self {
            time,
            owner,
            version,
        })
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.owner.cmp(&other.owner))
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A processed collision, as reported to listeners and callers.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    /// Simulation time of the collision.
    pub time: f64,
    /// Record owner: the earlier particle of a pair, or the wall-bound particle.
    pub a: ParticleId,
    pub b: Option<ParticleId>,
    pub wall_id: Option<u32>,
    /// Name of the potential that produced the event.
    pub potential: &'static str,
    /// Signed normal impulse exchanged.
    pub virial: f64,
    /// Pre-collision relative velocity along the line of centers (wall
    /// events: the particle's velocity along the wall normal axis).
    pub normal_velocity: f64,
    pub reduced_mass: f64,
    /// Change in potential energy.
    pub energy_change: f64,
}

impl CollisionEvent {
    pub fn is_wall(&self) -> bool {
        self.wall_id.is_some()
    }
}

/// Observer notified after every processed collision.
pub trait CollisionListener: Send + Sync {
    fn on_collision(&mut self, event: &CollisionEvent);
}

impl<F> CollisionListener for F
where
    F: FnMut(&CollisionEvent) + Send + Sync,
{
    fn on_collision(&mut self, event: &CollisionEvent) {
        self(event)
    }
}

/// Shared, clonable recorder of collision events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<CollisionEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<CollisionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CollisionListener for EventLog {
    fn on_collision(&mut self, event: &CollisionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
