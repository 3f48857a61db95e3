//! Per-particle collision records and the queue over them.
//!
//! Each particle owns exactly one record: the time until its earliest
//! predicted collision with an up-neighbor (or a wall) and who that
//! collider is. Record times are relative to the current instant. A binary
//! heap keyed by absolute time finds the global minimum; entries carry the
//! record version they were made from and are discarded when outdated.

use super::event::QueueEntry;
use super::particle::ParticleId;
use super::sequence::OrderedParticleSequence;
use crate::error::Result;
use crate::potential::Potential;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// What a particle is predicted to hit next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Pair {
        partner: ParticleId,
        potential: Potential,
    },
    Wall {
        wall_id: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRecord {
    /// Time from now until the collision; `+inf` when none is predicted.
    pub time: f64,
    pub collider: Option<Collider>,
}

impl CollisionRecord {
    pub const NONE: Self = Self {
        time: f64::INFINITY,
        collider: None,
    };

    pub fn pair(time: f64, partner: ParticleId, potential: Potential) -> Self {
        Self {
            time,
            collider: Some(Collider::Pair { partner, potential }),
        }
    }

    pub fn wall(time: f64, wall_id: u32) -> Self {
        Self {
            time,
            collider: Some(Collider::Wall { wall_id }),
        }
    }

    pub fn partner(&self) -> Option<ParticleId> {
        match self.collider {
            Some(Collider::Pair { partner, .. }) => Some(partner),
            _ => None,
        }
    }
}

impl Default for CollisionRecord {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticleCollisionState {
    records: Vec<CollisionRecord>,
    versions: Vec<u64>,
    heap: BinaryHeap<Reverse<QueueEntry>>,
    /// Time elapsed since the records were created; converts relative
    /// record times into absolute heap keys.
    clock: f64,
}

impl ParticleCollisionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_capacity(&mut self, capacity: usize) {
        if self.records.len() < capacity {
            self.records.resize(capacity, CollisionRecord::NONE);
            self.versions.resize(capacity, 0);
        }
    }

    pub fn get(&self, id: ParticleId) -> &CollisionRecord {
        self.records.get(id.index()).unwrap_or(&CollisionRecord::NONE)
    }

    /// Replace a particle's record and queue it if it predicts anything.
    pub fn set(&mut self, id: ParticleId, record: CollisionRecord) -> Result<()> {
        self.ensure_capacity(id.index() + 1);
        let i = id.index();
        self.versions[i] += 1;
        self.records[i] = record;
        if record.collider.is_some() && record.time.is_finite() {
            let entry = QueueEntry::new(self.clock + record.time, id, self.versions[i])?;
            self.heap.push(Reverse(entry));
        }
        Ok(())
    }

    pub fn reset(&mut self, id: ParticleId) -> Result<()> {
        self.set(id, CollisionRecord::NONE)
    }

    /// Forget every record and queued entry.
    pub fn clear(&mut self) {
        for (record, version) in self.records.iter_mut().zip(self.versions.iter_mut()) {
            *record = CollisionRecord::NONE;
            *version += 1;
        }
        self.heap.clear();
    }

    /// Pass `dt` of free flight: every record comes `dt` closer.
    pub fn advance(&mut self, dt: f64) {
        for record in &mut self.records {
            record.time -= dt;
        }
        self.clock += dt;
    }

    /// Particle holding the earliest valid record, discarding outdated
    /// entries on the way. Ties go to the lowest handle.
    pub fn peek_min(&mut self, seq: &OrderedParticleSequence) -> Option<(ParticleId, CollisionRecord)> {
        while let Some(Reverse(entry)) = self.heap.peek() {
            let i = entry.owner.index();
            let live = seq.contains(entry.owner) && self.versions.get(i) == Some(&entry.version);
            if live {
                return Some((entry.owner, self.records[i]));
            }
            self.heap.pop();
        }
        None
    }

    /// Smallest record time by a linear scan, ignoring the heap.
    pub fn min_time(&self, seq: &OrderedParticleSequence) -> f64 {
        seq.ids()
            .iter()
            .map(|id| self.get(*id).time)
            .fold(f64::INFINITY, f64::min)
    }

    /// Queue entries, stale ones included.
    pub fn queued(&self) -> usize {
        self.heap.len()
    }

    /// Drop outdated heap entries once they outnumber live records.
    pub fn compact(&mut self, seq: &OrderedParticleSequence) -> Result<()> {
        if self.heap.len() <= 4 * seq.len() + 64 {
            return Ok(());
        }
        self.heap.clear();
        for &id in seq.ids() {
            let i = id.index();
            let Some(record) = self.records.get(i).copied() else {
                continue;
            };
            if record.collider.is_some() && record.time.is_finite() {
                let entry = QueueEntry::new(self.clock + record.time, id, self.versions[i])?;
                self.heap.push(Reverse(entry));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::{Particle, DIM};

    fn seq(n: usize) -> OrderedParticleSequence {
        OrderedParticleSequence::from_particles(
            (0..n).map(|i| Particle::new(0, [i as f64, 0.0, 0.0], [0.0; DIM], 1.0).unwrap()),
        )
    }

    #[test]
    fn latest_record_wins() -> Result<()> {
        let s = seq(3);
        let ids = s.ids().to_vec();
        let mut state = ParticleCollisionState::new();
        state.set(ids[0], CollisionRecord::pair(1.0, ids[1], Potential::Null))?;
        state.set(ids[1], CollisionRecord::wall(2.0, 3))?;
        assert_eq!(state.peek_min(&s).map(|(id, _)| id), Some(ids[0]));

        // superseding makes the old entry stale
        state.set(ids[0], CollisionRecord::pair(5.0, ids[2], Potential::Null))?;
        let (id, record) = state.peek_min(&s).unwrap();
        assert_eq!(id, ids[1]);
        assert_eq!(record.collider, Some(Collider::Wall { wall_id: 3 }));
        Ok(())
    }

    #[test]
    fn infinite_records_are_never_queued() -> Result<()> {
        let s = seq(2);
        let mut state = ParticleCollisionState::new();
        for &id in s.ids() {
            state.reset(id)?;
        }
        assert_eq!(state.queued(), 0);
        assert!(state.peek_min(&s).is_none());
        assert_eq!(state.min_time(&s), f64::INFINITY);
        Ok(())
    }

    #[test]
    fn advance_shifts_relative_times_only() -> Result<()> {
        let s = seq(2);
        let ids = s.ids().to_vec();
        let mut state = ParticleCollisionState::new();
        state.set(ids[0], CollisionRecord::pair(3.0, ids[1], Potential::Null))?;
        state.advance(1.0);
        assert_eq!(state.get(ids[0]).time, 2.0);
        // a record made after the advance lands at the right absolute time
        state.set(ids[1], CollisionRecord::wall(1.5, 0))?;
        let (id, _) = state.peek_min(&s).unwrap();
        assert_eq!(id, ids[1]);
        assert_eq!(state.min_time(&s), 1.5);
        Ok(())
    }

    #[test]
    fn ties_resolve_to_lowest_handle() -> Result<()> {
        let s = seq(3);
        let ids = s.ids().to_vec();
        let mut state = ParticleCollisionState::new();
        state.set(ids[2], CollisionRecord::wall(1.0, 0))?;
        state.set(ids[1], CollisionRecord::wall(1.0, 0))?;
        assert_eq!(state.peek_min(&s).map(|(id, _)| id), Some(ids[1]));
        Ok(())
    }

    #[test]
    fn compact_keeps_live_entries() -> Result<()> {
        let s = seq(1);
        let id = s.ids()[0];
        let mut state = ParticleCollisionState::new();
        for k in 0..200 {
            state.set(id, CollisionRecord::wall(1.0 + k as f64, 0))?;
        }
        state.compact(&s)?;
        assert_eq!(state.queued(), 1);
        assert_eq!(state.peek_min(&s).unwrap().1.time, 200.0);
        Ok(())
    }
}
