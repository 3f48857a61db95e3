//! Arena of particles with a fixed total order.
//!
//! The order defines "up" and "down": a particle is uplist of another when
//! it comes later in the sequence. Every unordered pair is evaluated exactly
//! once by only ever looking up from the earlier particle.

use super::particle::{Particle, ParticleId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct OrderedParticleSequence {
    slots: Vec<Option<Particle>>,
    order: Vec<ParticleId>,
}

impl OrderedParticleSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence whose order is the iteration order of `particles`.
    pub fn from_particles<I: IntoIterator<Item = Particle>>(particles: I) -> Self {
        let mut seq = Self::new();
        for p in particles {
            seq.push(p);
        }
        seq
    }

    /// Append a particle at the end of the order and return its handle.
    pub fn push(&mut self, mut particle: Particle) -> ParticleId {
        let id = ParticleId(self.slots.len());
        particle.id = id;
        particle.ordinal = self.order.len();
        self.slots.push(Some(particle));
        self.order.push(id);
        id
    }

    /// Remove a particle. Later particles shift down by one ordinal; the
    /// relative order of the survivors is unchanged.
    pub fn remove(&mut self, id: ParticleId) -> Result<Particle> {
        let particle = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| Error::InvalidParam(format!("unknown particle {id}")))?;
        let at = particle.ordinal;
        self.order.remove(at);
        for (ordinal, &other) in self.order.iter().enumerate().skip(at) {
            if let Some(p) = self.slots[other.index()].as_mut() {
                p.ordinal = ordinal;
            }
        }
        Ok(particle)
    }

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// One past the largest handle ever issued; sizes per-handle tables.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Like [`get`](Self::get) but an unknown handle is an error.
    pub fn particle(&self, id: ParticleId) -> Result<&Particle> {
        self.get(id)
            .ok_or_else(|| Error::InvalidParam(format!("unknown particle {id}")))
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Result<&mut Particle> {
        self.get_mut(id)
            .ok_or_else(|| Error::InvalidParam(format!("unknown particle {id}")))
    }

    /// Handles in total order.
    pub fn ids(&self) -> &[ParticleId] {
        &self.order
    }

    /// Particles in total order.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.slots[id.index()].as_ref())
    }

    /// Particles in storage order (cheaper; order is irrelevant for drift).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> + '_ {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Handles strictly after `id` in the order.
    pub fn uplist(&self, id: ParticleId) -> &[ParticleId] {
        match self.get(id) {
            Some(p) => &self.order[p.ordinal + 1..],
            None => &[],
        }
    }

    /// Handles strictly before `id` in the order.
    pub fn downlist(&self, id: ParticleId) -> &[ParticleId] {
        match self.get(id) {
            Some(p) => &self.order[..p.ordinal],
            None => &[],
        }
    }

    /// Whether `other` is uplist of `from`.
    pub fn is_up(&self, from: ParticleId, other: ParticleId) -> bool {
        match (self.get(from), self.get(other)) {
            (Some(a), Some(b)) => b.ordinal > a.ordinal,
            _ => false,
        }
    }

    /// Order a pair so the first element is the earlier particle.
    pub fn ordered(&self, a: ParticleId, b: ParticleId) -> (ParticleId, ParticleId) {
        if self.is_up(a, b) {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Mutable access to two distinct particles at once.
    pub fn pair_mut(
        &mut self,
        a: ParticleId,
        b: ParticleId,
    ) -> Result<(&mut Particle, &mut Particle)> {
        let (i, j) = (a.index(), b.index());
        if i == j {
            return Err(Error::ContractViolation(format!(
                "particle {a} cannot collide with itself"
            )));
        }
        if j >= self.slots.len() || i >= self.slots.len() {
            return Err(Error::InvalidParam(format!("unknown particle pair ({a}, {b})")));
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let (head, tail) = self.slots.split_at_mut(hi);
        let (first, second) = (head[lo].as_mut(), tail[0].as_mut());
        match (first, second) {
            (Some(x), Some(y)) if i < j => Ok((x, y)),
            (Some(x), Some(y)) => Ok((y, x)),
            _ => Err(Error::InvalidParam(format!("unknown particle pair ({a}, {b})"))),
        }
    }
}
