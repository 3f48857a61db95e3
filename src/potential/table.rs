//! Lookup of the potential governing a pair.

use super::{CollisionPotential, Potential};
use crate::core::particle::{Particle, ParticleId};
use crate::error::{Error, Result};

/// Symmetric map from unordered particle-type pairs to potentials.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialTable {
    n_types: usize,
    entries: Vec<Option<Potential>>,
}

impl PotentialTable {
    /// Table for `n_types` particle types with nothing registered.
    pub fn new(n_types: usize) -> Self {
        Self {
            n_types,
            entries: vec![None; n_types * n_types],
        }
    }

    /// Every type pair ideal: no collisions at all.
    pub fn ideal(n_types: usize) -> Self {
        Self {
            n_types,
            entries: vec![Some(Potential::Null); n_types * n_types],
        }
    }

    /// Single-type table holding one potential.
    pub fn uniform(potential: impl Into<Potential>) -> Self {
        Self {
            n_types: 1,
            entries: vec![Some(potential.into())],
        }
    }

    pub fn n_types(&self) -> usize {
        self.n_types
    }

    /// Register `potential` for both `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: usize, j: usize, potential: impl Into<Potential>) -> Result<()> {
        if i >= self.n_types || j >= self.n_types {
            return Err(Error::InvalidParam(format!(
                "type pair ({i}, {j}) outside table of {} types",
                self.n_types
            )));
        }
        let potential = potential.into();
        self.entries[i * self.n_types + j] = Some(potential);
        self.entries[j * self.n_types + i] = Some(potential);
        Ok(())
    }

    pub fn get(&self, i: usize, j: usize) -> Result<Potential> {
        if i >= self.n_types || j >= self.n_types {
            return Err(Error::MissingPotential(i, j));
        }
        self.entries[i * self.n_types + j].ok_or(Error::MissingPotential(i, j))
    }

    #[inline]
    pub fn for_pair(&self, a: &Particle, b: &Particle) -> Result<Potential> {
        self.get(a.kind, b.kind)
    }

    /// Largest interaction range over registered potentials.
    pub fn max_range(&self) -> f64 {
        self.entries
            .iter()
            .flatten()
            .map(CollisionPotential::range)
            .fold(0.0, f64::max)
    }
}

/// Explicitly bonded pairs, each with its own potential.
///
/// Bonded pairs never appear in the neighbor catalog; the scheduler visits
/// them through [`BondList::partners`] instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondList {
    partners: Vec<Vec<(ParticleId, Potential)>>,
}

impl BondList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bond(&mut self, a: ParticleId, b: ParticleId, potential: impl Into<Potential>) -> Result<()> {
        if a == b {
            return Err(Error::InvalidParam(format!("particle {a} cannot be bonded to itself")));
        }
        if self.is_bonded(a, b) {
            return Err(Error::InvalidParam(format!("particles {a} and {b} are already bonded")));
        }
        let potential = potential.into();
        let needed = a.index().max(b.index()) + 1;
        if self.partners.len() < needed {
            self.partners.resize_with(needed, Vec::new);
        }
        self.partners[a.index()].push((b, potential));
        self.partners[b.index()].push((a, potential));
        Ok(())
    }

    pub fn partners(&self, id: ParticleId) -> &[(ParticleId, Potential)] {
        self.partners.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn potential_between(&self, a: ParticleId, b: ParticleId) -> Option<Potential> {
        self.partners(a)
            .iter()
            .find(|(other, _)| *other == b)
            .map(|&(_, p)| p)
    }

    pub fn is_bonded(&self, a: ParticleId, b: ParticleId) -> bool {
        self.potential_between(a, b).is_some()
    }

    /// Drop every bond of `id`.
    pub fn remove_particle(&mut self, id: ParticleId) {
        let Some(own) = self.partners.get_mut(id.index()) else {
            return;
        };
        let own = std::mem::take(own);
        for (other, _) in own {
            if let Some(list) = self.partners.get_mut(other.index()) {
                list.retain(|(p, _)| *p != id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.partners.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
