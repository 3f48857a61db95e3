use super::criterion::Criterion;
use crate::core::directive::{Direction, NeighborSource, Scope, TraversalDirective};
use crate::core::particle::{Particle, ParticleId};
use crate::core::sequence::OrderedParticleSequence;
use crate::core::vector::{self, Vector};
use crate::error::{Error, Result};

/// Per-particle up/down neighbor lists, indexed by handle.
#[derive(Debug, Clone)]
pub struct NeighborCatalog {
    up: Vec<Vec<ParticleId>>,
    down: Vec<Vec<ParticleId>>,
    /// Position of each particle when it was last cataloged.
    anchors: Vec<Option<Vector>>,
    safety_margin: f64,
    rebuilds: u64,
}

impl NeighborCatalog {
    /// Empty catalog whose lists stay valid for displacements below
    /// `safety_margin / 2`.
    pub fn new(safety_margin: f64) -> Result<Self> {
        if !safety_margin.is_finite() || safety_margin <= 0.0 {
            return Err(Error::InvalidParam("neighbor safety margin must be finite and > 0".into()));
        }
        Ok(Self {
            up: Vec::new(),
            down: Vec::new(),
            anchors: Vec::new(),
            safety_margin,
            rebuilds: 0,
        })
    }

    pub fn safety_margin(&self) -> f64 {
        self.safety_margin
    }

    /// Number of full rebuilds so far.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    fn reset(&mut self, capacity: usize) {
        for list in self.up.iter_mut().chain(self.down.iter_mut()) {
            list.clear();
        }
        self.up.resize_with(capacity, Vec::new);
        self.down.resize_with(capacity, Vec::new);
        self.anchors.clear();
        self.anchors.resize(capacity, None);
    }

    fn ensure_capacity(&mut self, capacity: usize) {
        if self.up.len() < capacity {
            self.up.resize_with(capacity, Vec::new);
            self.down.resize_with(capacity, Vec::new);
            self.anchors.resize(capacity, None);
        }
    }

    /// Rebuild every list from scratch with one walk over all ordered pairs.
    /// Returns the number of accepted pairs.
    pub fn rebuild<C>(&mut self, seq: &OrderedParticleSequence, criterion: &C) -> usize
    where
        C: Criterion + ?Sized,
    {
        self.reset(seq.capacity());
        let mut pairs = 0;
        for (i, j) in TraversalDirective::all_up().pairs(seq, seq) {
            let (Some(a), Some(b)) = (seq.get(i), seq.get(j)) else {
                continue;
            };
            if criterion.accept(a, b) {
                self.up[i.index()].push(j);
                self.down[j.index()].push(i);
                pairs += 1;
            }
        }
        for p in seq.iter() {
            self.anchors[p.id().index()] = Some(p.r);
        }
        self.rebuilds += 1;
        pairs
    }

    /// Catalog a particle that just joined `seq`.
    pub fn insert<C>(&mut self, id: ParticleId, seq: &OrderedParticleSequence, criterion: &C) -> Result<()>
    where
        C: Criterion + ?Sized,
    {
        let particle = seq.particle(id)?;
        self.ensure_capacity(seq.capacity());
        self.remove(id);
        let directive = TraversalDirective::new(Direction::Both, Scope::Single(id));
        for (_, other) in directive.pairs(seq, seq) {
            let Some(q) = seq.get(other) else {
                continue;
            };
            if seq.is_up(id, other) {
                if criterion.accept(particle, q) {
                    self.up[id.index()].push(other);
                    self.down[other.index()].push(id);
                }
            } else if criterion.accept(q, particle) {
                self.down[id.index()].push(other);
                self.up[other.index()].push(id);
            }
        }
        self.anchors[id.index()] = Some(particle.r);
        Ok(())
    }

    /// Forget a particle; its neighbors drop it from their lists.
    pub fn remove(&mut self, id: ParticleId) {
        let i = id.index();
        if i >= self.up.len() {
            return;
        }
        for other in std::mem::take(&mut self.up[i]) {
            self.down[other.index()].retain(|&x| x != id);
        }
        for other in std::mem::take(&mut self.down[i]) {
            self.up[other.index()].retain(|&x| x != id);
        }
        self.anchors[i] = None;
    }

    pub fn neighbors_of(&self, id: ParticleId, direction: Direction) -> impl Iterator<Item = ParticleId> + '_ {
        let up: &[ParticleId] = if direction.includes_up() {
            self.up_neighbors(id)
        } else {
            &[]
        };
        let down: &[ParticleId] = if direction.includes_down() {
            self.down_neighbors(id)
        } else {
            &[]
        };
        up.iter().chain(down).copied()
    }

    /// Number of cataloged pairs.
    pub fn pair_count(&self) -> usize {
        self.up.iter().map(Vec::len).sum()
    }

    /// Distance `p` has moved since it was cataloged; infinite if it never was.
    pub fn displacement(&self, p: &Particle) -> f64 {
        match self.anchors.get(p.id().index()).copied().flatten() {
            Some(anchor) => vector::norm_sq(&vector::sub(&p.r, &anchor)).sqrt(),
            None => f64::INFINITY,
        }
    }

    /// Largest [`displacement`](Self::displacement) over the sequence.
    pub fn max_displacement(&self, seq: &OrderedParticleSequence) -> f64 {
        seq.iter().map(|p| self.displacement(p)).fold(0.0, f64::max)
    }

    /// Whether the lists are still guaranteed complete.
    pub fn is_fresh(&self, seq: &OrderedParticleSequence) -> bool {
        self.max_displacement(seq) < 0.5 * self.safety_margin
    }
}

impl NeighborSource for NeighborCatalog {
    fn up_neighbors(&self, id: ParticleId) -> &[ParticleId] {
        self.up.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    fn down_neighbors(&self, id: ParticleId) -> &[ParticleId] {
        self.down.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::DIM;
    use crate::neighbor::CutoffCriterion;

    fn line(xs: &[f64]) -> OrderedParticleSequence {
        OrderedParticleSequence::from_particles(
            xs.iter()
                .map(|&x| Particle::new(0, [x, 0.0, 0.0], [0.0; DIM], 1.0).unwrap()),
        )
    }

    #[test]
    fn rebuild_splits_up_and_down() -> Result<()> {
        let seq = line(&[0.0, 1.0, 5.0, 1.5]);
        let ids = seq.ids().to_vec();
        let mut catalog = NeighborCatalog::new(0.5)?;
        let pairs = catalog.rebuild(&seq, &CutoffCriterion::new(2.0)?);
        // (0,1), (0,3), (1,3)
        assert_eq!(pairs, 3);
        assert_eq!(catalog.up_neighbors(ids[0]), &[ids[1], ids[3]]);
        assert_eq!(catalog.down_neighbors(ids[3]), &[ids[0], ids[1]]);
        assert!(catalog.up_neighbors(ids[2]).is_empty());
        let both: Vec<_> = catalog.neighbors_of(ids[1], Direction::Both).collect();
        assert_eq!(both, vec![ids[3], ids[0]]);
        assert_eq!(catalog.rebuilds(), 1);
        Ok(())
    }

    #[test]
    fn insert_and_remove_are_incremental() -> Result<()> {
        let mut seq = line(&[0.0, 1.0]);
        let criterion = CutoffCriterion::new(2.0)?;
        let mut catalog = NeighborCatalog::new(0.5)?;
        catalog.rebuild(&seq, &criterion);

        let id = seq.push(Particle::new(0, [0.5, 0.0, 0.0], [0.0; DIM], 1.0)?);
        catalog.insert(id, &seq, &criterion)?;
        assert_eq!(catalog.down_neighbors(id).len(), 2);
        assert_eq!(catalog.pair_count(), 3);

        let first = seq.ids()[0];
        catalog.remove(first);
        seq.remove(first)?;
        assert_eq!(catalog.pair_count(), 1);
        assert!(catalog.up_neighbors(first).is_empty());
        Ok(())
    }

    #[test]
    fn freshness_tracks_displacement() -> Result<()> {
        let mut seq = line(&[0.0, 3.0]);
        let mut catalog = NeighborCatalog::new(0.5)?;
        assert!(!catalog.is_fresh(&seq));
        catalog.rebuild(&seq, &CutoffCriterion::new(1.0)?);
        assert!(catalog.is_fresh(&seq));
        let id = seq.ids()[1];
        seq.particle_mut(id)?.r[1] = 0.3;
        assert!((catalog.max_displacement(&seq) - 0.3).abs() < 1e-12);
        assert!(!catalog.is_fresh(&seq));
        Ok(())
    }
}
