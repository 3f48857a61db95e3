//! Which particles a scan visits and in which direction.
//!
//! A directive composes three traversal primitives: an index range over the
//! ordered sequence (all particles), an explicit target set (one or two
//! particles), and a neighbor set supplied by a [`NeighborSource`]. Callers
//! narrow further with ordinary iterator adapters such as `filter`.

use super::particle::ParticleId;
use super::sequence::OrderedParticleSequence;

/// Sweep direction relative to the total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Both,
}

impl Direction {
    #[inline]
    pub fn includes_up(self) -> bool {
        matches!(self, Direction::Up | Direction::Both)
    }

    #[inline]
    pub fn includes_down(self) -> bool {
        matches!(self, Direction::Down | Direction::Both)
    }
}

/// Particles a scan starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    AllParticles,
    Single(ParticleId),
    /// Exactly this pair and nothing else.
    Pair(ParticleId, ParticleId),
}

/// Anything that can list a particle's up and down candidates.
///
/// The ordered sequence itself is a source (every later/earlier particle),
/// which is what an all-pairs scan uses.
pub trait NeighborSource {
    fn up_neighbors(&self, id: ParticleId) -> &[ParticleId];
    fn down_neighbors(&self, id: ParticleId) -> &[ParticleId];
}

impl NeighborSource for OrderedParticleSequence {
    fn up_neighbors(&self, id: ParticleId) -> &[ParticleId] {
        self.uplist(id)
    }

    fn down_neighbors(&self, id: ParticleId) -> &[ParticleId] {
        self.downlist(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalDirective {
    pub direction: Direction,
    pub scope: Scope,
}

impl TraversalDirective {
    pub fn new(direction: Direction, scope: Scope) -> Self {
        Self { direction, scope }
    }

    /// Every pair exactly once.
    pub fn all_up() -> Self {
        Self::new(Direction::Up, Scope::AllParticles)
    }

    pub fn up_from(id: ParticleId) -> Self {
        Self::new(Direction::Up, Scope::Single(id))
    }

    pub fn down_from(id: ParticleId) -> Self {
        Self::new(Direction::Down, Scope::Single(id))
    }

    pub fn pair(a: ParticleId, b: ParticleId) -> Self {
        Self::new(Direction::Both, Scope::Pair(a, b))
    }

    /// Number of explicit targets: 0 means "all particles".
    pub fn count(&self) -> usize {
        match self.scope {
            Scope::AllParticles => 0,
            Scope::Single(_) => 1,
            Scope::Pair(..) => 2,
        }
    }

    /// Particles the scan starts from, in order, skipping removed handles.
    pub fn targets<'a>(
        &self,
        seq: &'a OrderedParticleSequence,
    ) -> impl Iterator<Item = ParticleId> + 'a {
        let (all, explicit): (&[ParticleId], [Option<ParticleId>; 2]) = match self.scope {
            Scope::AllParticles => (seq.ids(), [None, None]),
            Scope::Single(a) => (&[], [Some(a), None]),
            Scope::Pair(a, b) => (&[], [Some(a), Some(b)]),
        };
        all.iter()
            .copied()
            .chain(explicit.into_iter().flatten().filter(move |&id| seq.contains(id)))
    }

    /// `(from, other)` pairs visited by this directive. `from` is the
    /// particle the visit starts at. A `Pair` scope yields that pair once,
    /// earlier particle first, regardless of the neighbor source.
    pub fn pairs<'a, S>(
        &self,
        seq: &'a OrderedParticleSequence,
        source: &'a S,
    ) -> impl Iterator<Item = (ParticleId, ParticleId)> + 'a
    where
        S: NeighborSource + ?Sized + 'a,
    {
        let direction = self.direction;
        let pair = match self.scope {
            Scope::Pair(a, b) if a != b && seq.contains(a) && seq.contains(b) => {
                Some(seq.ordered(a, b))
            }
            _ => None,
        };
        let starts = match self.scope {
            Scope::Pair(..) => None,
            _ => Some(self.targets(seq)),
        };
        starts
            .into_iter()
            .flatten()
            .flat_map(move |id| {
                let up: &[ParticleId] = if direction.includes_up() {
                    source.up_neighbors(id)
                } else {
                    &[]
                };
                let down: &[ParticleId] = if direction.includes_down() {
                    source.down_neighbors(id)
                } else {
                    &[]
                };
                up.iter().chain(down.iter()).map(move |&other| (id, other))
            })
            .chain(pair)
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
    fn all_up_visits_each_pair_once() {
        let s = seq(4);
        let pairs: Vec<_> = TraversalDirective::all_up().pairs(&s, &s).collect();
        assert_eq!(pairs.len(), 6);
        for (a, b) in &pairs {
            assert!(s.is_up(*a, *b));
        }
    }

    #[test]
    fn single_down_starts_from_target() {
        let s = seq(4);
        let ids = s.ids().to_vec();
        let pairs: Vec<_> = TraversalDirective::down_from(ids[2]).pairs(&s, &s).collect();
        assert_eq!(pairs, vec![(ids[2], ids[0]), (ids[2], ids[1])]);
    }

    #[test]
    fn both_directions_cover_everyone_else() {
        let s = seq(5);
        let ids = s.ids().to_vec();
        let d = TraversalDirective::new(Direction::Both, Scope::Single(ids[1]));
        let others: Vec<_> = d.pairs(&s, &s).map(|(_, o)| o).collect();
        assert_eq!(others.len(), 4);
        assert!(!others.contains(&ids[1]));
    }

    #[test]
    fn pair_scope_yields_only_that_pair() {
        let s = seq(3);
        let ids = s.ids().to_vec();
        let d = TraversalDirective::pair(ids[2], ids[0]);
        assert_eq!(d.count(), 2);
        let pairs: Vec<_> = d.pairs(&s, &s).collect();
        assert_eq!(pairs, vec![(ids[0], ids[2])]);
    }

    #[test]
    fn counts_and_filters_compose() {
        let s = seq(6);
        assert_eq!(TraversalDirective::all_up().count(), 0);
        assert_eq!(TraversalDirective::up_from(s.ids()[0]).count(), 1);
        let near: Vec<_> = TraversalDirective::all_up()
            .pairs(&s, &s)
            .filter(|&(a, b)| {
                let (pa, pb) = (s.particle(a).unwrap(), s.particle(b).unwrap());
                (pb.r[0] - pa.r[0]).abs() < 1.5
            })
            .collect();
        assert_eq!(near.len(), 5);
    }
}
