use super::vector::{self, Vector};
use crate::error::{Error, Result};
use std::fmt;

/// Fixed spatial dimension (3D). Disks and rods are modeled by leaving
/// the unused components at zero.
pub const DIM: usize = 3;

/// Stable handle of a particle inside an [`OrderedParticleSequence`].
///
/// Handles are never reused within one run, so a removed particle's handle
/// stays dangling rather than silently pointing at a newcomer.
///
/// [`OrderedParticleSequence`]: super::OrderedParticleSequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleId(pub usize);

impl ParticleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A rigid particle moving in free flight between collisions.
///
/// Fields:
/// - `kind`: type index used to look up pair potentials
/// - `r`: position
/// - `p`: momentum
/// - `mass` and its cached reciprocal
/// - `collision_count`: incremented each time the particle takes part in an event
#[derive(Debug, Clone)]
pub struct Particle {
    pub(crate) id: ParticleId,
    pub(crate) ordinal: usize,
    /// Type index into the potential table.
    pub kind: usize,
    /// Position.
    pub r: Vector,
    /// Momentum.
    pub p: Vector,
    mass: f64,
    rm: f64,
    /// Collision participation counter.
    pub collision_count: u64,
}

impl Particle {
    /// Create a new particle after validating invariants. The handle and
    /// ordinal are assigned when the particle joins a sequence.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `mass` is non-positive or any component is NaN/inf.
    pub fn new(kind: usize, r: Vector, p: Vector, mass: f64) -> Result<Self> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !vector::is_finite(&r) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !vector::is_finite(&p) {
            return Err(Error::InvalidParam("momentum must be finite".into()));
        }
        Ok(Self {
            id: ParticleId(usize::MAX),
            ordinal: usize::MAX,
            kind,
            r,
            p,
            mass,
            rm: 1.0 / mass,
            collision_count: 0,
        })
    }

    /// Convenience constructor taking a velocity instead of a momentum.
    pub fn with_velocity(kind: usize, r: Vector, v: Vector, mass: f64) -> Result<Self> {
        Self::new(kind, r, vector::scale(&v, mass), mass)
    }

    #[inline]
    pub fn id(&self) -> ParticleId {
        self.id
    }

    /// Position of this particle in the total order.
    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Cached `1 / mass`.
    #[inline]
    pub fn rm(&self) -> f64 {
        self.rm
    }

    /// Velocity derived from momentum: `p / m`.
    #[inline]
    pub fn velocity(&self) -> Vector {
        vector::scale(&self.p, self.rm)
    }

    /// Free flight for `dt`: `r += p * rm * dt`.
    #[inline]
    pub fn drift(&mut self, dt: f64) {
        let s = self.rm * dt;
        let p = self.p;
        vector::add_scaled(&mut self.r, s, &p);
    }

    /// Kinetic energy: |p|^2 / 2m.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * vector::norm_sq(&self.p) * self.rm
    }

    /// Increment the collision counter.
    #[inline]
    pub fn bump_collision_count(&mut self) {
        self.collision_count = self.collision_count.saturating_add(1);
    }

    /// Set momentum (validated as finite).
    pub fn set_momentum(&mut self, p: Vector) -> Result<()> {
        if !vector::is_finite(&p) {
            return Err(Error::InvalidParam("momentum must be finite".into()));
        }
        self.p = p;
        Ok(())
    }
}
