//! Hard collision potentials.
//!
//! Every pair potential answers two questions about a pair in free flight:
//! when will its separation next cross a boundary of the potential, and what
//! impulse is exchanged when it does. Both are derived from the ballistic
//! quadratic `|r + v t|^2 = d^2` with `r = r_b - r_a` and `v = v_b - v_a`.
//! The sign of `b = r . v` (approaching when negative) selects the root.

pub mod hard_sphere;
pub mod square_well;
pub mod table;
pub mod tether;
pub mod walls;

pub use hard_sphere::HardSphere;
pub use square_well::SquareWell;
pub use table::{BondList, PotentialTable};
pub use tether::Tether;
pub use walls::HardWalls;

use crate::core::particle::Particle;
use crate::core::vector::{self, Vector};
use crate::error::{Error, Result};

/// Relative separation offset applied after a well or bond crossing.
pub const DEFAULT_NUDGE: f64 = 1.0e-10;

/// Relative slack on squared distances before a pair counts as overlapping
/// (or over-stretched) in an energy evaluation. Pairs sit exactly on a
/// boundary after a collision, up to rounding.
pub(crate) const CONTACT_TOLERANCE: f64 = 1.0e-9;

/// Relative kinematics of a pair at the current instant.
#[derive(Debug, Clone, Copy)]
pub struct PairKinematics {
    /// `r_b - r_a`.
    pub dr: Vector,
    /// `v_b - v_a`.
    pub dv: Vector,
    /// `dr . dv`; negative when approaching.
    pub bij: f64,
    pub r2: f64,
    pub v2: f64,
    /// `1 / (1/m_a + 1/m_b)`.
    pub reduced_mass: f64,
}

impl PairKinematics {
    pub fn new(a: &Particle, b: &Particle) -> Result<Self> {
        let dr = vector::sub(&b.r, &a.r);
        let dv = vector::sub(&b.velocity(), &a.velocity());
        let reduced_mass = 1.0 / (a.rm() + b.rm());
        if !reduced_mass.is_finite() || reduced_mass <= 0.0 {
            return Err(Error::ContractViolation(format!(
                "inconsistent mass data for pair ({}, {}): reduced mass {reduced_mass}",
                a.id(),
                b.id()
            )));
        }
        Ok(Self {
            dr,
            dv,
            bij: vector::dot(&dr, &dv),
            r2: vector::norm_sq(&dr),
            v2: vector::norm_sq(&dv),
            reduced_mass,
        })
    }

    #[inline]
    pub fn approaching(&self) -> bool {
        self.bij < 0.0
    }

    /// Relative velocity along the line of centers, `v . r_hat`.
    #[inline]
    pub fn normal_velocity(&self) -> f64 {
        self.bij / self.r2.sqrt()
    }

    /// Time until an approaching pair closes to distance `d`, if it does.
    pub(crate) fn time_to_close(&self, d2: f64) -> Option<f64> {
        if self.bij >= 0.0 || self.v2 <= 0.0 {
            return None;
        }
        let disc = self.bij * self.bij - self.v2 * (self.r2 - d2);
        if disc <= 0.0 {
            return None;
        }
        // (r2 - d2) / (-b + sqrt(disc)) is the smaller root without cancellation
        Some((self.r2 - d2) / (-self.bij + disc.sqrt()))
    }

    /// Time until a pair inside distance `d` reaches it from within.
    pub(crate) fn time_to_open(&self, d2: f64) -> Option<f64> {
        if self.v2 <= 0.0 {
            return None;
        }
        let disc = self.bij * self.bij - self.v2 * (self.r2 - d2);
        if disc < 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        if self.bij > 0.0 {
            Some((d2 - self.r2) / (self.bij + sq))
        } else {
            Some((-self.bij + sq) / self.v2)
        }
    }
}

/// Outcome of an impulsive collision.
///
/// `momentum_delta` is added to the first particle and subtracted from the
/// second. `virial` is the signed normal impulse, `momentum_delta . r_hat`;
/// for a hard reflection it equals `2 mu (v . r_hat)`. `nudge` is the
/// relative change of the separation vector to apply after the impulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bump {
    pub momentum_delta: Vector,
    pub virial: f64,
    pub nudge: f64,
    /// Change in potential energy (kinetic energy changes by the opposite).
    pub energy_change: f64,
}

impl Bump {
    /// Impulse of signed magnitude `virial` along the line of centers.
    pub(crate) fn along(k: &PairKinematics, virial: f64, nudge: f64, energy_change: f64) -> Self {
        let r = k.r2.sqrt();
        Self {
            momentum_delta: vector::scale(&k.dr, virial / r),
            virial,
            nudge,
            energy_change,
        }
    }

    /// Elastic reflection of the normal relative velocity.
    pub(crate) fn reflect(k: &PairKinematics, nudge: f64) -> Self {
        Self::along(k, 2.0 * k.reduced_mass * k.normal_velocity(), nudge, 0.0)
    }
}

/// Per-interaction-type collision contract.
pub trait CollisionPotential {
    /// Time until the pair's separation reaches a boundary of this potential
    /// assuming free flight; `f64::INFINITY` when it never does.
    fn collision_time(&self, a: &Particle, b: &Particle) -> Result<f64>;

    /// Impulse exchanged by a pair sitting on a boundary of this potential.
    fn bump(&self, a: &Particle, b: &Particle) -> Result<Bump>;

    /// Potential energy of the pair: infinite for a forbidden configuration.
    fn energy(&self, a: &Particle, b: &Particle) -> f64;

    /// Largest separation at which the pair can still collide.
    fn range(&self) -> f64;
}

/// The closed set of pair potentials, resolved once at setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Potential {
    /// Ideal pair: never collides.
    Null,
    HardSphere(HardSphere),
    SquareWell(SquareWell),
    Tether(Tether),
}

impl Potential {
    pub fn name(&self) -> &'static str {
        match self {
            Potential::Null => "null",
            Potential::HardSphere(_) => "hard-sphere",
            Potential::SquareWell(_) => "square-well",
            Potential::Tether(_) => "tether",
        }
    }

    /// Hard-core diameter, zero for potentials without a core.
    pub fn core_diameter(&self) -> f64 {
        match self {
            Potential::Null => 0.0,
            Potential::HardSphere(p) => p.diameter(),
            Potential::SquareWell(p) => p.core(),
            Potential::Tether(p) => p.core(),
        }
    }

    pub(crate) fn time(&self, k: &PairKinematics) -> Result<f64> {
        let t = match self {
            Potential::Null => f64::INFINITY,
            Potential::HardSphere(p) => p.time(k),
            Potential::SquareWell(p) => p.time(k),
            Potential::Tether(p) => p.time(k)?,
        };
        if t.is_nan() || t < 0.0 {
            return Err(Error::ContractViolation(format!(
                "{} potential produced collision time {t} (r2 = {}, b = {})",
                self.name(),
                k.r2,
                k.bij
            )));
        }
        Ok(t)
    }

    pub(crate) fn impulse(&self, k: &PairKinematics) -> Result<Bump> {
        if k.r2 <= 0.0 {
            return Err(Error::MathError("degenerate contact normal in pair collision".into()));
        }
        let bump = match self {
            Potential::Null => {
                return Err(Error::ContractViolation(
                    "null potential cannot produce a collision".into(),
                ))
            }
            Potential::HardSphere(_) => Bump::reflect(k, 0.0),
            Potential::SquareWell(p) => p.impulse(k),
            Potential::Tether(p) => p.impulse(k),
        };
        if !vector::is_finite(&bump.momentum_delta) || !bump.virial.is_finite() {
            return Err(Error::ContractViolation(format!(
                "{} potential produced a non-finite impulse",
                self.name()
            )));
        }
        Ok(bump)
    }

    pub(crate) fn energy_of(&self, k: &PairKinematics) -> f64 {
        match self {
            Potential::Null => 0.0,
            Potential::HardSphere(p) => p.energy(k),
            Potential::SquareWell(p) => p.energy(k),
            Potential::Tether(p) => p.energy(k),
        }
    }
}

impl CollisionPotential for Potential {
    fn collision_time(&self, a: &Particle, b: &Particle) -> Result<f64> {
        if matches!(self, Potential::Null) {
            return Ok(f64::INFINITY);
        }
        self.time(&PairKinematics::new(a, b)?)
    }

    fn bump(&self, a: &Particle, b: &Particle) -> Result<Bump> {
        self.impulse(&PairKinematics::new(a, b)?)
    }

    fn energy(&self, a: &Particle, b: &Particle) -> f64 {
        match PairKinematics::new(a, b) {
            Ok(k) => self.energy_of(&k),
            Err(_) => f64::INFINITY,
        }
    }

    fn range(&self) -> f64 {
        match self {
            Potential::Null => 0.0,
            Potential::HardSphere(p) => p.diameter(),
            Potential::SquareWell(p) => p.well_diameter(),
            Potential::Tether(p) => p.length(),
        }
    }
}

impl From<HardSphere> for Potential {
    fn from(p: HardSphere) -> Self {
        Potential::HardSphere(p)
    }
}

impl From<SquareWell> for Potential {
    fn from(p: SquareWell) -> Self {
        Potential::SquareWell(p)
    }
}

impl From<Tether> for Potential {
    fn from(p: Tether) -> Self {
        Potential::Tether(p)
    }
}

fn check_length(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidParam(format!("{name} must be finite and > 0")));
    }
    Ok(value)
}
