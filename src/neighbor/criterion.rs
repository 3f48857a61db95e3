use crate::core::particle::Particle;
use crate::core::vector;
use crate::error::{Error, Result};

/// Pure predicate deciding whether a pair belongs in the catalog.
pub trait Criterion {
    fn accept(&self, a: &Particle, b: &Particle) -> bool;
}

/// Accepts pairs whose centers are closer than `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffCriterion {
    radius: f64,
    radius2: f64,
}

impl CutoffCriterion {
    pub fn new(radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidParam("neighbor radius must be finite and >= 0".into()));
        }
        Ok(Self {
            radius,
            radius2: radius * radius,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Criterion for CutoffCriterion {
    #[inline]
    fn accept(&self, a: &Particle, b: &Particle) -> bool {
        vector::norm_sq(&vector::sub(&b.r, &a.r)) < self.radius2
    }
}

/// Every pair is a neighbor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllPairs;

impl Criterion for AllPairs {
    fn accept(&self, _: &Particle, _: &Particle) -> bool {
        true
    }
}

impl<F> Criterion for F
where
    F: Fn(&Particle, &Particle) -> bool,
{
    fn accept(&self, a: &Particle, b: &Particle) -> bool {
        self(a, b)
    }
}
