use super::{check_length, Bump, PairKinematics, CONTACT_TOLERANCE, DEFAULT_NUDGE};
use crate::error::{Error, Result};

/// Hard core of diameter `core` surrounded by an attractive well of depth
/// `depth` reaching out to `lambda * core`.
///
/// Whether a pair is inside the well is read from its separation. Every
/// crossing nudges the pair off the boundary by a relative `epsilon` so the
/// next prediction lands unambiguously on one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareWell {
    core: f64,
    core2: f64,
    well2: f64,
    lambda: f64,
    depth: f64,
    epsilon: f64,
}

impl SquareWell {
    pub fn new(core: f64, lambda: f64, depth: f64) -> Result<Self> {
        let core = check_length("square-well core diameter", core)?;
        if !lambda.is_finite() || lambda <= 1.0 {
            return Err(Error::InvalidParam("square-well lambda must be finite and > 1".into()));
        }
        if !depth.is_finite() || depth < 0.0 {
            return Err(Error::InvalidParam("square-well depth must be finite and >= 0".into()));
        }
        let well = core * lambda;
        Ok(Self {
            core,
            core2: core * core,
            well2: well * well,
            lambda,
            depth,
            epsilon: DEFAULT_NUDGE,
        })
    }

    /// Override the boundary nudge.
    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 || epsilon >= 1.0e-3 {
            return Err(Error::InvalidParam("nudge epsilon must lie in [0, 1e-3)".into()));
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    pub fn core(&self) -> f64 {
        self.core
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn well_diameter(&self) -> f64 {
        self.core * self.lambda
    }

    pub(crate) fn time(&self, k: &PairKinematics) -> f64 {
        if k.r2 < self.well2 {
            // inside: hit the core if approaching, otherwise leave the well
            k.time_to_close(self.core2)
                .or_else(|| k.time_to_open(self.well2))
                .unwrap_or(f64::INFINITY)
        } else {
            k.time_to_close(self.well2).unwrap_or(f64::INFINITY)
        }
    }

    pub(crate) fn impulse(&self, k: &PairKinematics) -> Bump {
        let mu = k.reduced_mass;
        let vn = k.normal_velocity();
        if 2.0 * k.r2 < self.core2 + self.well2 {
            // core
            return Bump::reflect(k, self.epsilon);
        }
        if k.bij > 0.0 {
            // separating at the well edge
            let ke = 0.5 * mu * vn * vn;
            if ke < self.depth {
                Bump::reflect(k, -self.epsilon)
            } else {
                let vn_out = (vn * vn - 2.0 * self.depth / mu).sqrt();
                Bump::along(k, mu * (vn - vn_out), self.epsilon, self.depth)
            }
        } else {
            // captured
            let vn_in = (vn * vn + 2.0 * self.depth / mu).sqrt();
            Bump::along(k, mu * (vn + vn_in), -self.epsilon, -self.depth)
        }
    }

    pub(crate) fn energy(&self, k: &PairKinematics) -> f64 {
        if k.r2 < self.core2 * (1.0 - CONTACT_TOLERANCE) {
            f64::INFINITY
        } else if k.r2 < self.well2 {
            -self.depth
        } else {
            0.0
        }
    }
}
