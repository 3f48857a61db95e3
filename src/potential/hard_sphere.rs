use super::{check_length, PairKinematics, CONTACT_TOLERANCE};
use crate::error::Result;

/// Impenetrable spheres of contact distance `diameter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardSphere {
    diameter: f64,
    diameter2: f64,
}

impl HardSphere {
    pub fn new(diameter: f64) -> Result<Self> {
        let diameter = check_length("hard-sphere diameter", diameter)?;
        Ok(Self {
            diameter,
            diameter2: diameter * diameter,
        })
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub(crate) fn time(&self, k: &PairKinematics) -> f64 {
        k.time_to_close(self.diameter2).unwrap_or(f64::INFINITY)
    }

    pub(crate) fn energy(&self, k: &PairKinematics) -> f64 {
        if k.r2 < self.diameter2 * (1.0 - CONTACT_TOLERANCE) {
            f64::INFINITY
        } else {
            0.0
        }
    }
}
