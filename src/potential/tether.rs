use super::{check_length, Bump, PairKinematics, CONTACT_TOLERANCE, DEFAULT_NUDGE};
use crate::error::{Error, Result};

/// Bond that lets a pair move freely up to `length` apart and reflects it
/// there, optionally with a hard core of diameter `core`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tether {
    core: f64,
    length: f64,
    epsilon: f64,
}

impl Tether {
    pub fn new(length: f64) -> Result<Self> {
        Ok(Self {
            core: 0.0,
            length: check_length("tether length", length)?,
            epsilon: DEFAULT_NUDGE,
        })
    }

    /// Tether with a hard core, like a hard-sphere bond.
    pub fn with_core(core: f64, length: f64) -> Result<Self> {
        let core = check_length("tether core diameter", core)?;
        let length = check_length("tether length", length)?;
        if core >= length {
            return Err(Error::InvalidParam("tether core must be shorter than its length".into()));
        }
        Ok(Self {
            core,
            length,
            epsilon: DEFAULT_NUDGE,
        })
    }

    pub fn core(&self) -> f64 {
        self.core
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub(crate) fn time(&self, k: &PairKinematics) -> Result<f64> {
        let l2 = self.length * self.length;
        if k.r2 > l2 * (1.0 + 4.0 * self.epsilon) {
            return Err(Error::ContractViolation(format!(
                "tethered pair stretched to {} beyond length {}",
                k.r2.sqrt(),
                self.length
            )));
        }
        let core_hit = if self.core > 0.0 {
            k.time_to_close(self.core * self.core)
        } else {
            None
        };
        Ok(core_hit
            .or_else(|| k.time_to_open(l2).map(|t| t.max(0.0)))
            .unwrap_or(f64::INFINITY))
    }

    pub(crate) fn impulse(&self, k: &PairKinematics) -> Bump {
        let l2 = self.length * self.length;
        if self.core > 0.0 && 2.0 * k.r2 < self.core * self.core + l2 {
            Bump::reflect(k, self.epsilon)
        } else {
            Bump::reflect(k, -self.epsilon)
        }
    }

    pub(crate) fn energy(&self, k: &PairKinematics) -> f64 {
        let l2 = self.length * self.length;
        let core2 = self.core * self.core;
        if k.r2 > l2 * (1.0 + CONTACT_TOLERANCE) || k.r2 < core2 * (1.0 - CONTACT_TOLERANCE) {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::potential::test_util::*;
    use crate::potential::{CollisionPotential, Potential};

    #[test]
    fn separating_pair_is_held_at_length() -> Result<()> {
        let p = Potential::Tether(Tether::new(2.0)?);
        let t = p.collision_time(&on_axis(0.0, -0.5), &on_axis(1.0, 0.5))?;
        assert!((t - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn approaching_coreless_pair_passes_through() -> Result<()> {
        // b travels from +1 through a to -2: relative displacement 3 at speed 1
        let p = Potential::Tether(Tether::new(2.0)?);
        let t = p.collision_time(&on_axis(0.0, 0.5), &on_axis(1.0, -0.5))?;
        assert!((t - 3.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn cored_tether_hits_core_first() -> Result<()> {
        let p = Potential::Tether(Tether::with_core(0.5, 2.0)?);
        let t = p.collision_time(&on_axis(0.0, 0.5), &on_axis(1.0, -0.5))?;
        assert!((t - 0.5).abs() < 1e-12);
        let bump = p.bump(&on_axis(0.0, 0.5), &on_axis(0.5, -0.5))?;
        assert!(bump.nudge > 0.0);
        Ok(())
    }

    #[test]
    fn reflection_at_length_points_inward() -> Result<()> {
        let p = Potential::Tether(Tether::new(2.0)?);
        let (a, b) = (on_axis(0.0, -0.5), on_axis(2.0, 0.5));
        let bump = p.bump(&a, &b)?;
        assert!(bump.nudge < 0.0);
        let va = (a.p[0] + bump.momentum_delta[0]) / a.mass();
        let vb = (b.p[0] - bump.momentum_delta[0]) / b.mass();
        assert!((va - 0.5).abs() < 1e-12 && (vb + 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn overstretched_pair_is_rejected() -> Result<()> {
        let p = Potential::Tether(Tether::new(1.0)?);
        assert!(p.collision_time(&on_axis(0.0, 0.0), &on_axis(3.0, 1.0)).is_err());
        assert_eq!(p.energy(&on_axis(0.0, 0.0), &on_axis(3.0, 0.0)), f64::INFINITY);
        Ok(())
    }

    #[test]
    fn core_must_fit_inside_length() {
        assert!(Tether::with_core(2.0, 1.0).is_err());
    }
}
