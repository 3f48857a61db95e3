use super::table::PotentialTable;
use crate::core::particle::{Particle, DIM};
use crate::error::{Error, Result};

/// Slack before a particle past its contact plane counts as escaped.
const WALL_TOLERANCE: f64 = 1e-9;

/// Static axis-aligned box with hard walls.
///
/// Walls are the six planes of the box: for axis `k`, wall `2k` is the min
/// wall at `x_k = 0` and wall `2k + 1` the max wall at `x_k = L_k`. A
/// particle touches a wall when its center is one contact radius away,
/// where the radius is looked up by particle type.
#[derive(Debug, Clone, PartialEq)]
pub struct HardWalls {
    box_size: [f64; DIM],
    radii: Vec<f64>,
}

impl HardWalls {
    pub fn new(box_size: [f64; DIM]) -> Result<Self> {
        if !box_size.iter().all(|&l| l.is_finite() && l > 0.0) {
            return Err(Error::InvalidParam(
                "box_size components must be finite and > 0".into(),
            ));
        }
        Ok(Self {
            box_size,
            radii: Vec::new(),
        })
    }

    /// Walls whose contact radius for type `k` is half the core diameter of
    /// the `(k, k)` potential.
    pub fn from_table(box_size: [f64; DIM], table: &PotentialTable) -> Result<Self> {
        let mut walls = Self::new(box_size)?;
        for kind in 0..table.n_types() {
            let radius = table
                .get(kind, kind)
                .map(|p| 0.5 * p.core_diameter())
                .unwrap_or(0.0);
            walls = walls.with_radius(kind, radius)?;
        }
        Ok(walls)
    }

    /// Set the contact radius of particle type `kind`.
    pub fn with_radius(mut self, kind: usize, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidParam("wall contact radius must be finite and >= 0".into()));
        }
        if self.box_size.iter().any(|&l| l < 2.0 * radius) {
            return Err(Error::InvalidParam(
                "box_size must be at least 2 * radius in every dimension".into(),
            ));
        }
        if self.radii.len() <= kind {
            self.radii.resize(kind + 1, 0.0);
        }
        self.radii[kind] = radius;
        Ok(self)
    }

    pub fn box_size(&self) -> [f64; DIM] {
        self.box_size
    }

    pub fn radius(&self, kind: usize) -> f64 {
        self.radii.get(kind).copied().unwrap_or(0.0)
    }

    /// Earliest wall contact `(dt, wall_id)` in free flight, or `None` for a
    /// particle at rest.
    pub fn collision_time(&self, p: &Particle) -> Result<Option<(f64, u32)>> {
        let radius = self.radius(p.kind);
        let v = p.velocity();
        let mut best: Option<(f64, u32)> = None;
        for (k, ((&x, &vk), &l)) in p.r.iter().zip(&v).zip(&self.box_size).enumerate() {
            let (gap, wall_id) = if vk < 0.0 {
                (radius - x, 2 * k as u32)
            } else if vk > 0.0 {
                (l - radius - x, 2 * k as u32 + 1)
            } else {
                continue;
            };
            let dt = gap / vk;
            if dt < 0.0 && (dt * vk).abs() > WALL_TOLERANCE * l.max(1.0) {
                return Err(Error::ContractViolation(format!(
                    "particle {} moving out through wall {wall_id} from {x}",
                    p.id()
                )));
            }
            let dt = dt.max(0.0);
            if best.map_or(true, |(t, _)| dt < t) {
                best = Some((dt, wall_id));
            }
        }
        Ok(best)
    }

    /// Specular reflection off `wall_id`. The particle is snapped onto the
    /// contact plane and the magnitude of the normal impulse is returned.
    pub fn bump(&self, p: &mut Particle, wall_id: u32) -> Result<f64> {
        let (axis, is_max) = wall_axis_side(wall_id)?;
        let radius = self.radius(p.kind);
        let pn = p.p[axis];
        p.p[axis] = -pn;
        p.r[axis] = if is_max {
            self.box_size[axis] - radius
        } else {
            radius
        };
        Ok(2.0 * pn.abs())
    }

    /// Infinite when the particle reaches past a wall.
    pub fn energy(&self, p: &Particle) -> f64 {
        let radius = self.radius(p.kind);
        let outside = p
            .r
            .iter()
            .zip(&self.box_size)
            .any(|(&x, &l)| x < radius - WALL_TOLERANCE || x > l - radius + WALL_TOLERANCE);
        if outside {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

fn wall_axis_side(wall_id: u32) -> Result<(usize, bool)> {
    let axis = (wall_id / 2) as usize;
    if axis >= DIM {
        return Err(Error::InvalidParam(format!("wall id {wall_id} out of range")));
    }
    Ok((axis, wall_id % 2 == 1))
}
