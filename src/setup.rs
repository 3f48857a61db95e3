//! Initial configurations.

use crate::core::particle::{Particle, DIM};
use crate::core::vector;
use crate::error::{Error, Result};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};

/// Attempts per particle before placement gives up.
const MAX_ATTEMPTS: usize = 1_000_000;

/// Random non-overlapping gas of identical spheres in an axis-aligned box.
#[derive(Debug, Clone, PartialEq)]
pub struct GasSetup {
    pub num_particles: usize,
    pub box_size: [f64; DIM],
    /// Contact diameter used for the overlap test and wall clearance.
    pub diameter: f64,
    pub mass: f64,
    /// Particle type index.
    pub kind: usize,
    /// Velocity components are drawn uniformly from `[-max_speed, max_speed]`.
    pub max_speed: f64,
    /// Zero the total momentum after sampling.
    pub zero_momentum: bool,
    /// RNG seed; `None` for a nondeterministic run.
    pub seed: Option<u64>,
}

impl GasSetup {
    pub fn new(num_particles: usize, box_size: [f64; DIM], diameter: f64) -> Self {
        Self {
            num_particles,
            box_size,
            diameter,
            mass: 1.0,
            kind: 0,
            max_speed: 1.0,
            zero_momentum: false,
            seed: None,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn zero_momentum(mut self) -> Self {
        self.zero_momentum = true;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(Error::InvalidParam("num_particles must be > 0".into()));
        }
        if !self.box_size.iter().all(|&l| l.is_finite() && l > 0.0) {
            return Err(Error::InvalidParam(
                "box_size components must be finite and > 0".into(),
            ));
        }
        if !self.diameter.is_finite() || self.diameter < 0.0 {
            return Err(Error::InvalidParam("diameter must be finite and >= 0".into()));
        }
        if self.box_size.iter().any(|&l| l < self.diameter) {
            return Err(Error::InvalidParam(
                "box_size must be at least one diameter in every dimension".into(),
            ));
        }
        if !self.max_speed.is_finite() || self.max_speed < 0.0 {
            return Err(Error::InvalidParam("max_speed must be finite and >= 0".into()));
        }
        Ok(())
    }

    /// Place particles by rejection sampling, each at least one diameter
    /// from the others and one radius from every wall.
    pub fn build(&self) -> Result<Vec<Particle>> {
        self.validate()?;
        let mut rng: StdRng = match self.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        let radius = 0.5 * self.diameter;
        let mut particles: Vec<Particle> = Vec::with_capacity(self.num_particles);
        for n in 0..self.num_particles {
            let mut attempts = 0usize;
            let r = loop {
                if attempts >= MAX_ATTEMPTS {
                    return Err(Error::InvalidParam(format!(
                        "failed to place particle {n} without overlap; try fewer particles or a smaller diameter"
                    )));
                }
                attempts += 1;
                let mut r = [0.0_f64; DIM];
                for (r_k, &l) in r.iter_mut().zip(&self.box_size) {
                    *r_k = rng.random_range(radius..=l - radius);
                }
                if !overlaps_existing(&particles, &r, self.diameter) {
                    break r;
                }
            };

            let mut v = [0.0_f64; DIM];
            if self.max_speed > 0.0 {
                v.iter_mut()
                    .for_each(|x| *x = rng.random_range(-self.max_speed..=self.max_speed));
            }
            particles.push(Particle::with_velocity(self.kind, r, v, self.mass)?);
        }

        if self.zero_momentum {
            remove_drift(&mut particles)?;
        }
        Ok(particles)
    }
}

/// Shift every velocity so the total momentum vanishes.
pub fn remove_drift(particles: &mut [Particle]) -> Result<()> {
    let total_mass: f64 = particles.iter().map(Particle::mass).sum();
    if particles.is_empty() || total_mass <= 0.0 {
        return Ok(());
    }
    let mut momentum = [0.0; DIM];
    for p in particles.iter() {
        vector::add_scaled(&mut momentum, 1.0, &p.p);
    }
    let drift = vector::scale(&momentum, 1.0 / total_mass);
    for p in particles.iter_mut() {
        let mut q = p.p;
        vector::add_scaled(&mut q, -p.mass(), &drift);
        p.set_momentum(q)?;
    }
    Ok(())
}

fn overlaps_existing(existing: &[Particle], r: &[f64; DIM], diameter: f64) -> bool {
    let min_sq = diameter * diameter;
    existing
        .iter()
        .any(|p| vector::norm_sq(&vector::sub(r, &p.r)) < min_sq)
}
