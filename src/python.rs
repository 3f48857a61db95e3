use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::EngineConfig;
use crate::core::particle::DIM;
use crate::core::{EventScheduler, StepOutcome};
use crate::potential::{HardSphere, HardWalls, PotentialTable, SquareWell};
use crate::setup::GasSetup;

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn box_from(box_size: Vec<f64>) -> PyResult<[f64; DIM]> {
    box_size
        .try_into()
        .map_err(|_| py_err(format!("box_size must have length {DIM}")))
}

/// Hard-body gas in a walled box, driven collision by collision.
///
/// - __new__(num_particles, box_size, diameter=1.0, mass=1.0, seed=None,
///   well=None, depth=1.0, config=None)
/// - step() -> dict | None
/// - advance_to(time) -> number of collisions
/// - get_positions() / get_velocities() -> np.ndarray, shape (N, 3)
#[pyclass(name = "Simulation")]
pub struct PySimulation {
    sim: EventScheduler,
}

#[pymethods]
impl PySimulation {
    /// Build a random non-overlapping gas and initialize the engine.
    ///
    /// `well` switches from hard spheres to a square well of that width
    /// ratio; `config` is an optional TOML document of engine settings.
    /// Raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (num_particles, box_size, diameter=1.0, mass=1.0, seed=None, well=None, depth=1.0, config=None))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        num_particles: usize,
        box_size: Vec<f64>,
        diameter: f64,
        mass: f64,
        seed: Option<u64>,
        well: Option<f64>,
        depth: f64,
        config: Option<String>,
    ) -> PyResult<Self> {
        let box_size = box_from(box_size)?;
        let config = match config {
            Some(text) => EngineConfig::from_toml_str(&text).map_err(py_err)?,
            None => EngineConfig::default(),
        };
        let mut setup = GasSetup::new(num_particles, box_size, diameter).mass(mass);
        setup.seed = seed;
        let particles = setup.build().map_err(py_err)?;

        let table = match well {
            Some(lambda) => {
                PotentialTable::uniform(SquareWell::new(diameter, lambda, depth).map_err(py_err)?)
            }
            None => PotentialTable::uniform(HardSphere::new(diameter).map_err(py_err)?),
        };
        let walls = HardWalls::from_table(box_size, &table).map_err(py_err)?;
        let mut sim = EventScheduler::new(particles, table, config)
            .and_then(|s| s.with_walls(walls))
            .map_err(py_err)?;
        sim.initialize().map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Process one collision. Returns a dict describing it, or None when no
    /// collision is pending.
    fn step<'py>(&mut self, py: Python<'py>) -> PyResult<Option<Bound<'py, PyDict>>> {
        let outcome = py.detach(|| self.sim.step()).map_err(py_err)?;
        let StepOutcome::Collision(event) = outcome else {
            return Ok(None);
        };
        let out = PyDict::new(py);
        out.set_item("time", event.time)?;
        out.set_item("a", event.a.index())?;
        out.set_item("b", event.b.map(|b| b.index()))?;
        out.set_item("wall_id", event.wall_id)?;
        out.set_item("potential", event.potential)?;
        out.set_item("virial", event.virial)?;
        out.set_item("energy_change", event.energy_change)?;
        Ok(Some(out))
    }

    /// Advance to an absolute time (releases the GIL during computation).
    fn advance_to(&mut self, py: Python<'_>, target_time: f64) -> PyResult<u64> {
        py.detach(|| self.sim.advance_to(target_time)).map_err(py_err)
    }

    fn time(&self) -> f64 {
        self.sim.time()
    }

    fn collision_count(&self) -> u64 {
        self.sim.collision_count()
    }

    fn kinetic_energy(&self) -> f64 {
        self.sim.kinetic_energy()
    }

    fn potential_energy(&self) -> PyResult<f64> {
        self.sim.potential_energy().map_err(py_err)
    }

    /// Pair virial accumulated since the previous call.
    fn take_virial(&mut self) -> f64 {
        self.sim.take_virial()
    }

    fn wall_impulse_total(&self) -> f64 {
        self.sim.wall_impulse_total()
    }

    /// Positions as a NumPy array of shape (N, 3), dtype=float64.
    fn get_positions(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        let mut arr = Array2::<f64>::zeros((self.sim.num_particles(), DIM));
        for (i, p) in self.sim.particles().iter().enumerate() {
            for k in 0..DIM {
                arr[[i, k]] = p.r[k];
            }
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Velocities as a NumPy array of shape (N, 3), dtype=float64.
    fn get_velocities(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        let mut arr = Array2::<f64>::zeros((self.sim.num_particles(), DIM));
        for (i, p) in self.sim.particles().iter().enumerate() {
            let v = p.velocity();
            for k in 0..DIM {
                arr[[i, k]] = v[k];
            }
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Per-particle collision participation counts.
    fn get_collision_counts(&self, py: Python<'_>) -> PyResult<Py<PyArray1<u64>>> {
        let counts: Vec<u64> = self.sim.particles().iter().map(|p| p.collision_count).collect();
        Ok(counts.into_pyarray(py).to_owned().into())
    }

    fn halt(&mut self) -> PyResult<()> {
        self.sim.halt().map_err(py_err)
    }
}

/// The hardsim Python module entry point.
#[pymodule]
fn hardsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySimulation>()?;
    Ok(())
}
