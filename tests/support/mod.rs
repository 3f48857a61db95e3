// Shared helpers for the integration tests.
#![allow(dead_code)]

use hardsim::config::{EngineConfig, RebuildPolicy};
use hardsim::core::{EventScheduler, Particle, StepOutcome};
use hardsim::error::Result;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

// Install a test-friendly subscriber once per binary; `RUST_LOG` selects the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// Settings under which the catalog never hides a collision.
pub fn exact_config() -> EngineConfig {
    EngineConfig {
        neighbor_rebuild_policy: RebuildPolicy::Displacement,
        ..EngineConfig::default()
    }
}

pub fn particle(r: [f64; 3], v: [f64; 3]) -> Particle {
    Particle::with_velocity(0, r, v, 1.0).expect("valid test particle")
}

// Step until `n` collisions were processed or no event is left.
pub fn run_collisions(sim: &mut EventScheduler, n: u64) -> Result<u64> {
    let mut done = 0;
    while done < n {
        match sim.step()? {
            StepOutcome::Collision(_) => done += 1,
            StepOutcome::NoFurtherEvents => break,
        }
    }
    Ok(done)
}

pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual} (tolerance {tol})"
    );
}
