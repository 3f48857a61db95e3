//! Event-driven hard-body dynamics.
//!
//! Particles move in free flight between impulsive collisions. The
//! [`core::EventScheduler`] keeps, for every particle, the time to its next
//! collision with an up-neighbor and processes collisions strictly in
//! chronological order, recomputing only the predictions a collision voids.

pub mod config;
pub mod core;
pub mod error;
pub mod neighbor;
pub mod potential;
pub mod runner;
pub mod setup;

#[cfg(feature = "python")]
mod python;

pub use crate::config::{EngineConfig, RebuildPolicy};
pub use crate::core::{EventScheduler, StepOutcome};
pub use crate::error::{Error, Result};
