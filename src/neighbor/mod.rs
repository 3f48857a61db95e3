//! Locality-restricted candidate lists.
//!
//! The catalog stores, for each particle, the handles of nearby particles
//! split by the total order: `up` holds later particles and `down` earlier
//! ones. A catalog built with radius `R = cutoff + delta` stays exact while no
//! particle has moved more than `delta / 2` since the last rebuild.

pub mod catalog;
pub mod criterion;

pub use catalog::NeighborCatalog;
pub use criterion::{AllPairs, Criterion, CutoffCriterion};
