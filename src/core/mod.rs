//! Engine core: particles, their ordering, collision records and the
//! event scheduler that drives them.

pub mod directive;
pub mod event;
pub mod particle;
pub mod sequence;
pub mod sim;
pub mod state;
pub mod vector;

pub use directive::{Direction, NeighborSource, Scope, TraversalDirective};
pub use event::{CollisionEvent, CollisionListener, EventLog, QueueEntry};
pub use particle::{Particle, ParticleId, DIM};
pub use sequence::OrderedParticleSequence;
pub use sim::{EngineState, EventScheduler, StepOutcome};
pub use state::{Collider, CollisionRecord, ParticleCollisionState};
pub use vector::Vector;
