//! Simulation primitives.
//!
//! Small, engine-free building blocks shared by the combat modules:
//! vector math, entity identifiers, and the tick-based timer wheel that
//! replaces coroutine-style delayed effects.

pub mod id;
pub mod timer;
pub mod vec3;

// Re-export core types
pub use id::EntityId;
pub use timer::{TimerHandle, TimerWheel};
pub use vec3::Vec3;
