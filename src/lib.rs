//! # Typefire Combat Core
//!
//! Engine-agnostic combat simulation for a typing FPS prototype: the gun is
//! a keyboard, ammo is letters, and damage only lands when the fired letter
//! matches the target's next health letter.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TYPEFIRE CORE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Simulation primitives                     │
//! │  ├── vec3.rs     - f32 3D vector math                        │
//! │  ├── timer.rs    - Tick-based timer wheel (cancellable)      │
//! │  └── id.rs       - Entity identifiers                        │
//! │                                                              │
//! │  combat/         - Combat logic                              │
//! │  ├── input.rs    - Per-frame key/button snapshot             │
//! │  ├── events.rs   - Combat event stream                       │
//! │  ├── gun.rs      - Gun state machine + letter magazine       │
//! │  ├── health.rs   - Letter-depletion health tracks            │
//! │  ├── projectile.rs - Projectile spawn/travel resolution      │
//! │  ├── director.rs - Idle/Combat mood switch                   │
//! │  ├── spawner.rs  - Declarative spawn-on-event sets           │
//! │  ├── world.rs    - World state + spatial query seam          │
//! │  └── tick.rs     - Frame driver                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Execution model
//!
//! Single-threaded and frame-stepped: the embedding engine calls
//! [`combat::tick::frame`] once per 60 Hz tick with that frame's input and
//! aim context. All delayed effects (recent-damage decay, text settle,
//! deferred removal, level reload, combat escalation) are entries in a
//! [`core::timer::TimerWheel`] drained at the top of each frame, so no
//! threads, locks, or wall-clock reads exist anywhere in the simulation.
//!
//! Rendering, physics raycasts, audio, and UI stay outside: the engine
//! implements [`combat::world::SpatialQuery`] and consumes the
//! [`combat::events::CombatEvent`] stream.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod combat;
pub mod core;

// Re-export commonly used types
pub use crate::core::id::EntityId;
pub use crate::core::timer::{TimerHandle, TimerWheel};
pub use crate::core::vec3::Vec3;
pub use combat::events::{CombatEvent, CombatEventData};
pub use combat::gun::{Gun, GunConfig, GunState};
pub use combat::health::{DamagePacket, HealthTrack};
pub use combat::input::FrameInput;
pub use combat::world::{SpatialQuery, SurfaceHit, World};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Duration of one tick in seconds.
pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;

/// Convert a duration in seconds to whole ticks (rounded).
pub fn secs_to_ticks(secs: f32) -> u32 {
    (secs * TICK_RATE as f32 + 0.5) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_to_ticks() {
        assert_eq!(secs_to_ticks(0.5), 30);
        assert_eq!(secs_to_ticks(0.3), 18);
        assert_eq!(secs_to_ticks(10.0), 600);
        assert_eq!(secs_to_ticks(0.0), 0);
    }
}
