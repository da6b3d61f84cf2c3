//! Combat Logic Module
//!
//! The playable core: gun handling, letter-matched damage, projectile
//! resolution, and the idle/combat mood switch. Everything here is driven
//! synchronously by [`tick::frame`]; no module talks to an engine directly.

pub mod director;
pub mod events;
pub mod gun;
pub mod health;
pub mod input;
pub mod projectile;
pub mod spawner;
pub mod tick;
pub mod world;
