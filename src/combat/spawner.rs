//! Declarative Effect Spawning
//!
//! Hit and damage feedback (sparks, letter bursts, decals) is data, not
//! code: a [`SpawnSet`] lists effect definitions, and processing a set
//! against a transform context emits one [`CombatEventData::EffectSpawned`]
//! per definition. The engine side owns the actual instantiation.

use serde::{Deserialize, Serialize};

use crate::combat::events::{CombatEvent, CombatEventData};
use crate::core::id::EntityId;
use crate::core::vec3::Vec3;

/// One effect to spawn, with transform-copy switches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpawnDef {
    /// Effect descriptor name (prefab-like key on the engine side).
    pub effect: String,
    /// Attach the effect to the context's entity instead of the world.
    pub as_child: bool,
    /// Copy the context position into the event.
    pub copy_position: bool,
    /// Copy the context facing into the event.
    pub copy_rotation: bool,
    /// Copy the context scale into the event.
    pub copy_scale: bool,
}

impl SpawnDef {
    /// A free-standing effect at the context position.
    pub fn new(effect: impl Into<String>) -> Self {
        Self {
            effect: effect.into(),
            as_child: false,
            copy_position: true,
            copy_rotation: false,
            copy_scale: false,
        }
    }

    /// Builder: also copy the context facing.
    pub fn facing(mut self) -> Self {
        self.copy_rotation = true;
        self
    }

    /// Builder: attach to the context entity.
    pub fn attached(mut self) -> Self {
        self.as_child = true;
        self
    }
}

/// The transform an effect spawns relative to.
#[derive(Clone, Copy, Debug)]
pub struct SpawnContext {
    /// Entity to attach child effects to, when there is one.
    pub entity: Option<EntityId>,
    /// World position (typically the contact point).
    pub position: Vec3,
    /// Facing direction (typically the surface normal).
    pub facing: Vec3,
    /// Scale.
    pub scale: Vec3,
}

impl SpawnContext {
    /// Context at a surface contact: position at the point, facing the normal.
    pub fn at_surface(point: Vec3, normal: Vec3, entity: Option<EntityId>) -> Self {
        Self {
            entity,
            position: point,
            facing: normal,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

/// An ordered list of effects spawned together.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpawnSet {
    /// Definitions processed in order.
    pub defs: Vec<SpawnDef>,
}

impl SpawnSet {
    /// A set with a single definition.
    pub fn single(def: SpawnDef) -> Self {
        Self { defs: vec![def] }
    }

    /// Emit one spawn event per definition against `ctx`.
    pub fn process(&self, tick: u32, ctx: &SpawnContext, events: &mut Vec<CombatEvent>) {
        for def in &self.defs {
            events.push(CombatEvent::new(
                tick,
                CombatEventData::EffectSpawned {
                    effect: def.effect.clone(),
                    attach_to: if def.as_child { ctx.entity } else { None },
                    position: def.copy_position.then_some(ctx.position),
                    facing: def.copy_rotation.then_some(ctx.facing),
                    scale: def.copy_scale.then_some(ctx.scale),
                },
            ));
        }
    }
}
