//! Combat Events
//!
//! Fire-and-forget notifications for the engine collaborators: audio,
//! HUD, effect spawning, and music. The core never blocks on any of these;
//! it queues events during a frame and the driver hands the batch back to
//! the caller.

use serde::{Deserialize, Serialize};

use crate::core::id::EntityId;
use crate::core::vec3::Vec3;

/// Music theme selector for the director's mood changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Theme {
    /// Ambient exploration theme
    Idle = 0,
    /// One-shot transition into combat
    CombatBuildup = 1,
    /// Looping combat theme
    CombatLoop = 2,
}

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Deaths processed first
    Death = 0,
    /// Then accepted damage
    Damage = 1,
    /// Then projectile contact
    Hit = 2,
    /// Then gun state transitions
    GunTransition = 3,
    /// Then reload activity
    Reload = 4,
    /// Then HUD/display updates
    Hud = 5,
    /// Lowest priority
    Other = 255,
}

/// Combat event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CombatEventData {
    /// An entity's health track ran out.
    Death {
        /// The entity that died
        entity: EntityId,
        /// Who landed the final letter
        instigator: EntityId,
    },

    /// The player-controlled entity died (death notice + input lockout).
    PlayerDied,

    /// A non-player entity was killed; `total_kills` is the running count.
    EnemyKilled {
        /// The killed entity
        entity: EntityId,
        /// Kills so far this level
        total_kills: u32,
    },

    /// A letter was accepted by a health track.
    Damage {
        /// The damaged entity
        entity: EntityId,
        /// The matched letter
        letter: char,
        /// Letters still pending after the hit
        remaining: usize,
    },

    /// A projectile resolved against a surface.
    ProjectileHit {
        /// Projectile id
        projectile: u32,
        /// Contact point
        point: Vec3,
        /// Whether the contact dealt accepted damage
        damaged: bool,
    },

    /// A projectile exceeded its max distance without contact.
    ProjectileExpired {
        /// Projectile id
        projectile: u32,
    },

    /// A traveling projectile was created.
    ProjectileSpawned {
        /// Projectile id
        projectile: u32,
        /// The fired letter
        letter: char,
    },

    /// A round left the barrel.
    Fired {
        /// The fired letter
        letter: char,
        /// True when this emptied the magazine
        last_round: bool,
    },

    /// Trigger pulled on an empty magazine.
    DryFire,

    /// HUD out-of-ammo notice.
    OutOfAmmo,

    /// Gun began raising (audio cue).
    GunRaising,
    /// Gun began lowering (audio cue).
    GunLowering,
    /// Gun reached the Up state.
    GunUp,
    /// Gun reached the Down state.
    GunDown,

    /// Crosshair visibility toggle for the HUD.
    CrosshairVisible {
        /// Desired visibility
        visible: bool,
    },

    /// Reload typing began.
    ReloadStarted,
    /// A reload keystroke landed (letter added, or None for a deletion).
    ReloadKeyPress {
        /// The letter typed, None when a slot was deleted
        letter: Option<char>,
    },
    /// Reload typing confirmed/ended.
    ReloadEnded,

    /// The fixed-width ammo display changed.
    AmmoDisplayChanged {
        /// Rendered slot string (one char per slot)
        text: String,
    },

    /// A health track's floating text visibility changed.
    HealthTextVisible {
        /// The owning entity
        entity: EntityId,
        /// Desired visibility
        visible: bool,
    },

    /// Reticle target highlight toggled.
    TargetHighlight {
        /// The (un)highlighted entity
        entity: EntityId,
        /// Whether the highlight turned on
        highlighted: bool,
    },

    /// The director changed the music.
    MusicChanged {
        /// Theme to play
        theme: Theme,
        /// Queue after the current theme instead of cutting over
        queued: bool,
    },

    /// A declarative spawn set produced an effect.
    EffectSpawned {
        /// Effect descriptor name (prefab-like key)
        effect: String,
        /// Attach to this entity's transform
        attach_to: Option<EntityId>,
        /// World position, when the definition copies position
        position: Option<Vec3>,
        /// Facing direction, when the definition copies rotation
        facing: Option<Vec3>,
        /// Scale, when the definition copies scale
        scale: Option<Vec3>,
    },

    /// The scheduled post-death level reload fired.
    LevelReload,

    /// A dead entity's deferred removal fired.
    EntityRemoved {
        /// The removed entity
        entity: EntityId,
    },
}

impl CombatEventData {
    /// Processing priority for this event kind.
    pub fn priority(&self) -> EventPriority {
        use CombatEventData::*;
        match self {
            Death { .. } | PlayerDied | EnemyKilled { .. } => EventPriority::Death,
            Damage { .. } => EventPriority::Damage,
            ProjectileHit { .. } | ProjectileExpired { .. } | ProjectileSpawned { .. } => {
                EventPriority::Hit
            }
            Fired { .. } | DryFire | GunRaising | GunLowering | GunUp | GunDown => {
                EventPriority::GunTransition
            }
            ReloadStarted | ReloadKeyPress { .. } | ReloadEnded => EventPriority::Reload,
            OutOfAmmo
            | CrosshairVisible { .. }
            | AmmoDisplayChanged { .. }
            | HealthTextVisible { .. }
            | TargetHighlight { .. } => EventPriority::Hud,
            MusicChanged { .. } | EffectSpawned { .. } | LevelReload | EntityRemoved { .. } => {
                EventPriority::Other
            }
        }
    }

    /// The entity this event concerns, when there is one (for tie-breaking).
    pub fn entity(&self) -> Option<EntityId> {
        use CombatEventData::*;
        match self {
            Death { entity, .. }
            | EnemyKilled { entity, .. }
            | Damage { entity, .. }
            | HealthTextVisible { entity, .. }
            | TargetHighlight { entity, .. }
            | EntityRemoved { entity } => Some(*entity),
            EffectSpawned { attach_to, .. } => *attach_to,
            _ => None,
        }
    }
}

/// A combat event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Tick when the event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Entity involved (for tie-breaking)
    pub entity: Option<EntityId>,

    /// Event data
    pub data: CombatEventData,
}

impl CombatEvent {
    /// Create a new event; priority and entity derive from the data.
    pub fn new(tick: u32, data: CombatEventData) -> Self {
        Self {
            tick,
            priority: data.priority(),
            entity: data.entity(),
            data,
        }
    }

    /// Create a death event.
    pub fn death(tick: u32, entity: EntityId, instigator: EntityId) -> Self {
        Self::new(tick, CombatEventData::Death { entity, instigator })
    }

    /// Create an accepted-damage event.
    pub fn damage(tick: u32, entity: EntityId, letter: char, remaining: usize) -> Self {
        Self::new(
            tick,
            CombatEventData::Damage {
                entity,
                letter,
                remaining,
            },
        )
    }

    /// Create a fired event.
    pub fn fired(tick: u32, letter: char, last_round: bool) -> Self {
        Self::new(tick, CombatEventData::Fired { letter, last_round })
    }

    /// Create a music change event.
    pub fn music(tick: u32, theme: Theme, queued: bool) -> Self {
        Self::new(tick, CombatEventData::MusicChanged { theme, queued })
    }
}

impl PartialEq for CombatEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick && self.priority == other.priority && self.entity == other.entity
    }
}

impl Eq for CombatEvent {}

impl PartialOrd for CombatEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CombatEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then entity
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.entity.cmp(&other.entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let id1 = EntityId::new([1; 16]);
        let id2 = EntityId::new([2; 16]);

        let death = CombatEvent::death(10, id1, id2);
        let damage = CombatEvent::damage(10, id1, 'H', 5);
        let death_later = CombatEvent::death(11, id1, id2);

        // Same tick, but death < damage
        assert!(death < damage);
        // Earlier tick wins regardless of priority
        assert!(damage < death_later);
    }

    #[test]
    fn test_priority_derivation() {
        let dry = CombatEventData::DryFire;
        assert_eq!(dry.priority(), EventPriority::GunTransition);
        assert_eq!(dry.entity(), None);

        let id = EntityId::new([3; 16]);
        let removed = CombatEventData::EntityRemoved { entity: id };
        assert_eq!(removed.priority(), EventPriority::Other);
        assert_eq!(removed.entity(), Some(id));
    }
}
