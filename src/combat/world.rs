//! Combat World
//!
//! The authoritative aggregate: the gun, every health track, projectiles
//! in flight, the director, and the shared timer wheel. The world owns
//! the pending event queue; collaborators push into it during a frame and
//! the tick driver drains it at frame end.
//!
//! Spatial queries are abstracted behind [`SpatialQuery`] so the core
//! never depends on an engine's physics scene. The embedding supplies an
//! implementation; tests supply stubs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combat::director::CombatDirector;
use crate::combat::events::{CombatEvent, CombatEventData};
use crate::combat::gun::{Gun, GunConfig};
use crate::combat::health::{DamagePacket, HealthTrack};
use crate::combat::projectile::{AimContext, FireResolution, Projectile, ProjectileSpec, StepOutcome};
use crate::combat::spawner::{SpawnContext, SpawnDef, SpawnSet};
use crate::core::id::EntityId;
use crate::core::timer::TimerWheel;
use crate::core::vec3::Vec3;

/// Collision mask bit: visual geometry (walls, props).
pub const MASK_VISUAL: u8 = 0x01;

/// Collision mask bit: damageable volumes.
pub const MASK_DAMAGE: u8 = 0x02;

/// A ray or sphere sweep contact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHit {
    /// Contact point.
    pub point: Vec3,
    /// Surface normal at the contact.
    pub normal: Vec3,
    /// Distance from the sweep origin.
    pub distance: f32,
    /// The damageable entity hit, when the surface belongs to one.
    pub entity: Option<EntityId>,
}

/// Spatial queries against the embedding's scene.
///
/// Both sweeps return the nearest contact within `max_distance` whose
/// surface matches `mask`, or None.
pub trait SpatialQuery {
    /// Zero-width ray sweep.
    fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u8)
        -> Option<SurfaceHit>;

    /// Sphere sweep of the given radius.
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: u8,
    ) -> Option<SurfaceHit>;
}

/// Deferred work carried by the timer wheel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// A health track's recent-damage hold elapsed.
    RecentDamageDecay {
        /// The track's entity.
        entity: EntityId,
    },
    /// A health track's text-settle delay elapsed.
    TextSettle {
        /// The track's entity.
        entity: EntityId,
    },
    /// A dead entity's removal delay elapsed.
    RemoveEntity {
        /// The entity to remove.
        entity: EntityId,
    },
    /// The post-death level reload fired.
    ReloadLevel,
    /// The director's auto-escalation fired.
    EscalateCombat,
}

/// Whole-core configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Gun tunables.
    pub gun: GunConfig,
    /// Projectile tunables.
    pub projectile: ProjectileSpec,
    /// Ticks between player death and the level reload (5 s at 60 Hz).
    pub level_reload_delay: u32,
    /// Effects spawned at any projectile contact.
    pub on_hit_effects: SpawnSet,
    /// Effects spawned only when the contact dealt accepted damage.
    pub on_damaged_effects: SpawnSet,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            gun: GunConfig::default(),
            projectile: ProjectileSpec::default(),
            level_reload_delay: 300,
            on_hit_effects: SpawnSet::single(SpawnDef::new("hit_spark").facing()),
            on_damaged_effects: SpawnSet::single(SpawnDef::new("letter_burst").facing()),
        }
    }
}

/// The authoritative combat state.
pub struct World {
    /// Current tick (advanced by the tick driver).
    pub tick: u32,

    /// The player's gun.
    pub gun: Gun,

    /// Traveling projectiles, oldest first.
    pub projectiles: Vec<Projectile>,

    /// The level mood controller.
    pub director: CombatDirector,

    /// Shared timer wheel for all deferred work.
    pub timers: TimerWheel<ScheduledAction>,

    config: CombatConfig,
    player: EntityId,
    tracks: BTreeMap<EntityId, HealthTrack>,
    next_projectile_id: u32,
    pending_events: Vec<CombatEvent>,
    kills: u32,
    input_enabled: bool,
    reticle_target: Option<EntityId>,
}

impl World {
    /// Create a world for `player` with the given configuration.
    pub fn new(player: EntityId, config: CombatConfig) -> Self {
        Self {
            tick: 0,
            gun: Gun::new(config.gun.clone()),
            projectiles: Vec::new(),
            director: CombatDirector::new(),
            timers: TimerWheel::new(),
            config,
            player,
            tracks: BTreeMap::new(),
            next_projectile_id: 0,
            pending_events: Vec::new(),
            kills: 0,
            input_enabled: true,
            reticle_target: None,
        }
    }

    /// The player entity.
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// The active configuration.
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Kills this level.
    pub fn kills(&self) -> u32 {
        self.kills
    }

    /// Whether player input is processed (false after player death).
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// The entity currently under the reticle, if any.
    pub fn reticle_target(&self) -> Option<EntityId> {
        self.reticle_target
    }

    /// Level start: ambient mood, escalation armed, gun equipped silently.
    ///
    /// The raise completes when the engine reports the equip animation done
    /// via `self.gun.on_raise_complete`.
    pub fn start(&mut self) {
        info!(player = %self.player.short(), "combat world start");
        let tick = self.tick;
        self.director
            .start(tick, &mut self.timers, &mut self.pending_events);
        self.gun.request_up(tick, true, &mut self.pending_events);
    }

    // -------------------------------------------------------------------------
    // Health tracks
    // -------------------------------------------------------------------------

    /// Register a damageable entity.
    pub fn add_damageable(&mut self, track: HealthTrack) {
        debug!(entity = %track.id().short(), "damageable registered");
        self.tracks.insert(track.id(), track);
    }

    /// Look up a health track.
    pub fn damageable(&self, id: EntityId) -> Option<&HealthTrack> {
        self.tracks.get(&id)
    }

    /// Look up a health track mutably.
    pub fn damageable_mut(&mut self, id: EntityId) -> Option<&mut HealthTrack> {
        self.tracks.get_mut(&id)
    }

    /// Registered damageable entities in id order.
    pub fn damageables(&self) -> impl Iterator<Item = &HealthTrack> {
        self.tracks.values()
    }

    /// Route a damage packet at `target`. Returns true when accepted.
    ///
    /// This is the single damage entry point: projectile contacts and
    /// direct sources (melee) both land here, so death side effects are
    /// applied exactly once.
    pub fn apply_damage(&mut self, target: EntityId, packet: &DamagePacket) -> bool {
        let tick = self.tick;
        let Some(track) = self.tracks.get_mut(&target) else {
            return false;
        };
        let was_alive = track.is_alive();
        let accepted =
            track.take_damage(packet, tick, &mut self.timers, &mut self.pending_events);
        // Not `accepted`: a filler-only tail kills the track while
        // rejecting the hit itself
        if was_alive && !track.is_alive() {
            self.handle_death(target);
        }
        accepted
    }

    fn handle_death(&mut self, entity: EntityId) {
        let tick = self.tick;
        if entity == self.player {
            info!(tick, "player died");
            self.input_enabled = false;
            self.gun.set_enabled(false);
            self.gun.request_down(tick, true, &mut self.pending_events);
            self.pending_events
                .push(CombatEvent::new(tick, CombatEventData::PlayerDied));
            self.timers
                .schedule_after(tick, self.config.level_reload_delay, ScheduledAction::ReloadLevel);
            return;
        }

        self.kills += 1;
        info!(entity = %entity.short(), total = self.kills, "enemy killed");
        self.pending_events.push(CombatEvent::new(
            tick,
            CombatEventData::EnemyKilled {
                entity,
                total_kills: self.kills,
            },
        ));
        if self.reticle_target == Some(entity) {
            self.reticle_target = None;
        }
        if let Some(track) = self.tracks.get(&entity) {
            if let Some(delay) = track.removal_delay_ticks {
                self.timers
                    .schedule_after(tick, delay, ScheduledAction::RemoveEntity { entity });
            }
        }
    }

    // -------------------------------------------------------------------------
    // Firing and projectiles
    // -------------------------------------------------------------------------

    /// Resolve a fired letter: instant hit or traveling projectile.
    pub fn fire_projectile<Q: SpatialQuery + ?Sized>(
        &mut self,
        letter: char,
        aim: &AimContext,
        query: &Q,
    ) {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;

        match super::projectile::resolve_fire(
            id,
            letter,
            self.player,
            aim,
            &self.config.projectile,
            query,
        ) {
            FireResolution::InstantHit(hit) => {
                debug!(projectile = id, letter = %letter, "instant hit at muzzle");
                self.resolve_contact(id, letter, &hit);
            }
            FireResolution::Travel(projectile) => {
                self.pending_events.push(CombatEvent::new(
                    self.tick,
                    CombatEventData::ProjectileSpawned {
                        projectile: id,
                        letter,
                    },
                ));
                self.projectiles.push(projectile);
            }
        }
    }

    /// Advance every projectile one fixed step and resolve the outcomes.
    pub fn step_projectiles<Q: SpatialQuery + ?Sized>(&mut self, dt: f32, query: &Q) {
        let mut contacts: Vec<(u32, char, SurfaceHit)> = Vec::new();
        let mut i = 0;
        while i < self.projectiles.len() {
            match self.projectiles[i].step(dt, query) {
                StepOutcome::InFlight => i += 1,
                StepOutcome::Expired => {
                    let projectile = self.projectiles.remove(i);
                    self.pending_events.push(CombatEvent::new(
                        self.tick,
                        CombatEventData::ProjectileExpired {
                            projectile: projectile.id,
                        },
                    ));
                }
                StepOutcome::Hit(hit) => {
                    let projectile = self.projectiles.remove(i);
                    contacts.push((projectile.id, projectile.letter, hit));
                }
            }
        }
        for (id, letter, hit) in contacts {
            self.resolve_contact(id, letter, &hit);
        }
    }

    /// A projectile contacted a surface: try damage, spawn feedback, report.
    fn resolve_contact(&mut self, projectile: u32, letter: char, hit: &SurfaceHit) {
        let tick = self.tick;
        let packet = DamagePacket {
            instigator: self.player,
            letter,
            force_letter_match: false,
        };
        let damaged = match hit.entity {
            Some(target) => self.apply_damage(target, &packet),
            None => false,
        };

        let ctx = SpawnContext::at_surface(hit.point, hit.normal, hit.entity);
        if damaged {
            self.config
                .on_damaged_effects
                .process(tick, &ctx, &mut self.pending_events);
        } else {
            self.config
                .on_hit_effects
                .process(tick, &ctx, &mut self.pending_events);
        }
        self.pending_events.push(CombatEvent::new(
            tick,
            CombatEventData::ProjectileHit {
                projectile,
                point: hit.point,
                damaged,
            },
        ));
    }

    // -------------------------------------------------------------------------
    // Reticle targeting
    // -------------------------------------------------------------------------

    /// Re-evaluate what the reticle covers and emit highlight changes.
    ///
    /// The candidate comes from a damage-mask sphere sweep along the aim
    /// ray; visual geometry closer than the candidate blocks it. Events
    /// fire only when the target changes, and untargetable tracks never
    /// highlight.
    pub fn update_reticle_target<Q: SpatialQuery + ?Sized>(
        &mut self,
        aim: &AimContext,
        query: &Q,
    ) {
        let spec = &self.config.projectile;
        let mut candidate = None;
        if let Some(hit) = query.sphere_cast(
            aim.aim_origin,
            spec.damage_radius,
            aim.aim_direction,
            spec.max_distance,
            MASK_DAMAGE,
        ) {
            let blocked = query
                .ray_cast(aim.aim_origin, aim.aim_direction, hit.distance, MASK_VISUAL)
                .is_some();
            if !blocked {
                candidate = hit
                    .entity
                    .filter(|id| self.tracks.get(id).is_some_and(|t| t.is_alive()));
            }
        }

        if candidate == self.reticle_target {
            return;
        }
        let tick = self.tick;
        if let Some(old) = self.reticle_target.take() {
            if self.tracks.get(&old).is_some_and(|t| !t.untargetable) {
                self.pending_events.push(CombatEvent::new(
                    tick,
                    CombatEventData::TargetHighlight {
                        entity: old,
                        highlighted: false,
                    },
                ));
            }
        }
        self.reticle_target = candidate;
        if let Some(new) = candidate {
            if self.tracks.get(&new).is_some_and(|t| !t.untargetable) {
                self.pending_events.push(CombatEvent::new(
                    tick,
                    CombatEventData::TargetHighlight {
                        entity: new,
                        highlighted: true,
                    },
                ));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Timer actions
    // -------------------------------------------------------------------------

    /// Apply one drained timer action.
    pub fn apply_action(&mut self, action: ScheduledAction) {
        let tick = self.tick;
        match action {
            ScheduledAction::RecentDamageDecay { entity } => {
                if let Some(track) = self.tracks.get_mut(&entity) {
                    track.on_recent_damage_decay(tick, &mut self.timers);
                }
            }
            ScheduledAction::TextSettle { entity } => {
                if let Some(track) = self.tracks.get_mut(&entity) {
                    track.on_text_settle(tick, &mut self.pending_events);
                }
            }
            ScheduledAction::RemoveEntity { entity } => {
                if self.tracks.remove(&entity).is_some() {
                    debug!(entity = %entity.short(), "dead entity removed");
                    self.pending_events
                        .push(CombatEvent::new(tick, CombatEventData::EntityRemoved { entity }));
                }
            }
            ScheduledAction::ReloadLevel => {
                info!(tick, "level reload");
                self.pending_events
                    .push(CombatEvent::new(tick, CombatEventData::LevelReload));
            }
            ScheduledAction::EscalateCombat => {
                self.director.set_state(
                    super::director::DirectorState::Combat,
                    false,
                    tick,
                    &mut self.pending_events,
                );
            }
        }
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Split borrow: the gun together with the queue it pushes into.
    pub fn gun_and_events(&mut self) -> (&mut Gun, &mut Vec<CombatEvent>) {
        (&mut self.gun, &mut self.pending_events)
    }

    /// Queue an event for this frame's batch.
    pub fn push_event(&mut self, event: CombatEvent) {
        self.pending_events.push(event);
    }

    /// Borrow the pending queue (for collaborators that push directly).
    pub fn pending_events_mut(&mut self) -> &mut Vec<CombatEvent> {
        &mut self.pending_events
    }

    /// Take this frame's event batch, sorted by (tick, priority, entity).
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        events.sort();
        events
    }
}

// =============================================================================
// TESTS
// =============================================================================
