//! Frame Driver
//!
//! One call per 60 Hz tick. The within-frame ordering is fixed:
//!
//! 1. Drain due timers (deferred decay, settle, removal, reload, escalation)
//! 2. Reload typing (letters before confirm before delete)
//! 3. Fire input
//! 4. Projectile fixed step
//! 5. Reticle target re-evaluation
//!
//! Reload keys run before the fire check so a confirm and a letter landing
//! on the same frame behave deterministically, and the reload-start key
//! itself is never captured as ammo (letters are only read while the
//! reload is already active).

use tracing::trace;

use crate::combat::events::CombatEvent;
use crate::combat::input::FrameInput;
use crate::combat::projectile::AimContext;
use crate::combat::world::{SpatialQuery, World};
use crate::TICK_DT;

/// The outcome of one frame: the sorted event batch for the collaborators.
#[derive(Debug, Default)]
pub struct FrameResult {
    /// Events raised this frame, sorted by (tick, priority, entity).
    pub events: Vec<CombatEvent>,
}

/// Advance the world one tick.
pub fn frame<Q: SpatialQuery + ?Sized>(
    world: &mut World,
    input: &FrameInput,
    aim: &AimContext,
    query: &Q,
) -> FrameResult {
    world.tick += 1;
    let tick = world.tick;
    trace!(tick, "frame begin");

    // 1. Deferred work scheduled for this tick or earlier
    let due = world.timers.drain_due(tick);
    for action in due {
        world.apply_action(action);
    }

    // 2 + 3. Player input
    if world.input_enabled() && world.gun.is_enabled() {
        process_gun_input(world, input, tick);
        if input.fire_pressed() {
            let fired = {
                let (gun, events) = world.gun_and_events();
                gun.try_fire(tick, events)
            };
            if let Some(letter) = fired {
                world.fire_projectile(letter, aim, query);
            }
        }
    }

    // 4. Fixed-step travel and contact resolution
    world.step_projectiles(TICK_DT, query);

    // 5. What the crosshair covers now
    world.update_reticle_target(aim, query);

    FrameResult {
        events: world.take_events(),
    }
}

fn process_gun_input(world: &mut World, input: &FrameInput, tick: u32) {
    if world.gun.is_reloading() {
        // Letters land before the confirm so a same-frame letter+confirm
        // still loads the letter
        {
            let (gun, events) = world.gun_and_events();
            for letter in input.pressed_letters() {
                gun.on_key_typed(letter, tick, events);
            }
        }
        let (gun, events) = world.gun_and_events();
        if input.confirm_pressed() {
            gun.end_reload(tick, events);
        } else if input.delete_held() {
            gun.on_delete_held(input.delete_pressed(), tick, events);
        }
    } else if input.reload_pressed() || input.confirm_pressed() {
        // Letters are not read on this frame, so the reload key itself
        // never loads into the magazine
        let (gun, events) = world.gun_and_events();
        gun.begin_reload(tick, events);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::events::CombatEventData;
    use crate::combat::gun::{GunConfig, GunState};
    use crate::combat::health::HealthTrack;
    use crate::combat::world::{CombatConfig, SurfaceHit, MASK_DAMAGE, MASK_VISUAL};
    use crate::core::id::EntityId;
    use crate::core::vec3::Vec3;

    fn player() -> EntityId {
        EntityId::new([1; 16])
    }

    fn enemy() -> EntityId {
        EntityId::new([2; 16])
    }

    /// A flat scene: optionally one wall and one damageable surface,
    /// both square to the aim ray.
    struct Scene {
        wall_distance: Option<f32>,
        enemy_distance: Option<f32>,
    }

    impl Scene {
        fn empty() -> Self {
            Self {
                wall_distance: None,
                enemy_distance: None,
            }
        }

        fn with_enemy(distance: f32) -> Self {
            Self {
                wall_distance: None,
                enemy_distance: Some(distance),
            }
        }

        fn hit(&self, distance: f32, entity: Option<EntityId>) -> SurfaceHit {
            SurfaceHit {
                point: Vec3::new(0.0, 0.0, distance),
                normal: -Vec3::FORWARD,
                distance,
                entity,
            }
        }
    }

    impl SpatialQuery for Scene {
        fn ray_cast(
            &self,
            origin: Vec3,
            _direction: Vec3,
            max_distance: f32,
            mask: u8,
        ) -> Option<SurfaceHit> {
            let mut best: Option<SurfaceHit> = None;
            if mask & MASK_VISUAL != 0 {
                if let Some(d) = self.wall_distance {
                    let d = d - origin.z;
                    if d >= 0.0 && d <= max_distance {
                        best = Some(self.hit(d, None));
                    }
                }
            }
            if mask & MASK_DAMAGE != 0 {
                if let Some(d) = self.enemy_distance {
                    let d = d - origin.z;
                    if d >= 0.0
                        && d <= max_distance
                        && best.as_ref().is_none_or(|b| d < b.distance)
                    {
                        best = Some(self.hit(d, Some(enemy())));
                    }
                }
            }
            best
        }

        fn sphere_cast(
            &self,
            origin: Vec3,
            _radius: f32,
            direction: Vec3,
            max_distance: f32,
            mask: u8,
        ) -> Option<SurfaceHit> {
            if mask & MASK_DAMAGE == 0 {
                return None;
            }
            let d = self.enemy_distance? - origin.z;
            if d >= 0.0 && d <= max_distance && direction.z > 0.0 {
                Some(self.hit(d, Some(enemy())))
            } else {
                None
            }
        }
    }

    fn aim() -> AimContext {
        AimContext {
            muzzle: Vec3::new(0.0, 0.0, 0.2),
            muzzle_forward: Vec3::FORWARD,
            camera: Vec3::ZERO,
            aim_origin: Vec3::ZERO,
            aim_direction: Vec3::FORWARD,
        }
    }

    fn ready_world(initial_ammo: &str) -> World {
        let config = CombatConfig {
            gun: GunConfig {
                initial_ammo: initial_ammo.to_string(),
                ..GunConfig::default()
            },
            ..CombatConfig::default()
        };
        let mut world = World::new(player(), config);
        world.start();
        let tick = world.tick;
        {
            let (gun, events) = world.gun_and_events();
            gun.on_raise_complete(tick, events);
        }
        world.take_events();
        world
    }

    fn idle_frames(world: &mut World, scene: &Scene, n: u32) -> Vec<CombatEvent> {
        let mut all = Vec::new();
        for _ in 0..n {
            all.extend(frame(world, &FrameInput::new(), &aim(), scene).events);
        }
        all
    }

    #[test]
    fn test_fire_spawns_and_travels_to_kill() {
        let mut world = ready_world("HI");
        world.add_damageable(HealthTrack::new(enemy(), "HI"));
        let scene = Scene::with_enemy(10.0);

        // Fire 'H': spawns, then contacts within the first few steps
        let result = frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, CombatEventData::ProjectileSpawned { letter: 'H', .. })));

        let events = idle_frames(&mut world, &scene, 8);
        assert!(events.iter().any(|e| matches!(
            e.data,
            CombatEventData::ProjectileHit { damaged: true, .. }
        )));
        assert_eq!(world.damageable(enemy()).unwrap().remaining(), 1);

        // Fire 'I': the kill
        frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        let events = idle_frames(&mut world, &scene, 8);
        assert!(events
            .iter()
            .any(|e| matches!(e.data, CombatEventData::EnemyKilled { total_kills: 1, .. })));

        // Deferred removal lands a few frames later
        let events = idle_frames(&mut world, &Scene::empty(), 10);
        assert!(events
            .iter()
            .any(|e| matches!(e.data, CombatEventData::EntityRemoved { .. })));
        assert!(world.damageable(enemy()).is_none());
    }

    #[test]
    fn test_instant_hit_skips_travel() {
        let mut world = ready_world("A");
        world.add_damageable(HealthTrack::new(enemy(), "A"));
        // Enemy right at the muzzle
        let scene = Scene::with_enemy(0.4);

        let result = frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        assert!(world.projectiles.is_empty(), "no traveling projectile");
        assert!(
            !result
                .events
                .iter()
                .any(|e| matches!(e.data, CombatEventData::ProjectileSpawned { .. })),
            "instant hits never spawn"
        );
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, CombatEventData::ProjectileHit { damaged: true, .. })));
    }

    #[test]
    fn test_mismatched_letter_hit_not_damaging() {
        let mut world = ready_world("Z");
        world.add_damageable(HealthTrack::new(enemy(), "HI"));
        let scene = Scene::with_enemy(10.0);

        frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        let events = idle_frames(&mut world, &scene, 8);
        assert!(events.iter().any(|e| matches!(
            e.data,
            CombatEventData::ProjectileHit { damaged: false, .. }
        )));
        assert_eq!(world.damageable(enemy()).unwrap().remaining(), 2);
    }

    #[test]
    fn test_projectile_expires_in_empty_scene() {
        let mut world = ready_world("A");
        let scene = Scene::empty();

        frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        assert_eq!(world.projectiles.len(), 1);

        // 100 units at ~1.67/step expires on the 61st step
        let events = idle_frames(&mut world, &scene, 61);
        assert!(events
            .iter()
            .any(|e| matches!(e.data, CombatEventData::ProjectileExpired { .. })));
        assert!(world.projectiles.is_empty());
    }

    #[test]
    fn test_reload_key_not_captured_as_ammo() {
        let mut world = ready_world("");
        let scene = Scene::empty();

        // 'R' starts the reload; the same frame's letters are not read
        let mut input = FrameInput::with_reload();
        input.press_letter('r');
        frame(&mut world, &input, &aim(), &scene);
        assert!(world.gun.is_reloading());
        assert!(world.gun.magazine().is_empty());

        // Subsequent frames load letters normally
        frame(&mut world, &FrameInput::with_letters("r"), &aim(), &scene);
        assert_eq!(world.gun.magazine().peek_next(), Some('R'));
    }

    #[test]
    fn test_same_frame_letter_and_confirm() {
        let mut world = ready_world("");
        let scene = Scene::empty();
        frame(&mut world, &FrameInput::with_reload(), &aim(), &scene);

        let mut input = FrameInput::with_confirm();
        input.press_letter('a');
        let result = frame(&mut world, &input, &aim(), &scene);

        // The letter loads, then the reload ends
        assert!(!world.gun.is_reloading());
        assert_eq!(world.gun.magazine().len(), 1);
        assert!(result
            .events
            .iter()
            .any(|e| e.data == CombatEventData::ReloadEnded));
    }

    #[test]
    fn test_reload_then_fire_round_trip() {
        let mut world = ready_world("");
        let scene = Scene::empty();

        // Dry fire first
        let result = frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        assert!(result
            .events
            .iter()
            .any(|e| e.data == CombatEventData::DryFire));

        frame(&mut world, &FrameInput::with_reload(), &aim(), &scene);
        frame(&mut world, &FrameInput::with_letters("hi"), &aim(), &scene);
        frame(&mut world, &FrameInput::with_confirm(), &aim(), &scene);

        let result = frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        assert!(result
            .events
            .iter()
            .any(|e| e.data == CombatEventData::Fired { letter: 'H', last_round: false }));
    }

    #[test]
    fn test_fire_ignored_while_reloading() {
        let mut world = ready_world("AB");
        let scene = Scene::empty();
        frame(&mut world, &FrameInput::with_reload(), &aim(), &scene);

        let result = frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        assert!(
            !result
                .events
                .iter()
                .any(|e| matches!(e.data, CombatEventData::Fired { .. })),
            "trigger is dead during a reload"
        );
        assert_eq!(world.gun.magazine().len(), 2);
    }

    #[test]
    fn test_escalation_fires_at_six_hundred_ticks() {
        let mut world = ready_world("");
        let scene = Scene::empty();

        let events = idle_frames(&mut world, &scene, 599);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e.data, CombatEventData::MusicChanged { .. })),
            "no mood change before the timer"
        );

        let result = frame(&mut world, &FrameInput::new(), &aim(), &scene);
        let music: Vec<_> = result
            .events
            .iter()
            .filter(|e| matches!(e.data, CombatEventData::MusicChanged { .. }))
            .collect();
        assert_eq!(music.len(), 2, "buildup plus queued loop at tick 600");
    }

    #[test]
    fn test_dead_player_input_ignored() {
        let mut world = ready_world("AB");
        world.add_damageable(HealthTrack::new(player(), "X"));
        let scene = Scene::empty();

        world.apply_damage(
            player(),
            &crate::combat::health::DamagePacket {
                instigator: enemy(),
                letter: 'X',
                force_letter_match: false,
            },
        );
        world.take_events();

        let result = frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        assert!(
            !result
                .events
                .iter()
                .any(|e| matches!(e.data, CombatEventData::Fired { .. })),
            "dead player cannot fire"
        );

        // The scheduled reload still lands
        let events = idle_frames(&mut world, &scene, 300);
        assert!(events.iter().any(|e| e.data == CombatEventData::LevelReload));
    }

    #[test]
    fn test_recent_damage_window_decays_via_frames() {
        let mut world = ready_world("H");
        world.add_damageable(HealthTrack::new(enemy(), "HI"));
        let scene = Scene::with_enemy(10.0);

        frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        idle_frames(&mut world, &scene, 8);
        assert_eq!(world.damageable(enemy()).unwrap().recently_damaged(), 1);

        // The 30-tick hold elapses during idle frames
        idle_frames(&mut world, &scene, 40);
        assert_eq!(world.damageable(enemy()).unwrap().recently_damaged(), 0);
    }

    #[test]
    fn test_gun_starts_raising_until_animation_completes() {
        let mut world = World::new(player(), CombatConfig::default());
        world.start();
        assert_eq!(world.gun.state(), GunState::Raising);

        let scene = Scene::empty();
        // Frames pass; the gun stays raising until the engine reports done
        let result = frame(&mut world, &FrameInput::with_fire(), &aim(), &scene);
        assert!(
            !result
                .events
                .iter()
                .any(|e| matches!(e.data, CombatEventData::Fired { .. })),
            "raising gun ignores the trigger"
        );

        let tick = world.tick;
        let (gun, events) = world.gun_and_events();
        gun.on_raise_complete(tick, events);
        assert_eq!(world.gun.state(), GunState::Up);
    }
}
