//! Typefire Simulation Harness
//!
//! Runs a scripted encounter against a flat stub scene and logs the event
//! stream: equip, reload typing, letter fire, kills, and the mood switch.
//! Useful for eyeballing the combat core without an engine attached.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use typefire::combat::health::HealthTrack;
use typefire::combat::projectile::AimContext;
use typefire::combat::tick::frame;
use typefire::combat::world::{
    CombatConfig, SpatialQuery, SurfaceHit, MASK_DAMAGE, MASK_VISUAL,
};
use typefire::{CombatEvent, CombatEventData, EntityId, FrameInput, Vec3, World, TICK_RATE, VERSION};

/// A corridor: one far wall, plus each registered enemy as a flat
/// damageable surface square to the aim ray.
struct Corridor {
    wall_z: f32,
    enemies: Vec<(EntityId, f32)>,
}

impl Corridor {
    fn nearest_enemy(&self, origin_z: f32, max_distance: f32) -> Option<SurfaceHit> {
        self.enemies
            .iter()
            .map(|(id, z)| (*id, z - origin_z))
            .filter(|(_, d)| *d >= 0.0 && *d <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, d)| SurfaceHit {
                point: Vec3::new(0.0, 0.0, origin_z + d),
                normal: -Vec3::FORWARD,
                distance: d,
                entity: Some(id),
            })
    }
}

impl SpatialQuery for Corridor {
    fn ray_cast(
        &self,
        origin: Vec3,
        _direction: Vec3,
        max_distance: f32,
        mask: u8,
    ) -> Option<SurfaceHit> {
        let mut best: Option<SurfaceHit> = None;
        if mask & MASK_VISUAL != 0 {
            let d = self.wall_z - origin.z;
            if d >= 0.0 && d <= max_distance {
                best = Some(SurfaceHit {
                    point: Vec3::new(0.0, 0.0, self.wall_z),
                    normal: -Vec3::FORWARD,
                    distance: d,
                    entity: None,
                });
            }
        }
        if mask & MASK_DAMAGE != 0 {
            if let Some(hit) = self.nearest_enemy(origin.z, max_distance) {
                if best.as_ref().is_none_or(|b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        _radius: f32,
        _direction: Vec3,
        max_distance: f32,
        mask: u8,
    ) -> Option<SurfaceHit> {
        if mask & MASK_DAMAGE == 0 {
            return None;
        }
        self.nearest_enemy(origin.z, max_distance)
    }
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Typefire Core v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    demo_encounter()
}

/// Scripted encounter: equip, kill the near enemy letter by letter, reload
/// a fresh word, then idle until the mood escalates.
fn demo_encounter() -> Result<()> {
    info!("=== Starting Demo Encounter ===");

    let player = EntityId::new([1u8; 16]);
    let grunt = EntityId::new([2u8; 16]);
    let brute = EntityId::new([3u8; 16]);

    let mut world = World::new(player, CombatConfig::default());
    world.add_damageable(HealthTrack::new(grunt, "PUNT"));
    world.add_damageable(HealthTrack::new(brute, "CATOR"));
    info!("Player {} vs {} and {}", player.short(), grunt.short(), brute.short());

    let scene = Corridor {
        wall_z: 80.0,
        enemies: vec![(grunt, 12.0), (brute, 25.0)],
    };
    let aim = AimContext {
        muzzle: Vec3::new(0.0, -0.2, 0.4),
        muzzle_forward: Vec3::FORWARD,
        camera: Vec3::ZERO,
        aim_origin: Vec3::ZERO,
        aim_direction: Vec3::FORWARD,
    };

    world.start();
    // The equip animation completes on the engine side; report it done
    {
        let tick = world.tick;
        let (gun, events) = world.gun_and_events();
        gun.on_raise_complete(tick, events);
    }
    info!("Gun loaded: \"{}\"", world.gun.ammo_display().trim_end());

    // Script: fire a letter every 20 ticks, reload when empty, idle out
    // past the escalation timer.
    let mut total_events = 0usize;
    let mut reload_script: Vec<FrameInput> = Vec::new();

    for t in 0..900u32 {
        let mut input = FrameInput::new();
        if let Some(scripted) = reload_script.pop() {
            input = scripted;
        } else if t % 20 == 0 {
            if world.gun.magazine().is_empty() && !world.gun.is_reloading() {
                // Queue: start reload, type PUNT, confirm (popped in order)
                reload_script = vec![
                    FrameInput::with_confirm(),
                    FrameInput::with_letters("t"),
                    FrameInput::with_letters("n"),
                    FrameInput::with_letters("u"),
                    FrameInput::with_letters("p"),
                    FrameInput::with_reload(),
                ];
            } else {
                input = FrameInput::with_fire();
            }
        }

        let result = frame(&mut world, &input, &aim, &scene);
        total_events += result.events.len();
        report(&result.events);
    }

    info!("=== Encounter Results ===");
    info!("Kills: {}", world.kills());
    info!("Ammo: \"{}\"", world.gun.ammo_display());
    info!("Total events: {}", total_events);

    let remaining: Vec<String> = world
        .damageables()
        .map(|t| {
            let word: String = t.letters().iter().collect();
            format!("{} ({}/{})", word, t.remaining(), t.letters().len())
        })
        .collect();
    info!("Remaining tracks: {remaining:?}");

    // Dump the last world snapshot facts as JSON for downstream tooling
    let summary = serde_json::json!({
        "kills": world.kills(),
        "tick": world.tick,
        "director": format!("{:?}", world.director.state()),
        "events": total_events,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn report(events: &[CombatEvent]) {
    for event in events {
        match &event.data {
            CombatEventData::Fired { letter, last_round } => {
                info!(tick = event.tick, "fired '{}'{}", letter, if *last_round { " (last round)" } else { "" });
            }
            CombatEventData::Damage { entity, letter, remaining } => {
                info!(tick = event.tick, "{} took '{}' ({} left)", entity.short(), letter, remaining);
            }
            CombatEventData::EnemyKilled { entity, total_kills } => {
                info!(tick = event.tick, "{} killed (total {})", entity.short(), total_kills);
            }
            CombatEventData::ReloadStarted => info!(tick = event.tick, "reload started"),
            CombatEventData::ReloadEnded => info!(tick = event.tick, "reload ended"),
            CombatEventData::MusicChanged { theme, queued } => {
                info!(tick = event.tick, "music -> {:?} (queued: {})", theme, queued);
            }
            CombatEventData::DryFire => info!(tick = event.tick, "dry fire"),
            _ => {}
        }
    }
}
