//! Frame driver benchmark: a busy corridor with constant fire and reloads.

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use typefire::combat::health::HealthTrack;
use typefire::combat::projectile::AimContext;
use typefire::combat::tick::frame;
use typefire::combat::world::{CombatConfig, SpatialQuery, SurfaceHit, MASK_DAMAGE};
use typefire::{EntityId, FrameInput, Vec3, World};

struct Corridor {
    enemy: EntityId,
    enemy_z: f32,
}

impl SpatialQuery for Corridor {
    fn ray_cast(
        &self,
        origin: Vec3,
        _direction: Vec3,
        max_distance: f32,
        mask: u8,
    ) -> Option<SurfaceHit> {
        self.sphere_cast(origin, 0.0, _direction, max_distance, mask)
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
        let d = self.enemy_z - origin.z;
        (d >= 0.0 && d <= max_distance).then(|| SurfaceHit {
            point: Vec3::new(0.0, 0.0, self.enemy_z),
            normal: -Vec3::FORWARD,
            distance: d,
            entity: Some(self.enemy),
        })
    }
}

fn bench_frames(c: &mut Criterion) {
    let player = EntityId::new([1; 16]);
    let enemy = EntityId::new([2; 16]);
    let scene = Corridor {
        enemy,
        enemy_z: 30.0,
    };
    let aim = AimContext {
        muzzle: Vec3::new(0.0, -0.2, 0.4),
        muzzle_forward: Vec3::FORWARD,
        camera: Vec3::ZERO,
        aim_origin: Vec3::ZERO,
        aim_direction: Vec3::FORWARD,
    };

    c.bench_function("frame_600_ticks", |b| {
        b.iter(|| {
            let mut world = World::new(player, CombatConfig::default());
            let mut track = HealthTrack::new(enemy, "PNEUMONOULTRAMICROSCOPIC");
            track.ignore_letters = true;
            track.removal_delay_ticks = None;
            world.add_damageable(track);
            world.start();
            {
                let tick = world.tick;
                let (gun, events) = world.gun_and_events();
                gun.on_raise_complete(tick, events);
            }

            let mut rng = StdRng::seed_from_u64(7);
            let mut total = 0usize;
            for t in 0..600u32 {
                let input = match t % 8 {
                    0 => FrameInput::with_fire(),
                    3 if world.gun.magazine().is_empty() => FrameInput::with_reload(),
                    4 if world.gun.is_reloading() => {
                        let letter = (b'a' + rng.gen_range(0..26)) as char;
                        FrameInput::with_letters(&letter.to_string())
                    }
                    5 if world.gun.is_reloading() => FrameInput::with_confirm(),
                    _ => FrameInput::new(),
                };
                total += frame(&mut world, &input, &aim, &scene).events.len();
            }
            total
        });
    });
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
