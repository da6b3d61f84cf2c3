//! Projectile Resolution
//!
//! Firing resolves in two phases. At spawn time the crosshair aim ray is
//! traced: an obstruction effectively at the muzzle is an instant hit,
//! resolved the same frame without ever creating a traveling entity.
//! Otherwise a projectile travels on the fixed step, sweeping both a
//! zero-radius ray (visual geometry) and a damage-radius sphere
//! (damageable volumes) along each step segment.
//!
//! The visual travel line starts at the muzzle; the authoritative trace
//! line starts at the camera so that what the crosshair covers is what
//! gets hit.

use serde::{Deserialize, Serialize};

use crate::combat::world::{SpatialQuery, SurfaceHit, MASK_DAMAGE, MASK_VISUAL};
use crate::core::id::EntityId;
use crate::core::vec3::Vec3;

/// Obstructions closer than this to the muzzle resolve at spawn time.
pub const INSTANT_HIT_TOLERANCE: f32 = 0.5;

/// Projectile tunables.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ProjectileSpec {
    /// Travel speed in units/second.
    pub speed: f32,
    /// Maximum travel distance before expiring.
    pub max_distance: f32,
    /// Radius of the damage sweep.
    pub damage_radius: f32,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            speed: 100.0,
            max_distance: 100.0,
            damage_radius: 1.0,
        }
    }
}

/// Everything the fire resolution needs to know about the shooter's pose.
/// Supplied by the engine each frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AimContext {
    /// Muzzle world position.
    pub muzzle: Vec3,
    /// Muzzle forward direction (normalized).
    pub muzzle_forward: Vec3,
    /// Camera world position.
    pub camera: Vec3,
    /// Crosshair aim ray origin.
    pub aim_origin: Vec3,
    /// Crosshair aim ray direction (normalized).
    pub aim_direction: Vec3,
}

/// Outcome of resolving a trigger pull.
#[derive(Debug)]
pub enum FireResolution {
    /// Obstruction at the muzzle: resolve damage now, skip travel entirely.
    InstantHit(SurfaceHit),
    /// Spawn a traveling projectile.
    Travel(Projectile),
}

/// Outcome of one fixed-step advance.
#[derive(Debug)]
pub enum StepOutcome {
    /// Still traveling.
    InFlight,
    /// Contacted a surface within this step's segment.
    Hit(SurfaceHit),
    /// Crossed max distance with no contact; destroy without resolving.
    Expired,
}

/// A letter in flight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projectile {
    /// Projectile id (monotonic counter).
    pub id: u32,
    /// The fired letter.
    pub letter: char,
    /// The entity that fired it.
    pub instigator: EntityId,
    /// Visual position (starts at the muzzle).
    pub position: Vec3,
    spec: ProjectileSpec,
    direction: Vec3,
    cast_position: Vec3,
    cast_direction: Vec3,
    traveled: f32,
}

/// Resolve a trigger pull into an instant hit or a traveling projectile.
///
/// The intended target point is the first obstruction along the aim ray
/// within max distance against the combined visual+damage mask, else a
/// point at max distance along the muzzle's forward direction.
pub fn resolve_fire<Q: SpatialQuery + ?Sized>(
    id: u32,
    letter: char,
    instigator: EntityId,
    aim: &AimContext,
    spec: &ProjectileSpec,
    query: &Q,
) -> FireResolution {
    let mut target = aim.muzzle + aim.muzzle_forward * spec.max_distance;
    if let Some(hit) = query.ray_cast(
        aim.aim_origin,
        aim.aim_direction,
        spec.max_distance,
        MASK_VISUAL | MASK_DAMAGE,
    ) {
        // Closer than the muzzle itself: count as an immediate hit
        if hit.distance < aim.muzzle.distance(aim.aim_origin) + INSTANT_HIT_TOLERANCE {
            return FireResolution::InstantHit(hit);
        }
        target = hit.point;
    }
    FireResolution::Travel(Projectile::spawn(id, letter, instigator, aim, target, *spec))
}

impl Projectile {
    fn spawn(
        id: u32,
        letter: char,
        instigator: EntityId,
        aim: &AimContext,
        target: Vec3,
        spec: ProjectileSpec,
    ) -> Self {
        Self {
            id,
            letter,
            instigator,
            position: aim.muzzle,
            direction: (target - aim.muzzle).normalize(),
            cast_position: aim.camera,
            cast_direction: (target - aim.camera).normalize(),
            spec,
            traveled: 0.0,
        }
    }

    /// Distance traveled so far along the trace line.
    pub fn traveled(&self) -> f32 {
        self.traveled
    }

    /// Advance one fixed step and sweep the step segment.
    ///
    /// Ray and sphere sweeps run independently; when both contact, the
    /// sphere wins only if it is closer after discounting its radius
    /// offset. The sweep is clamped to the in-range remainder of the
    /// travel budget, so the final partial step still hits targets up to
    /// max distance and expiry only happens when that sweep found nothing.
    pub fn step<Q: SpatialQuery + ?Sized>(&mut self, dt: f32, query: &Q) -> StepOutcome {
        let budget = self.spec.max_distance - self.traveled;
        if budget <= 0.0 {
            return StepOutcome::Expired;
        }
        let move_dist = self.spec.speed * dt;
        let sweep_dist = move_dist.min(budget);
        self.traveled += move_dist;

        let segment_start = self.cast_position;
        self.cast_position = segment_start + self.cast_direction * move_dist;
        self.position = self.position + self.direction * move_dist;

        let ray_hit = query.ray_cast(segment_start, self.cast_direction, sweep_dist, MASK_VISUAL);
        let sphere_hit = query.sphere_cast(
            segment_start,
            self.spec.damage_radius,
            self.cast_direction,
            sweep_dist,
            MASK_DAMAGE,
        );

        let hit = match (ray_hit, sphere_hit) {
            (Some(ray), Some(sphere)) => {
                if sphere.distance < ray.distance + self.spec.damage_radius {
                    Some(sphere)
                } else {
                    Some(ray)
                }
            }
            (hit, None) | (None, hit) => hit,
        };

        match hit {
            Some(hit) => StepOutcome::Hit(hit),
            None if self.traveled > self.spec.max_distance => StepOutcome::Expired,
            None => StepOutcome::InFlight,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
