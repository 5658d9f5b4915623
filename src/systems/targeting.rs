//! Targeting and firing.
//!
//! Each emitter scans spatial-hash candidates for the nearest live enemy in
//! range, banks elapsed time in a per-emitter accumulator, and converts it
//! into discrete shots. The accumulator is capped so a lag spike yields a
//! bounded catch-up burst, and idling with no target clamps it so a freshly
//! reacquired target is not greeted with a stored volley.
//!
//! Ties on distance go to the first candidate found; candidate order is
//! hash-map order, which is the documented non-determinism of this
//! pipeline.

use crate::archetypes::{damage_multiplier, knockback_multiplier, range_multiplier};
use crate::emitters::EmitterBank;
use crate::entities::{EnemyStore, IdAllocator, ProjectileStore};
use crate::path::Path;
use crate::spatial::{SpatialEntry, SpatialHash};

/// Most intervals' worth of time an accumulator may bank against a target.
const ACCUM_CAP_INTERVALS: f32 = 3.0;

/// Most intervals' worth retained while no target is in range.
const IDLE_CAP_INTERVALS: f32 = 1.0;

/// Fraction of full lead applied to predicted aim; slightly under-leads.
const LEAD_FACTOR: f32 = 0.8;

/// Runs acquisition and firing for every emitter.
pub fn acquire_and_fire(
    emitters: &mut EmitterBank,
    enemies: &EnemyStore,
    grid: &SpatialHash,
    path: &Path,
    projectiles: &mut ProjectileStore,
    ids: &mut IdAllocator,
    dt: f32,
    scratch: &mut Vec<SpatialEntry>,
) {
    for emitter in emitters.iter_mut() {
        let stats = emitter.kind.stats();
        let range = stats.base_range * range_multiplier(emitter.level);
        let interval = stats.fire_interval;

        grid.query_radius(emitter.x, emitter.y, range, scratch);
        let mut best: Option<(usize, f32)> = None;
        for entry in scratch.iter() {
            let Some(slot) = enemies.slot_of(entry.id) else {
                continue; // died since the hash was built
            };
            if enemies.logically_dead(slot) {
                continue;
            }
            let dx = enemies.x[slot] - emitter.x;
            let dy = enemies.y[slot] - emitter.y;
            let d_sq = dx * dx + dy * dy;
            if d_sq > range * range {
                continue;
            }
            if best.map_or(true, |(_, best_sq)| d_sq < best_sq) {
                best = Some((slot, d_sq));
            }
        }

        let Some((target, d_sq)) = best else {
            emitter.target = None;
            emitter.fire_accum = emitter.fire_accum.min(interval * IDLE_CAP_INTERVALS);
            continue;
        };

        emitter.target = Some(enemies.id[target]);
        emitter.fire_accum = (emitter.fire_accum + dt).min(interval * ACCUM_CAP_INTERVALS);
        let shots = (emitter.fire_accum / interval).floor() as u32;
        if shots == 0 {
            continue;
        }
        emitter.fire_accum -= shots as f32 * interval;

        let projectile = stats.projectile.stats();

        // Lead the target along its current path segment for the
        // projectile's time of flight.
        let mut aim_x = enemies.x[target];
        let mut aim_y = enemies.y[target];
        let time_of_flight = d_sq.sqrt() / projectile.speed;
        let next = enemies.path_index[target] as usize + 1;
        if let Some((wx, wy)) = path.waypoint(next) {
            let dx = wx - aim_x;
            let dy = wy - aim_y;
            let len = (dx * dx + dy * dy).sqrt();
            if len > 1e-4 {
                let target_speed = enemies.base_speed[target] * enemies.speed_mult[target];
                let lead = target_speed * time_of_flight * LEAD_FACTOR;
                aim_x += dx / len * lead;
                aim_y += dy / len * lead;
            }
        }

        let angle = (aim_y - emitter.y).atan2(aim_x - emitter.x);
        emitter.aim_angle = angle;
        let vx = angle.cos() * projectile.speed;
        let vy = angle.sin() * projectile.speed;
        let damage = projectile.damage * damage_multiplier(emitter.level);
        let knockback = projectile.knockback * knockback_multiplier(emitter.level);

        for _ in 0..shots {
            let _ = projectiles.spawn(
                ids,
                stats.projectile,
                emitter.x,
                emitter.y,
                vx,
                vy,
                damage,
                knockback,
            );
        }
    }
}
