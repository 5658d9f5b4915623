//! Projectile/enemy collision.
//!
//! Each live projectile tests spatial-hash candidates at its position with
//! an exact circle test against live coordinates. A projectile damages any
//! given enemy at most once in its lifetime (per-projectile hit list keyed
//! by id, so the guarantee survives removals and multiple ticks in the same
//! cell). Hits that do not kill apply knockback and the projectile kind's
//! secondary effect; a killing hit applies neither — the kill steals the
//! status.

use crate::archetypes::SpecialEffect;
use crate::entities::{flags, EnemyStore, EntityId, IdAllocator, ProjectileStore};
use crate::spatial::{SpatialEntry, SpatialHash};
use crate::systems::damage;
use crate::systems::status::Puddles;
use crate::world::ChainLink;

/// Fixed slack added to the combined radii in the hit test.
const HIT_BUFFER: f32 = 2.0;

/// Runs collision for every live projectile.
#[allow(clippy::too_many_arguments)]
pub fn run(
    projectiles: &mut ProjectileStore,
    enemies: &mut EnemyStore,
    grid: &SpatialHash,
    puddles: &mut Puddles,
    puddle_grid: &mut SpatialHash,
    ids: &mut IdAllocator,
    links: &mut Vec<ChainLink>,
    scratch: &mut Vec<SpatialEntry>,
    effect_scratch: &mut Vec<SpatialEntry>,
    visited: &mut Vec<EntityId>,
) {
    for p in 0..projectiles.len() {
        if projectiles.pierce[p] == 0 || projectiles.lifespan[p] <= 0.0 {
            continue; // logically dead, culled later this tick
        }
        let px = projectiles.x[p];
        let py = projectiles.y[p];
        grid.query_near(px, py, scratch);

        for entry_index in 0..scratch.len() {
            if projectiles.pierce[p] == 0 {
                break;
            }
            let entry = scratch[entry_index];
            let Some(e) = enemies.slot_of(entry.id) else {
                continue; // removed since the hash was built
            };
            if enemies.logically_dead(e) {
                continue;
            }
            if projectiles.has_hit(p, entry.id) {
                continue;
            }

            let dx = enemies.x[e] - px;
            let dy = enemies.y[e] - py;
            let reach = enemies.radius[e] + projectiles.radius[p] + HIT_BUFFER;
            if dx * dx + dy * dy > reach * reach {
                continue;
            }

            projectiles.record_hit(p, entry.id);
            let killed = damage::damage_enemy(enemies, e, projectiles.damage[p]);

            if !killed {
                apply_knockback(projectiles, p, enemies, e);
                match projectiles.kind[p].stats().effect {
                    SpecialEffect::None => {}
                    SpecialEffect::Burn { dps, duration } => {
                        enemies.dot_dps[e] = dps;
                        enemies.dot_timer[e] = duration;
                        enemies.set_flag(e, flags::ON_FIRE | flags::NEEDS_REDRAW);
                    }
                    SpecialEffect::Chill {
                        factor,
                        duration,
                        puddle_radius,
                        puddle_duration,
                    } => {
                        enemies.slow_factor[e] = factor;
                        enemies.slow_timer[e] = duration;
                        let _ = puddles.spawn(
                            ids,
                            puddle_grid,
                            px,
                            py,
                            puddle_radius,
                            factor,
                            puddle_duration,
                        );
                    }
                    SpecialEffect::Chain { count, radius } => {
                        damage::chain_lightning(
                            enemies,
                            grid,
                            e,
                            projectiles.damage[p],
                            count,
                            radius,
                            visited,
                            links,
                            effect_scratch,
                        );
                    }
                    SpecialEffect::Splash { radius } => {
                        damage::splash(
                            enemies,
                            grid,
                            px,
                            py,
                            radius,
                            projectiles.damage[p],
                            entry.id,
                            effect_scratch,
                        );
                    }
                }
            }

            projectiles.pierce[p] -= 1;
        }
    }
}

/// Shoves the enemy along the projectile's travel direction, scaled by the
/// projectile's knockback and divided by the enemy's mass.
fn apply_knockback(projectiles: &ProjectileStore, p: usize, enemies: &mut EnemyStore, e: usize) {
    let force = projectiles.knockback[p];
    if force <= 0.0 {
        return;
    }
    let vx = projectiles.vx[p];
    let vy = projectiles.vy[p];
    let len = (vx * vx + vy * vy).sqrt();
    if len < 1e-4 {
        return;
    }
    let impulse = force / enemies.mass[e];
    enemies.vx[e] += vx / len * impulse;
    enemies.vy[e] += vy / len * impulse;
}
