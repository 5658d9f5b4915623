//! Damage application, secondary-hit propagation, and death collection.
//!
//! Collision and status systems funnel all health mutation through
//! `damage_enemy`; `collect_deaths` then turns zero-health and reached-end
//! rows into events, splitter cascades, and debris, removing everything in
//! one descending batch so no slot is invalidated while still pending.

use crate::archetypes::EnemyKind;
use crate::config::SimConfig;
use crate::entities::{flags, EnemyStore, EntityId, IdAllocator, ParticleStore, ProjectileStore};
use crate::spatial::{SpatialEntry, SpatialHash};
use crate::systems::movement::PARTICLE_MIN_SIZE;
use crate::world::{ChainLink, DeathEvent, DeathOutcome};
use rand::Rng;
use std::f32::consts::TAU;

/// Damage multiplier applied to every chain-lightning hop.
pub const CHAIN_DAMAGE_MULT: f32 = 0.6;

/// Seconds of hit-flash set by any damage.
const FLASH_DURATION: f32 = 0.15;

/// Offset of splitter children from the death position.
const SPLIT_RING_RADIUS: f32 = 12.0;

/// Applies raw damage (no resistance table) and reports whether this hit
/// killed. Health is floored at zero so it stays monotonic within a tick.
pub fn damage_enemy(enemies: &mut EnemyStore, slot: usize, amount: f32) -> bool {
    enemies.health[slot] = (enemies.health[slot] - amount).max(0.0);
    enemies.flash_timer[slot] = FLASH_DURATION;
    enemies.set_flag(slot, flags::HEALTH_CHANGED | flags::NEEDS_REDRAW);
    enemies.health[slot] <= 0.0
}

/// Chain lightning: hop to the nearest not-yet-chained enemy within
/// `radius` of the previous link, up to `count` hops, each dealing
/// `base_damage * CHAIN_DAMAGE_MULT`. Records one visual link per hop.
#[allow(clippy::too_many_arguments)]
pub fn chain_lightning(
    enemies: &mut EnemyStore,
    grid: &SpatialHash,
    start: usize,
    base_damage: f32,
    count: u32,
    radius: f32,
    visited: &mut Vec<EntityId>,
    links: &mut Vec<ChainLink>,
    scratch: &mut Vec<SpatialEntry>,
) {
    visited.clear();
    visited.push(enemies.id[start]);
    let mut from_x = enemies.x[start];
    let mut from_y = enemies.y[start];
    let hop_damage = base_damage * CHAIN_DAMAGE_MULT;

    for _ in 0..count {
        grid.query_radius(from_x, from_y, radius, scratch);
        let mut best: Option<(usize, f32)> = None;
        for entry in scratch.iter() {
            if visited.contains(&entry.id) {
                continue;
            }
            let Some(slot) = enemies.slot_of(entry.id) else {
                continue;
            };
            if enemies.logically_dead(slot) {
                continue;
            }
            let dx = enemies.x[slot] - from_x;
            let dy = enemies.y[slot] - from_y;
            let d_sq = dx * dx + dy * dy;
            if d_sq > radius * radius {
                continue;
            }
            if best.map_or(true, |(_, best_sq)| d_sq < best_sq) {
                best = Some((slot, d_sq));
            }
        }

        let Some((next, _)) = best else {
            break; // no further target ends the chain early
        };
        visited.push(enemies.id[next]);
        links.push(ChainLink {
            x1: from_x,
            y1: from_y,
            x2: enemies.x[next],
            y2: enemies.y[next],
        });
        let _ = damage_enemy(enemies, next, hop_damage);
        from_x = enemies.x[next];
        from_y = enemies.y[next];
    }
}

/// Splash: every live enemy within `radius` of the impact, other than the
/// directly-hit one, takes damage with linear falloff by distance.
pub fn splash(
    enemies: &mut EnemyStore,
    grid: &SpatialHash,
    x: f32,
    y: f32,
    radius: f32,
    damage: f32,
    exclude: EntityId,
    scratch: &mut Vec<SpatialEntry>,
) {
    grid.query_radius(x, y, radius, scratch);
    for entry in scratch.iter() {
        if entry.id == exclude {
            continue;
        }
        let Some(slot) = enemies.slot_of(entry.id) else {
            continue;
        };
        if enemies.logically_dead(slot) {
            continue;
        }
        let dx = enemies.x[slot] - x;
        let dy = enemies.y[slot] - y;
        let d_sq = dx * dx + dy * dy;
        if d_sq > radius * radius {
            continue;
        }
        let dist = d_sq.sqrt();
        let amount = damage * (1.0 - 0.5 * dist / radius);
        let _ = damage_enemy(enemies, slot, amount);
    }
}

/// A splitter child waiting to be spawned once removals are done.
#[derive(Debug, Clone, Copy)]
pub struct SplitRequest {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub path_index: u32,
}

/// Collects this tick's dead enemies into events, scatters debris, queues
/// splitter children, and removes the dead in one descending batch. Child
/// spawns run only after every removal so the batch's slots stay valid.
#[allow(clippy::too_many_arguments)]
pub fn collect_deaths(
    enemies: &mut EnemyStore,
    particles: &mut ParticleStore,
    ids: &mut IdAllocator,
    rng: &mut impl Rng,
    config: &SimConfig,
    events: &mut Vec<DeathEvent>,
    batch: &mut Vec<usize>,
    splits: &mut Vec<SplitRequest>,
) {
    batch.clear();
    splits.clear();

    for slot in 0..enemies.len() {
        if enemies.has_flag(slot, flags::REACHED_END) {
            events.push(DeathEvent {
                id: enemies.id[slot].0,
                kind: enemies.kind[slot],
                outcome: DeathOutcome::ReachedEnd,
                x: enemies.x[slot],
                y: enemies.y[slot],
            });
            batch.push(slot);
        } else if enemies.health[slot] <= 0.0 {
            let x = enemies.x[slot];
            let y = enemies.y[slot];
            events.push(DeathEvent {
                id: enemies.id[slot].0,
                kind: enemies.kind[slot],
                outcome: DeathOutcome::Killed {
                    reward: enemies.reward[slot],
                },
                x,
                y,
            });

            if let Some(split) = enemies.kind[slot].stats().split {
                for i in 0..split.count {
                    let angle =
                        i as f32 / split.count as f32 * TAU + rng.gen_range(-0.3..0.3f32);
                    splits.push(SplitRequest {
                        kind: split.kind,
                        x: x + angle.cos() * SPLIT_RING_RADIUS,
                        y: y + angle.sin() * SPLIT_RING_RADIUS,
                        scale: split.scale,
                        path_index: enemies.path_index[slot],
                    });
                }
            }

            for _ in 0..config.particles_per_death {
                let angle = rng.gen_range(0.0..TAU);
                let speed = rng.gen_range(40.0..140.0f32);
                let _ = particles.spawn(
                    ids,
                    x,
                    y,
                    angle.cos() * speed,
                    angle.sin() * speed - 60.0,
                    rng.gen_range(2.0..5.0f32),
                    rng.gen_range(0.4..0.9f32),
                );
            }

            batch.push(slot);
        }
    }

    enemies.remove_batch(batch);

    for split in splits.drain(..) {
        let _ = enemies.spawn(
            ids,
            split.kind,
            split.x,
            split.y,
            1.0,
            split.scale,
            split.path_index,
        );
    }
}

/// Removes projectiles whose pierce budget or lifespan is spent.
pub fn cull_projectiles(projectiles: &mut ProjectileStore, batch: &mut Vec<usize>) {
    batch.clear();
    for slot in 0..projectiles.len() {
        if projectiles.pierce[slot] == 0 || projectiles.lifespan[slot] <= 0.0 {
            batch.push(slot);
        }
    }
    projectiles.remove_batch(batch);
}

/// Removes particles that burned out or shrank below the visible floor.
pub fn cull_particles(particles: &mut ParticleStore, batch: &mut Vec<usize>) {
    batch.clear();
    for slot in 0..particles.len() {
        if particles.life[slot] <= 0.0 || particles.size[slot] < PARTICLE_MIN_SIZE {
            batch.push(slot);
        }
    }
    particles.remove_batch(batch);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::rebuild_enemy_grid;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_basic_kill_after_three_hits_rewards_once() {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(4);
        let slot = enemies.spawn(&mut ids, EnemyKind::Grunt, 10.0, 10.0, 1.0, 1.0, 0);

        assert!(!damage_enemy(&mut enemies, slot, 10.0));
        assert!(!damage_enemy(&mut enemies, slot, 10.0));
        assert!(damage_enemy(&mut enemies, slot, 10.0));

        let mut particles = ParticleStore::with_capacity(16);
        let mut events = Vec::new();
        let mut batch = Vec::new();
        let mut splits = Vec::new();
        collect_deaths(
            &mut enemies,
            &mut particles,
            &mut ids,
            &mut rng(),
            &SimConfig::default(),
            &mut events,
            &mut batch,
            &mut splits,
        );

        assert!(enemies.is_empty());
        let rewards: Vec<_> = events
            .iter()
            .filter_map(|e| match e.outcome {
                DeathOutcome::Killed { reward } => Some(reward),
                DeathOutcome::ReachedEnd => None,
            })
            .collect();
        assert_eq!(rewards, vec![EnemyKind::Grunt.stats().reward]);
        assert!(!particles.is_empty());
    }

    #[test]
    fn test_health_floors_at_zero() {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(4);
        let slot = enemies.spawn(&mut ids, EnemyKind::Runner, 0.0, 0.0, 1.0, 1.0, 0);
        assert!(damage_enemy(&mut enemies, slot, 1000.0));
        assert_eq!(enemies.health[slot], 0.0);
    }

    #[test]
    fn test_chain_hits_three_distinct_links_at_reduced_damage() {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(8);
        // A line of enemies 50 apart; chain radius is 90 so each hop can
        // only reach the next one or two.
        let a = enemies.spawn(&mut ids, EnemyKind::Brute, 0.0, 0.0, 1.0, 1.0, 0);
        let b = enemies.spawn(&mut ids, EnemyKind::Brute, 50.0, 0.0, 1.0, 1.0, 0);
        let c = enemies.spawn(&mut ids, EnemyKind::Brute, 100.0, 0.0, 1.0, 1.0, 0);
        let d = enemies.spawn(&mut ids, EnemyKind::Brute, 150.0, 0.0, 1.0, 1.0, 0);
        let e = enemies.spawn(&mut ids, EnemyKind::Brute, 400.0, 0.0, 1.0, 1.0, 0);
        let mut grid = SpatialHash::new(96.0);
        rebuild_enemy_grid(&mut grid, &enemies);

        let full = enemies.max_health[a];
        let mut visited = Vec::new();
        let mut links = Vec::new();
        let mut scratch = Vec::new();
        chain_lightning(
            &mut enemies,
            &grid,
            a,
            9.0,
            3,
            90.0,
            &mut visited,
            &mut links,
            &mut scratch,
        );

        assert_eq!(links.len(), 3);
        // The origin is never re-hit by its own chain.
        assert_eq!(enemies.health[a], full);
        for slot in [b, c, d] {
            assert!((enemies.health[slot] - (full - 9.0 * CHAIN_DAMAGE_MULT)).abs() < 1e-4);
        }
        // Far enemy out of chain reach.
        assert_eq!(enemies.health[e], full);
    }

    #[test]
    fn test_chain_stops_when_no_target_in_radius() {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(4);
        let a = enemies.spawn(&mut ids, EnemyKind::Brute, 0.0, 0.0, 1.0, 1.0, 0);
        let _b = enemies.spawn(&mut ids, EnemyKind::Brute, 60.0, 0.0, 1.0, 1.0, 0);
        let mut grid = SpatialHash::new(96.0);
        rebuild_enemy_grid(&mut grid, &enemies);

        let mut visited = Vec::new();
        let mut links = Vec::new();
        let mut scratch = Vec::new();
        chain_lightning(
            &mut enemies,
            &grid,
            a,
            9.0,
            3,
            90.0,
            &mut visited,
            &mut links,
            &mut scratch,
        );
        // Only one other enemy exists; the chain ends after one hop.
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_splash_falls_off_linearly_and_skips_direct_hit() {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(4);
        let hit = enemies.spawn(&mut ids, EnemyKind::Brute, 0.0, 0.0, 1.0, 1.0, 0);
        let near = enemies.spawn(&mut ids, EnemyKind::Brute, 35.0, 0.0, 1.0, 1.0, 0);
        let outside = enemies.spawn(&mut ids, EnemyKind::Brute, 200.0, 0.0, 1.0, 1.0, 0);
        let mut grid = SpatialHash::new(96.0);
        rebuild_enemy_grid(&mut grid, &enemies);

        let full = enemies.max_health[hit];
        let hit_id = enemies.id[hit];
        let mut scratch = Vec::new();
        splash(
            &mut enemies, &grid, 0.0, 0.0, 70.0, 14.0, hit_id, &mut scratch,
        );

        assert_eq!(enemies.health[hit], full);
        let expected = 14.0 * (1.0 - 0.5 * 35.0 / 70.0);
        assert!((enemies.health[near] - (full - expected)).abs() < 1e-3);
        assert_eq!(enemies.health[outside], full);
    }

    #[test]
    fn test_splitter_death_spawns_two_children_one_reward() {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(8);
        let slot = enemies.spawn(&mut ids, EnemyKind::Splitter, 80.0, 80.0, 1.0, 1.0, 4);
        let _ = damage_enemy(&mut enemies, slot, 1000.0);

        let mut particles = ParticleStore::with_capacity(16);
        let mut events = Vec::new();
        let mut batch = Vec::new();
        let mut splits = Vec::new();
        collect_deaths(
            &mut enemies,
            &mut particles,
            &mut ids,
            &mut rng(),
            &SimConfig::default(),
            &mut events,
            &mut batch,
            &mut splits,
        );

        assert_eq!(enemies.len(), 2);
        let grunt = EnemyKind::Grunt.stats();
        for child in 0..2 {
            assert_eq!(enemies.kind[child], EnemyKind::Grunt);
            assert!((enemies.max_health[child] - grunt.max_health * 0.5).abs() < 1e-4);
            // Children pick up the path where the parent died.
            assert_eq!(enemies.path_index[child], 4);
            let dx = enemies.x[child] - 80.0;
            let dy = enemies.y[child] - 80.0;
            assert!((dx * dx + dy * dy).sqrt() <= SPLIT_RING_RADIUS + 1e-3);
        }

        let rewards: u32 = events
            .iter()
            .map(|e| match e.outcome {
                DeathOutcome::Killed { reward } => reward,
                DeathOutcome::ReachedEnd => 0,
            })
            .sum();
        assert_eq!(rewards, EnemyKind::Splitter.stats().reward);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_reached_end_grants_no_reward() {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(4);
        let slot = enemies.spawn(&mut ids, EnemyKind::Grunt, 0.0, 0.0, 1.0, 1.0, 0);
        enemies.set_flag(slot, flags::REACHED_END);

        let mut particles = ParticleStore::with_capacity(4);
        let mut events = Vec::new();
        let mut batch = Vec::new();
        let mut splits = Vec::new();
        collect_deaths(
            &mut enemies,
            &mut particles,
            &mut ids,
            &mut rng(),
            &SimConfig::default(),
            &mut events,
            &mut batch,
            &mut splits,
        );

        assert!(enemies.is_empty());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, DeathOutcome::ReachedEnd);
        // No debris for walkers that leave alive.
        assert!(particles.is_empty());
    }

    #[test]
    fn test_cull_projectiles_on_spent_pierce_or_lifespan() {
        let mut ids = IdAllocator::new();
        let mut projectiles = ProjectileStore::with_capacity(4);
        use crate::archetypes::ProjectileKind;
        let spent = projectiles.spawn(&mut ids, ProjectileKind::Bolt, 0.0, 0.0, 1.0, 0.0, 10.0, 0.0);
        projectiles.pierce[spent] = 0;
        let expired =
            projectiles.spawn(&mut ids, ProjectileKind::Bolt, 0.0, 0.0, 1.0, 0.0, 10.0, 0.0);
        projectiles.lifespan[expired] = 0.0;
        let live = projectiles.spawn(&mut ids, ProjectileKind::Bolt, 5.0, 0.0, 1.0, 0.0, 10.0, 0.0);
        let live_id = projectiles.id[live];

        let mut batch = Vec::new();
        cull_projectiles(&mut projectiles, &mut batch);
        assert_eq!(projectiles.len(), 1);
        assert_eq!(projectiles.id[0], live_id);
    }
}
