//! Status effects: slow re-application, damage-over-time, timer decay,
//! and slowing ground puddles.
//!
//! Slow is a continuously-reasserted effect. Every tick each enemy's speed
//! multiplier is reset to 1 and rebuilt as the minimum of all live slow
//! sources (direct-hit timer, containing puddles); a source that lapsed
//! since last tick simply stops contributing. A stale factor can never
//! outlive its source.

use crate::entities::{flags, EnemyStore, EntityId, IdAllocator};
use crate::spatial::{SpatialEntry, SpatialHash};

/// Slowing ground puddles left by chill impacts. Few and slow-changing, so
/// their spatial hash is maintained incrementally rather than rebuilt.
#[derive(Debug, Default)]
pub struct Puddles {
    pub id: Vec<EntityId>,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub radius: Vec<f32>,
    pub slow_factor: Vec<f32>,
    pub timer: Vec<f32>,
    slots: std::collections::HashMap<EntityId, usize>,
}

impl Puddles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn spawn(
        &mut self,
        ids: &mut IdAllocator,
        grid: &mut SpatialHash,
        x: f32,
        y: f32,
        radius: f32,
        slow_factor: f32,
        duration: f32,
    ) -> usize {
        let slot = self.len();
        let id = ids.alloc();
        self.id.push(id);
        self.x.push(x);
        self.y.push(y);
        self.radius.push(radius);
        self.slow_factor.push(slow_factor);
        self.timer.push(duration);
        let _ = self.slots.insert(id, slot);
        grid.insert(id, x, y);
        slot
    }

    fn swap_remove(&mut self, slot: usize, grid: &mut SpatialHash) {
        let last = self.len() - 1;
        let removed = self.id[slot];
        let _ = self.slots.remove(&removed);
        grid.remove(removed);
        if slot != last {
            let _ = self.slots.insert(self.id[last], slot);
        }
        self.id.swap_remove(slot);
        self.x.swap_remove(slot);
        self.y.swap_remove(slot);
        self.radius.swap_remove(slot);
        self.slow_factor.swap_remove(slot);
        self.timer.swap_remove(slot);
    }
}

/// Resets every enemy's speed multiplier to 1 and re-applies the minimum of
/// all currently-live slow sources. Runs before movement each tick.
pub fn refresh_slow_factors(
    enemies: &mut EnemyStore,
    puddles: &Puddles,
    puddle_grid: &SpatialHash,
    scratch: &mut Vec<SpatialEntry>,
) {
    for slot in 0..enemies.len() {
        let mut mult = 1.0f32;

        if enemies.slow_timer[slot] > 0.0 {
            mult = mult.min(enemies.slow_factor[slot]);
        }

        puddle_grid.query_near(enemies.x[slot], enemies.y[slot], scratch);
        for entry in scratch.iter() {
            let Some(p) = puddles.slot_of(entry.id) else {
                continue;
            };
            let dx = enemies.x[slot] - puddles.x[p];
            let dy = enemies.y[slot] - puddles.y[p];
            if dx * dx + dy * dy <= puddles.radius[p] * puddles.radius[p] {
                mult = mult.min(puddles.slow_factor[p]);
            }
        }

        enemies.speed_mult[slot] = mult;
        if mult < 1.0 {
            enemies.set_flag(slot, flags::SLOWED);
        } else {
            enemies.clear_flag(slot, flags::SLOWED);
        }
    }
}

/// Ticks damage-over-time and decays status timers. Runs after collision,
/// so a burn inflicted this tick takes its first damage slice immediately.
pub fn resolve(enemies: &mut EnemyStore, dt: f32) {
    for slot in 0..enemies.len() {
        if enemies.logically_dead(slot) {
            continue;
        }

        if enemies.dot_timer[slot] > 0.0 {
            enemies.health[slot] = (enemies.health[slot] - enemies.dot_dps[slot] * dt).max(0.0);
            enemies.set_flag(slot, flags::HEALTH_CHANGED | flags::NEEDS_REDRAW);
            enemies.dot_timer[slot] -= dt;
            if enemies.dot_timer[slot] <= 0.0 {
                enemies.dot_timer[slot] = 0.0;
                enemies.dot_dps[slot] = 0.0;
                enemies.clear_flag(slot, flags::ON_FIRE);
            }
        }

        if enemies.slow_timer[slot] > 0.0 {
            enemies.slow_timer[slot] = (enemies.slow_timer[slot] - dt).max(0.0);
        }
        if enemies.flash_timer[slot] > 0.0 {
            enemies.flash_timer[slot] = (enemies.flash_timer[slot] - dt).max(0.0);
        }
    }
}

/// Decays puddle timers and removes the expired, highest slot first.
pub fn expire_puddles(
    puddles: &mut Puddles,
    grid: &mut SpatialHash,
    dt: f32,
    batch: &mut Vec<usize>,
) {
    batch.clear();
    for slot in 0..puddles.len() {
        puddles.timer[slot] -= dt;
        if puddles.timer[slot] <= 0.0 {
            batch.push(slot);
        }
    }
    batch.sort_unstable_by(|a, b| b.cmp(a));
    for &slot in batch.iter() {
        puddles.swap_remove(slot, grid);
    }
    batch.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::EnemyKind;

    fn world_with_enemy(x: f32, y: f32) -> (EnemyStore, IdAllocator) {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(8);
        let _ = enemies.spawn(&mut ids, EnemyKind::Grunt, x, y, 1.0, 1.0, 0);
        (enemies, ids)
    }

    #[test]
    fn test_slow_is_reapplied_from_timer_each_tick() {
        let (mut enemies, _ids) = world_with_enemy(0.0, 0.0);
        enemies.slow_timer[0] = 1.0;
        enemies.slow_factor[0] = 0.4;

        let puddles = Puddles::new();
        let grid = SpatialHash::new(64.0);
        let mut scratch = Vec::new();

        refresh_slow_factors(&mut enemies, &puddles, &grid, &mut scratch);
        assert!((enemies.speed_mult[0] - 0.4).abs() < 1e-6);
        assert!(enemies.has_flag(0, flags::SLOWED));

        // Timer lapses; the next refresh restores full speed.
        enemies.slow_timer[0] = 0.0;
        refresh_slow_factors(&mut enemies, &puddles, &grid, &mut scratch);
        assert!((enemies.speed_mult[0] - 1.0).abs() < 1e-6);
        assert!(!enemies.has_flag(0, flags::SLOWED));
    }

    #[test]
    fn test_puddle_slows_only_while_inside() {
        let (mut enemies, mut ids) = world_with_enemy(0.0, 0.0);
        let mut puddles = Puddles::new();
        let mut grid = SpatialHash::new(64.0);
        let _ = puddles.spawn(&mut ids, &mut grid, 5.0, 0.0, 26.0, 0.45, 3.0);
        let mut scratch = Vec::new();

        refresh_slow_factors(&mut enemies, &puddles, &grid, &mut scratch);
        assert!((enemies.speed_mult[0] - 0.45).abs() < 1e-6);

        // Step out of the puddle: the factor resets, nothing lingers.
        enemies.x[0] = 200.0;
        refresh_slow_factors(&mut enemies, &puddles, &grid, &mut scratch);
        assert!((enemies.speed_mult[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_sources_take_the_minimum() {
        let (mut enemies, mut ids) = world_with_enemy(0.0, 0.0);
        enemies.slow_timer[0] = 1.0;
        enemies.slow_factor[0] = 0.6;
        let mut puddles = Puddles::new();
        let mut grid = SpatialHash::new(64.0);
        let _ = puddles.spawn(&mut ids, &mut grid, 0.0, 0.0, 26.0, 0.3, 3.0);
        let mut scratch = Vec::new();

        refresh_slow_factors(&mut enemies, &puddles, &grid, &mut scratch);
        assert!((enemies.speed_mult[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_dot_ticks_and_clears_on_fire() {
        let (mut enemies, _ids) = world_with_enemy(0.0, 0.0);
        enemies.dot_timer[0] = 0.5;
        enemies.dot_dps[0] = 8.0;
        enemies.set_flag(0, flags::ON_FIRE);
        let start = enemies.health[0];

        resolve(&mut enemies, 0.25);
        assert!((enemies.health[0] - (start - 2.0)).abs() < 1e-4);
        assert!(enemies.has_flag(0, flags::ON_FIRE));

        resolve(&mut enemies, 0.25);
        assert!(!enemies.has_flag(0, flags::ON_FIRE));
        assert_eq!(enemies.dot_dps[0], 0.0);
    }

    #[test]
    fn test_dot_never_takes_health_below_zero() {
        let (mut enemies, _ids) = world_with_enemy(0.0, 0.0);
        enemies.health[0] = 0.5;
        enemies.dot_timer[0] = 10.0;
        enemies.dot_dps[0] = 100.0;

        resolve(&mut enemies, 1.0);
        assert_eq!(enemies.health[0], 0.0);
    }

    #[test]
    fn test_expired_puddles_leave_the_grid() {
        let mut ids = IdAllocator::new();
        let mut puddles = Puddles::new();
        let mut grid = SpatialHash::new(64.0);
        let _ = puddles.spawn(&mut ids, &mut grid, 0.0, 0.0, 26.0, 0.45, 0.2);
        let _ = puddles.spawn(&mut ids, &mut grid, 10.0, 0.0, 26.0, 0.45, 5.0);

        let mut batch = Vec::new();
        expire_puddles(&mut puddles, &mut grid, 0.3, &mut batch);
        assert_eq!(puddles.len(), 1);
        assert_eq!(grid.len(), 1);
        assert!((puddles.x[0] - 10.0).abs() < 1e-6);
    }
}
