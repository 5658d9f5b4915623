//! Spatial partitioning for efficient proximity queries.
//!
//! Uniform grid keyed by integer cell coordinates. Queries return raw
//! candidate lists — the query cell's neighborhood, not an exact-radius
//! filter — and callers apply their own distance test against live entity
//! positions. This keeps the hash a pure bucketing structure and lets
//! consumers test against current-tick coordinates even when the hash was
//! built at the end of the previous tick.
//!
//! The enemy hash is rebuilt once per tick; the puddle hash is maintained
//! incrementally with insert/remove because puddles mutate rarely.

use crate::entities::{EnemyStore, EntityId};
use std::collections::HashMap;

/// Candidate entry recorded at insert time. Positions are those at the
/// moment of insertion; exact tests use live store columns instead.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
}

/// Grid-based spatial hash.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Reverse lookup for incremental remove/update.
    entity_cells: HashMap<EntityId, (i32, i32)>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0);
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Convert world coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Drop every entry. Bucket capacity is retained so a rebuild in the
    /// following tick does not re-allocate.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.entity_cells.clear();
    }

    pub fn insert(&mut self, id: EntityId, x: f32, y: f32) {
        let cell = self.world_to_cell(x, y);
        if let Some(&old_cell) = self.entity_cells.get(&id) {
            if old_cell != cell {
                if let Some(bucket) = self.cells.get_mut(&old_cell) {
                    bucket.retain(|e| e.id != id);
                }
            } else {
                // Same cell: refresh the recorded position in place.
                if let Some(bucket) = self.cells.get_mut(&cell) {
                    if let Some(entry) = bucket.iter_mut().find(|e| e.id == id) {
                        entry.x = x;
                        entry.y = y;
                        return;
                    }
                }
            }
        }
        self.cells
            .entry(cell)
            .or_default()
            .push(SpatialEntry { id, x, y });
        let _ = self.entity_cells.insert(id, cell);
    }

    pub fn remove(&mut self, id: EntityId) {
        if let Some(cell) = self.entity_cells.remove(&id) {
            if let Some(bucket) = self.cells.get_mut(&cell) {
                bucket.retain(|e| e.id != id);
            }
        }
    }

    /// Move an entity; a no-op on the bucket map unless its cell changed.
    pub fn update(&mut self, id: EntityId, x: f32, y: f32) {
        self.insert(id, x, y);
    }

    pub fn len(&self) -> usize {
        self.entity_cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_cells.is_empty()
    }

    /// Fill `out` with candidates from the query point's cell and its 8
    /// neighbors. Unfiltered; valid for interaction radii up to one cell.
    pub fn query_near(&self, x: f32, y: f32, out: &mut Vec<SpatialEntry>) {
        out.clear();
        let (cx, cy) = self.world_to_cell(x, y);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    /// Fill `out` with candidates from every cell overlapping the given
    /// radius. Unfiltered, like `query_near`; use for radii that may exceed
    /// one cell (emitter ranges).
    pub fn query_radius(&self, x: f32, y: f32, radius: f32, out: &mut Vec<SpatialEntry>) {
        out.clear();
        let reach = (radius / self.cell_size).ceil() as i32;
        let (cx, cy) = self.world_to_cell(x, y);
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }
}

/// Rebuilds the enemy hash from the store. Logically dead rows are skipped
/// so next tick's queries never surface them.
pub fn rebuild_enemy_grid(grid: &mut SpatialHash, enemies: &EnemyStore) {
    grid.clear();
    for slot in 0..enemies.len() {
        if enemies.logically_dead(slot) {
            continue;
        }
        grid.insert(enemies.id[slot], enemies.x[slot], enemies.y[slot]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::EnemyKind;
    use crate::entities::IdAllocator;

    #[test]
    fn test_query_near_covers_neighbor_cells_only() {
        let mut grid = SpatialHash::new(10.0);
        grid.insert(EntityId(1), 5.0, 5.0);
        grid.insert(EntityId(2), 15.0, 5.0); // neighbor cell
        grid.insert(EntityId(3), 100.0, 100.0); // far away

        let mut out = Vec::new();
        grid.query_near(5.0, 5.0, &mut out);
        let ids: Vec<_> = out.iter().map(|e| e.id).collect();
        assert!(ids.contains(&EntityId(1)));
        assert!(ids.contains(&EntityId(2)));
        assert!(!ids.contains(&EntityId(3)));
    }

    #[test]
    fn test_query_radius_reaches_past_one_cell() {
        let mut grid = SpatialHash::new(10.0);
        grid.insert(EntityId(1), 0.0, 0.0);
        grid.insert(EntityId(2), 45.0, 0.0);

        let mut out = Vec::new();
        grid.query_near(0.0, 0.0, &mut out);
        assert_eq!(out.len(), 1);

        grid.query_radius(0.0, 0.0, 50.0, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_update_moves_between_cells() {
        let mut grid = SpatialHash::new(10.0);
        grid.insert(EntityId(7), 5.0, 5.0);
        grid.update(EntityId(7), 55.0, 5.0);

        let mut out = Vec::new();
        grid.query_near(5.0, 5.0, &mut out);
        assert!(out.iter().all(|e| e.id != EntityId(7)));
        grid.query_near(55.0, 5.0, &mut out);
        assert!(out.iter().any(|e| e.id == EntityId(7)));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_remove_clears_entity() {
        let mut grid = SpatialHash::new(10.0);
        grid.insert(EntityId(7), 5.0, 5.0);
        grid.remove(EntityId(7));
        assert!(grid.is_empty());
        let mut out = Vec::new();
        grid.query_near(5.0, 5.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_rebuild_skips_logically_dead() {
        let mut ids = IdAllocator::new();
        let mut enemies = EnemyStore::with_capacity(4);
        let alive = enemies.spawn(&mut ids, EnemyKind::Grunt, 10.0, 10.0, 1.0, 1.0, 0);
        let dead = enemies.spawn(&mut ids, EnemyKind::Grunt, 12.0, 10.0, 1.0, 1.0, 0);
        enemies.health[dead] = 0.0;

        let mut grid = SpatialHash::new(96.0);
        rebuild_enemy_grid(&mut grid, &enemies);
        assert_eq!(grid.len(), 1);
        let mut out = Vec::new();
        grid.query_near(10.0, 10.0, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, enemies.id[alive]);
    }
}
