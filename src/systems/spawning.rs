//! Wave spawn queue.
//!
//! The host queues a wave's worth of timed spawn entries; each tick the
//! queue releases the entries whose time has come at the path start. The
//! queue is bounded: entries past capacity are dropped with a warning
//! (documented policy, never a crash).

use crate::archetypes::EnemyKind;
use crate::entities::{EnemyStore, IdAllocator};
use crate::path::Path;
use log::{debug, warn};

/// One scheduled enemy spawn.
#[derive(Debug, Clone, Copy)]
pub struct SpawnEntry {
    pub kind: EnemyKind,
    /// Seconds after wave start.
    pub at: f32,
    /// Size/health scale, 1.0 for normal spawns.
    pub scale: f32,
}

impl SpawnEntry {
    pub fn new(kind: EnemyKind, at: f32) -> Self {
        Self {
            kind,
            at,
            scale: 1.0,
        }
    }
}

/// Timed release queue for the active wave.
#[derive(Debug)]
pub struct SpawnQueue {
    entries: Vec<SpawnEntry>,
    next: usize,
    elapsed: f32,
    capacity: usize,
}

impl SpawnQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            next: 0,
            elapsed: 0.0,
            capacity,
        }
    }

    /// Replaces the queue contents with a new wave's entries, sorted by
    /// release time. Overflow past capacity is dropped.
    pub fn start_wave(&mut self, mut entries: Vec<SpawnEntry>) {
        if entries.len() > self.capacity {
            warn!(
                "spawn queue over capacity, dropping {} entries",
                entries.len() - self.capacity
            );
            entries.truncate(self.capacity);
        }
        entries.sort_by(|a, b| a.at.total_cmp(&b.at));
        self.entries = entries;
        self.next = 0;
        self.elapsed = 0.0;
        debug!("wave queued with {} spawns", self.entries.len());
    }

    /// Entries not yet released.
    pub fn pending(&self) -> usize {
        self.entries.len() - self.next
    }

    /// Whether every queued entry has been released.
    pub fn exhausted(&self) -> bool {
        self.next >= self.entries.len()
    }

    /// Advances wave time and spawns every due entry at the path start.
    /// Returns the number of enemies spawned this tick.
    pub fn run(
        &mut self,
        enemies: &mut EnemyStore,
        ids: &mut IdAllocator,
        path: &Path,
        health_mult: f32,
        dt: f32,
    ) -> u32 {
        self.elapsed += dt;
        let (sx, sy) = path.start();
        let mut spawned = 0;
        while let Some(entry) = self.entries.get(self.next) {
            if entry.at > self.elapsed {
                break;
            }
            let _ = enemies.spawn(ids, entry.kind, sx, sy, health_mult, entry.scale, 0);
            self.next += 1;
            spawned += 1;
        }
        spawned
    }
}
