//! Simulation configuration resource.

use serde::{Deserialize, Serialize};

/// Tuning knobs for a simulation instance.
///
/// Everything the simulation needs to know about the world it runs in lives
/// here, so tests can build small deterministic worlds and the host can size
/// the real one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// World-space bounds: anything outside (plus `bounds_margin`) is gone.
    pub world_min: (f32, f32),
    /// Upper-right corner of the world.
    pub world_max: (f32, f32),
    /// Margin outside the bounds before projectiles are culled.
    pub bounds_margin: f32,
    /// Cell size of the enemy spatial hash, in world units.
    /// Chosen near the typical hit radius so `query_near` candidate lists
    /// stay small; emitter-range queries use the radius-aware query instead.
    pub enemy_cell_size: f32,
    /// Cell size of the (incrementally maintained) puddle hash.
    pub puddle_cell_size: f32,
    /// Side length of one emitter grid cell, in world units.
    pub emitter_cell_size: f32,
    /// Emitter grid dimensions in cells.
    pub emitter_grid: (i32, i32),
    /// Initial row capacity of the enemy store. Stores grow past this
    /// amortized; growth keeps slot indices valid.
    pub enemy_capacity: usize,
    /// Initial row capacity of the projectile store.
    pub projectile_capacity: usize,
    /// Initial row capacity of the death-particle store.
    pub particle_capacity: usize,
    /// Maximum queued-but-unspawned enemies; pushes past this are dropped
    /// with a warning rather than growing without bound.
    pub spawn_queue_capacity: usize,
    /// Seed for the simulation's RNG. Same seed, same gameplay jitter.
    pub rng_seed: u64,
    /// Per-wave compound health growth: wave `n` enemies spawn with
    /// `(1 + growth)^(n-1)` times their archetype health.
    pub wave_health_growth: f32,
    /// Debris particles scattered per enemy death.
    pub particles_per_death: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_min: (0.0, 0.0),
            world_max: (1280.0, 704.0),
            bounds_margin: 32.0,
            enemy_cell_size: 96.0,
            puddle_cell_size: 64.0,
            emitter_cell_size: 32.0,
            emitter_grid: (40, 22),
            enemy_capacity: 2048,
            projectile_capacity: 1024,
            particle_capacity: 1024,
            spawn_queue_capacity: 4096,
            rng_seed: 0x5eed,
            wave_health_growth: 0.12,
            particles_per_death: 6,
        }
    }
}

impl SimConfig {
    /// Health multiplier applied to enemies spawned during the given wave.
    pub fn wave_health_multiplier(&self, wave: u32) -> f32 {
        (1.0 + self.wave_health_growth).powi(wave.saturating_sub(1) as i32)
    }

    /// Whether a point is outside the world bounds plus the cull margin.
    pub fn out_of_bounds(&self, x: f32, y: f32) -> bool {
        let m = self.bounds_margin;
        x < self.world_min.0 - m
            || y < self.world_min.1 - m
            || x > self.world_max.0 + m
            || y > self.world_max.1 + m
    }
}
