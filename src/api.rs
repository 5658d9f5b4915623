//! Public API for the simulation.
//!
//! `SimWorld` owns every piece of mutable simulation state — stores, spatial
//! hashes, emitters, RNG — so multiple simulations coexist in one process
//! (the tests do exactly that). `step(dt)` runs one tick to completion in
//! the documented system order; there is no suspension and no cancellation.
//!
//! The host feeds in spawn/placement commands and per-frame `dt`, and reads
//! back snapshots plus per-tick death events. Gold, player health, and map
//! ownership stay on the host's side of the boundary.

use crate::archetypes::{EmitterKind, EnemyKind};
use crate::config::SimConfig;
use crate::emitters::{EmitterBank, EmitterError, EmitterId, PlacementError};
use crate::entities::{EnemyStore, EntityId, IdAllocator, ParticleStore, ProjectileStore};
use crate::path::Path;
use crate::spatial::{rebuild_enemy_grid, SpatialEntry, SpatialHash};
use crate::systems::damage::SplitRequest;
use crate::systems::{collision, damage, movement, status, targeting};
use crate::systems::{Puddles, SpawnEntry, SpawnQueue};
use crate::world::{
    ChainLink, DeathEvent, EmitterSnapshot, EnemySnapshot, ParticleSnapshot, ProjectileSnapshot,
    Snapshot,
};
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

#[cfg(feature = "profile")]
use crate::profiler::Profiler;

/// Times one pipeline stage when the `profile` feature is on.
macro_rules! stage {
    ($self:ident, $name:literal, $body:expr) => {{
        #[cfg(feature = "profile")]
        let start = std::time::Instant::now();
        $body;
        #[cfg(feature = "profile")]
        $self.profiler.record($name, start.elapsed());
    }};
}

/// The main simulation container.
pub struct SimWorld {
    config: SimConfig,
    rng: ChaCha8Rng,
    ids: IdAllocator,
    path: Path,

    enemies: EnemyStore,
    projectiles: ProjectileStore,
    particles: ParticleStore,
    emitters: EmitterBank,
    puddles: Puddles,

    enemy_grid: SpatialHash,
    puddle_grid: SpatialHash,

    spawn_queue: SpawnQueue,
    wave: u32,
    wave_active: bool,

    tick: u64,
    time: f32,

    /// Deaths since the last snapshot/drain.
    deaths: Vec<DeathEvent>,
    /// Chain links fired this tick (cleared at tick start).
    chains: Vec<ChainLink>,
    wave_cleared: Option<u32>,

    // Retained scratch buffers so the tick allocates nothing in steady
    // state.
    scratch: Vec<SpatialEntry>,
    effect_scratch: Vec<SpatialEntry>,
    visited: Vec<EntityId>,
    removal_batch: Vec<usize>,
    split_requests: Vec<SplitRequest>,

    #[cfg(feature = "profile")]
    profiler: Profiler,
}

impl SimWorld {
    /// Creates a world with default configuration and the given path.
    pub fn new(path: Path) -> Self {
        Self::with_config(SimConfig::default(), path)
    }

    /// Creates a world with explicit configuration.
    pub fn with_config(config: SimConfig, path: Path) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            ids: IdAllocator::new(),
            path,
            enemies: EnemyStore::with_capacity(config.enemy_capacity),
            projectiles: ProjectileStore::with_capacity(config.projectile_capacity),
            particles: ParticleStore::with_capacity(config.particle_capacity),
            emitters: EmitterBank::new(config.emitter_grid, config.emitter_cell_size),
            puddles: Puddles::new(),
            enemy_grid: SpatialHash::new(config.enemy_cell_size),
            puddle_grid: SpatialHash::new(config.puddle_cell_size),
            spawn_queue: SpawnQueue::new(config.spawn_queue_capacity),
            wave: 0,
            wave_active: false,
            tick: 0,
            time: 0.0,
            deaths: Vec::new(),
            chains: Vec::new(),
            wave_cleared: None,
            scratch: Vec::new(),
            effect_scratch: Vec::new(),
            visited: Vec::new(),
            removal_batch: Vec::new(),
            split_requests: Vec::new(),
            #[cfg(feature = "profile")]
            profiler: Profiler::new(),
            config,
        }
    }

    /// Advances the simulation by one tick of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.chains.clear();
        self.wave_cleared = None;

        if self.wave_active {
            let mult = self.config.wave_health_multiplier(self.wave);
            stage!(self, "spawning", {
                let _ = self.spawn_queue.run(
                    &mut self.enemies,
                    &mut self.ids,
                    &self.path,
                    mult,
                    dt,
                );
            });
        }

        stage!(
            self,
            "status",
            status::refresh_slow_factors(
                &mut self.enemies,
                &self.puddles,
                &self.puddle_grid,
                &mut self.scratch,
            )
        );

        stage!(self, "movement", {
            movement::update_enemies(&mut self.enemies, &self.path, dt);
            movement::update_projectiles(&mut self.projectiles, &self.config, dt);
            movement::update_particles(&mut self.particles, dt);
        });

        stage!(
            self,
            "targeting",
            targeting::acquire_and_fire(
                &mut self.emitters,
                &self.enemies,
                &self.enemy_grid,
                &self.path,
                &mut self.projectiles,
                &mut self.ids,
                dt,
                &mut self.scratch,
            )
        );

        stage!(
            self,
            "collision",
            collision::run(
                &mut self.projectiles,
                &mut self.enemies,
                &self.enemy_grid,
                &mut self.puddles,
                &mut self.puddle_grid,
                &mut self.ids,
                &mut self.chains,
                &mut self.scratch,
                &mut self.effect_scratch,
                &mut self.visited,
            )
        );

        stage!(self, "resolve", {
            status::resolve(&mut self.enemies, dt);
            status::expire_puddles(
                &mut self.puddles,
                &mut self.puddle_grid,
                dt,
                &mut self.removal_batch,
            );
        });

        stage!(self, "deaths", {
            damage::collect_deaths(
                &mut self.enemies,
                &mut self.particles,
                &mut self.ids,
                &mut self.rng,
                &self.config,
                &mut self.deaths,
                &mut self.removal_batch,
                &mut self.split_requests,
            );
            damage::cull_projectiles(&mut self.projectiles, &mut self.removal_batch);
            damage::cull_particles(&mut self.particles, &mut self.removal_batch);
        });

        stage!(
            self,
            "rebuild",
            rebuild_enemy_grid(&mut self.enemy_grid, &self.enemies)
        );

        if self.wave_active && self.spawn_queue.exhausted() && self.enemies.is_empty() {
            self.wave_active = false;
            self.wave_cleared = Some(self.wave);
            debug!("wave {} cleared", self.wave);
        }

        self.tick += 1;
        self.time += dt;
        #[cfg(feature = "profile")]
        self.profiler.end_tick();
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Starts a wave: its entries release over time at the path start.
    pub fn queue_wave(&mut self, wave: u32, entries: Vec<SpawnEntry>) {
        self.wave = wave;
        self.wave_active = true;
        self.spawn_queue.start_wave(entries);
        debug!("wave {} started", wave);
    }

    /// Spawns one enemy immediately at a world position. Enters the spatial
    /// hash at the end of this tick like any other spawn.
    pub fn spawn_enemy(&mut self, kind: EnemyKind, x: f32, y: f32, wave: u32, scale: f32) -> EntityId {
        let mult = self.config.wave_health_multiplier(wave);
        let slot = self
            .enemies
            .spawn(&mut self.ids, kind, x, y, mult, scale, 0);
        self.enemies.id[slot]
    }

    /// Places an emitter; `blocked` is the host map's unplaceable cell set.
    pub fn place_emitter(
        &mut self,
        kind: EmitterKind,
        gx: i32,
        gy: i32,
        blocked: &HashSet<(i32, i32)>,
    ) -> Result<EmitterId, PlacementError> {
        self.emitters.place(kind, gx, gy, blocked)
    }

    /// Raises an emitter's level. Returns the new level.
    pub fn upgrade_emitter(&mut self, id: EmitterId) -> Result<u8, EmitterError> {
        self.emitters.upgrade(id)
    }

    /// Removes an emitter and frees its cell.
    pub fn sell_emitter(&mut self, id: EmitterId) -> Result<(), EmitterError> {
        self.emitters.sell(id).map(|_| ())
    }

    // ------------------------------------------------------------------
    // Outputs
    // ------------------------------------------------------------------

    /// Captures a read-only snapshot for the renderer, draining pending
    /// death events and clearing render-facing flags.
    pub fn snapshot(&mut self) -> Snapshot {
        let enemies = (0..self.enemies.len())
            .map(|slot| EnemySnapshot {
                id: self.enemies.id[slot].0,
                kind: self.enemies.kind[slot],
                x: self.enemies.x[slot],
                y: self.enemies.y[slot],
                health: self.enemies.health[slot],
                max_health: self.enemies.max_health[slot],
                radius: self.enemies.radius[slot],
                flags: self.enemies.flags[slot],
                flash_timer: self.enemies.flash_timer[slot],
            })
            .collect();
        self.enemies.clear_render_flags();

        let projectiles = (0..self.projectiles.len())
            .map(|slot| ProjectileSnapshot {
                id: self.projectiles.id[slot].0,
                kind: self.projectiles.kind[slot],
                x: self.projectiles.x[slot],
                y: self.projectiles.y[slot],
                vx: self.projectiles.vx[slot],
                vy: self.projectiles.vy[slot],
                pierce: self.projectiles.pierce[slot],
            })
            .collect();

        let particles = (0..self.particles.len())
            .map(|slot| ParticleSnapshot {
                x: self.particles.x[slot],
                y: self.particles.y[slot],
                size: self.particles.size[slot],
                life: self.particles.life[slot],
            })
            .collect();

        let emitters = self
            .emitters
            .iter()
            .map(|e| EmitterSnapshot {
                id: e.id,
                kind: e.kind,
                gx: e.gx,
                gy: e.gy,
                level: e.level,
                aim_angle: e.aim_angle,
            })
            .collect();

        Snapshot {
            tick: self.tick,
            time: self.time,
            enemies,
            projectiles,
            particles,
            emitters,
            deaths: std::mem::take(&mut self.deaths),
            chains: self.chains.clone(),
            wave: self.wave,
            wave_active: self.wave_active,
            wave_cleared: self.wave_cleared.take(),
        }
    }

    /// Snapshot serialized to JSON.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".into())
    }

    /// Drains pending death events without building a full snapshot.
    pub fn drain_events(&mut self) -> Vec<DeathEvent> {
        std::mem::take(&mut self.deaths)
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn wave_active(&self) -> bool {
        self.wave_active
    }

    /// Set on the tick a wave's last enemy left the field; cleared by the
    /// next tick or snapshot.
    pub fn wave_cleared(&self) -> Option<u32> {
        self.wave_cleared
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn enemies(&self) -> &EnemyStore {
        &self.enemies
    }

    pub fn projectiles(&self) -> &ProjectileStore {
        &self.projectiles
    }

    pub fn emitters(&self) -> &EmitterBank {
        &self.emitters
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[cfg(feature = "profile")]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::DeathOutcome;

    fn corridor_path() -> Path {
        Path::new(vec![(100.0, 16.0), (100.0, 600.0)])
    }

    fn short_path() -> Path {
        Path::new(vec![(10.0, 10.0), (40.0, 10.0)])
    }

    #[test]
    fn test_new_world_is_empty() {
        let sim = SimWorld::new(corridor_path());
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.enemy_count(), 0);
        assert!(!sim.wave_active());
    }

    #[test]
    fn test_step_advances_tick_and_time() {
        let mut sim = SimWorld::new(corridor_path());
        sim.step(0.05);
        sim.step(0.05);
        assert_eq!(sim.current_tick(), 2);
        assert!((sim.current_time() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_walker_reaches_end_without_reward() {
        let mut sim = SimWorld::new(short_path());
        let id = sim.spawn_enemy(EnemyKind::Runner, 10.0, 10.0, 1, 1.0);

        for _ in 0..60 {
            sim.step(0.05);
        }
        assert_eq!(sim.enemy_count(), 0);

        let events = sim.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, id.0);
        assert_eq!(events[0].outcome, DeathOutcome::ReachedEnd);
    }

    #[test]
    fn test_emitter_kills_walker_and_rewards_once() {
        let mut sim = SimWorld::new(corridor_path());
        // Pulse tower beside the corridor; a grunt takes three 10-damage
        // bolts to die.
        let _ = sim
            .place_emitter(EmitterKind::Pulse, 2, 2, &HashSet::new())
            .unwrap();
        let id = sim.spawn_enemy(EnemyKind::Grunt, 100.0, 16.0, 1, 1.0);

        let mut events = Vec::new();
        for _ in 0..400 {
            sim.step(1.0 / 60.0);
            events.extend(sim.drain_events());
            if sim.enemy_count() == 0 {
                break;
            }
        }

        let kills: Vec<_> = events
            .iter()
            .filter(|e| e.id == id.0)
            .filter(|e| matches!(e.outcome, DeathOutcome::Killed { .. }))
            .collect();
        assert_eq!(kills.len(), 1, "exactly one kill event for the grunt");
        assert_eq!(
            kills[0].outcome,
            DeathOutcome::Killed {
                reward: EnemyKind::Grunt.stats().reward
            }
        );
        // Debris scattered on the kill tick.
        assert!(sim.particle_count() > 0);
    }

    #[test]
    fn test_fire_rate_catch_up_through_pipeline() {
        let mut sim = SimWorld::new(corridor_path());
        let id = sim
            .place_emitter(EmitterKind::Pulse, 0, 0, &HashSet::new())
            .unwrap();
        let _ = sim.spawn_enemy(EnemyKind::Brute, 100.0, 16.0, 1, 1.0);

        // First tick only builds the spatial hash (dt 0: nothing moves, no
        // time accumulates).
        sim.step(0.0);
        assert_eq!(sim.projectile_count(), 0);

        // One lagged tick: floor(1.2 / 0.5) = 2 shots, 0.2s banked.
        sim.step(1.2);
        assert_eq!(sim.projectile_count(), 2);
        let emitter = sim.emitters().get(id).unwrap();
        assert!((emitter.fire_accum - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_wave_cleared_after_last_walker_leaves() {
        let mut sim = SimWorld::new(short_path());
        sim.queue_wave(
            3,
            vec![
                SpawnEntry::new(EnemyKind::Runner, 0.0),
                SpawnEntry::new(EnemyKind::Runner, 0.1),
            ],
        );

        let mut cleared = None;
        for _ in 0..100 {
            sim.step(0.05);
            if let Some(wave) = sim.wave_cleared() {
                cleared = Some(wave);
                break;
            }
        }
        assert_eq!(cleared, Some(3));
        assert!(!sim.wave_active());
    }

    #[test]
    fn test_wave_health_multiplier_reaches_spawns() {
        let mut sim = SimWorld::new(corridor_path());
        sim.queue_wave(4, vec![SpawnEntry::new(EnemyKind::Grunt, 0.0)]);
        sim.step(0.05);

        assert_eq!(sim.enemy_count(), 1);
        let expected =
            EnemyKind::Grunt.stats().max_health * sim.config().wave_health_multiplier(4);
        assert!((sim.enemies().max_health[0] - expected).abs() < 1e-3);
    }

    #[test]
    fn test_snapshot_json_and_render_flag_clearing() {
        let mut sim = SimWorld::new(corridor_path());
        let _ = sim.spawn_enemy(EnemyKind::Grunt, 100.0, 16.0, 1, 1.0);
        sim.step(0.05);

        let json = sim.snapshot_json();
        assert!(json.contains("enemies"));
        assert!(json.contains("tick"));

        // The first snapshot saw NEEDS_REDRAW; flags are now clear until
        // something changes again.
        let snapshot = sim.snapshot();
        assert_eq!(
            snapshot.enemies[0].flags & crate::entities::flags::NEEDS_REDRAW,
            0
        );
    }

    #[test]
    fn test_chill_puddle_persists_and_slows_followers() {
        let mut sim = SimWorld::new(corridor_path());
        let _ = sim
            .place_emitter(EmitterKind::Frost, 2, 2, &HashSet::new())
            .unwrap();
        let _ = sim.spawn_enemy(EnemyKind::Brute, 100.0, 16.0, 1, 1.0);

        let mut slowed = false;
        for _ in 0..240 {
            sim.step(1.0 / 60.0);
            let enemies = sim.enemies();
            for slot in 0..enemies.len() {
                if enemies.speed_mult[slot] < 1.0 {
                    slowed = true;
                }
            }
            if slowed {
                break;
            }
        }
        assert!(slowed, "frost hits should slow the brute");
    }

    #[test]
    fn test_stress_1000_enemies() {
        use std::time::Instant;

        let mut sim = SimWorld::new(corridor_path());
        for i in 0..1000 {
            let _ = sim.spawn_enemy(
                EnemyKind::Grunt,
                60.0 + (i % 50) as f32 * 4.0,
                16.0 + (i / 50) as f32 * 8.0,
                1 + i as u32 / 100,
                1.0,
            );
        }
        for gx in 0..8 {
            let _ = sim.place_emitter(EmitterKind::Pulse, gx * 2, 4, &HashSet::new());
        }

        let start = Instant::now();
        for _ in 0..100 {
            sim.step(0.05);
        }
        let elapsed = start.elapsed();
        println!(
            "1000 enemies, 100 ticks in {:?} ({:.2} ms/tick)",
            elapsed,
            elapsed.as_millis() as f64 / 100.0
        );

        assert!(elapsed.as_secs() < 30, "simulation too slow: {elapsed:?}");
        assert_eq!(sim.current_tick(), 100);
    }

    #[test]
    fn test_stress_2000_mixed_entities() {
        use std::time::Instant;

        let mut sim = SimWorld::new(corridor_path());
        for i in 0..2000 {
            let kind = match i % 4 {
                0 => EnemyKind::Grunt,
                1 => EnemyKind::Runner,
                2 => EnemyKind::Brute,
                _ => EnemyKind::Splitter,
            };
            let _ = sim.spawn_enemy(
                kind,
                60.0 + (i % 64) as f32 * 4.0,
                16.0 + (i / 64) as f32 * 6.0,
                1,
                1.0,
            );
        }
        for gx in 0..10 {
            let kind = if gx % 2 == 0 {
                EmitterKind::Arc
            } else {
                EmitterKind::Mortar
            };
            let _ = sim.place_emitter(kind, gx * 3, 6, &HashSet::new());
        }

        let start = Instant::now();
        for _ in 0..50 {
            sim.step(0.05);
        }
        let elapsed = start.elapsed();
        println!(
            "2000 enemies, 50 ticks in {:?} ({:.2} ms/tick)",
            elapsed,
            elapsed.as_millis() as f64 / 50.0
        );

        assert!(elapsed.as_secs() < 60, "simulation too slow: {elapsed:?}");
    }
}
