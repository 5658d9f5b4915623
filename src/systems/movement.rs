//! Movement: knockback decay and path following for enemies, ballistic
//! flight for projectiles, gravity and decay for death particles.

use crate::config::SimConfig;
use crate::entities::{flags, EnemyStore, ParticleStore, ProjectileStore};
use crate::path::Path;

/// Knockback speed below which velocity is zeroed and path following
/// resumes.
pub const KNOCKBACK_REST_SPEED: f32 = 3.0;

/// Snap distance for waypoint arrival.
pub const WAYPOINT_EPSILON: f32 = 2.0;

/// Friction exponents are referenced to 60 Hz so decay is frame-rate
/// independent.
const FRICTION_REFERENCE_HZ: f32 = 60.0;

/// Downward acceleration on death particles.
pub const PARTICLE_GRAVITY: f32 = 380.0;

/// Per-60Hz-frame particle size retention.
pub const PARTICLE_SIZE_DECAY: f32 = 0.90;

/// Particles smaller than this are culled.
pub const PARTICLE_MIN_SIZE: f32 = 0.5;

/// Integrates enemies: knockback friction first, path following once the
/// knockback has decayed to rest. Enemies that run out of waypoints get the
/// `REACHED_END` flag and are ignored by every later system this tick.
pub fn update_enemies(enemies: &mut EnemyStore, path: &Path, dt: f32) {
    let decay_frames = dt * FRICTION_REFERENCE_HZ;
    for slot in 0..enemies.len() {
        if enemies.logically_dead(slot) {
            continue;
        }

        // Knockback decay, frame-rate independent.
        let f = enemies.friction[slot].powf(decay_frames);
        enemies.vx[slot] *= f;
        enemies.vy[slot] *= f;
        let speed_sq =
            enemies.vx[slot] * enemies.vx[slot] + enemies.vy[slot] * enemies.vy[slot];
        if speed_sq < KNOCKBACK_REST_SPEED * KNOCKBACK_REST_SPEED {
            enemies.vx[slot] = 0.0;
            enemies.vy[slot] = 0.0;
        } else {
            // Still being shoved; no path progress this tick.
            enemies.x[slot] += enemies.vx[slot] * dt;
            enemies.y[slot] += enemies.vy[slot] * dt;
            enemies.set_flag(slot, flags::NEEDS_REDRAW);
            continue;
        }

        let next = enemies.path_index[slot] as usize + 1;
        let Some((wx, wy)) = path.waypoint(next) else {
            enemies.set_flag(slot, flags::REACHED_END);
            continue;
        };

        let dx = wx - enemies.x[slot];
        let dy = wy - enemies.y[slot];
        let dist = (dx * dx + dy * dy).sqrt();
        let step = enemies.base_speed[slot] * enemies.speed_mult[slot] * dt;

        if dist <= WAYPOINT_EPSILON.max(step) {
            enemies.x[slot] = wx;
            enemies.y[slot] = wy;
            enemies.path_index[slot] = next as u32;
            if path.waypoint(next + 1).is_none() {
                enemies.set_flag(slot, flags::REACHED_END);
            }
        } else {
            enemies.x[slot] += dx / dist * step;
            enemies.y[slot] += dy / dist * step;
        }
        enemies.set_flag(slot, flags::NEEDS_REDRAW);
    }
}

/// Integrates projectiles and burns lifespan. Leaving the world (plus
/// margin) zeroes the lifespan so the cull pass removes it.
pub fn update_projectiles(projectiles: &mut ProjectileStore, config: &SimConfig, dt: f32) {
    for slot in 0..projectiles.len() {
        projectiles.x[slot] += projectiles.vx[slot] * dt;
        projectiles.y[slot] += projectiles.vy[slot] * dt;
        projectiles.lifespan[slot] -= dt;
        if config.out_of_bounds(projectiles.x[slot], projectiles.y[slot]) {
            projectiles.lifespan[slot] = 0.0;
        }
    }
}

/// Integrates death particles: gravity, drift, multiplicative size decay.
pub fn update_particles(particles: &mut ParticleStore, dt: f32) {
    let decay = PARTICLE_SIZE_DECAY.powf(dt * FRICTION_REFERENCE_HZ);
    for slot in 0..particles.len() {
        particles.vy[slot] += PARTICLE_GRAVITY * dt;
        particles.x[slot] += particles.vx[slot] * dt;
        particles.y[slot] += particles.vy[slot] * dt;
        particles.size[slot] *= decay;
        particles.life[slot] -= dt;
    }
}
