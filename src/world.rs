//! Snapshot and event types.
//!
//! The `Snapshot` struct is the read-only view the rendering/host layer
//! consumes each frame: entity rows, per-tick death events, transient chain
//! links, and wave state, serializable to JSON.

use crate::archetypes::{EmitterKind, EnemyKind, ProjectileKind};
use crate::emitters::EmitterId;
use serde::{Deserialize, Serialize};

/// One enemy row for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub id: u64,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub radius: f32,
    /// Transient flag bits (`entities::flags`).
    pub flags: u8,
    pub flash_timer: f32,
}

/// One projectile row for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub kind: ProjectileKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub pierce: u32,
}

/// One death-debris particle for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub life: f32,
}

/// One emitter for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterSnapshot {
    pub id: EmitterId,
    pub kind: EmitterKind,
    pub gx: i32,
    pub gy: i32,
    pub level: u8,
    pub aim_angle: f32,
}

/// How an enemy left the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathOutcome {
    /// Killed by damage; grants the reward exactly once.
    Killed { reward: u32 },
    /// Walked off the end of the path; costs the player health instead.
    ReachedEnd,
}

/// Emitted once per enemy removal, for gold/health/VFX bookkeeping in the
/// host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeathEvent {
    pub id: u64,
    pub kind: EnemyKind,
    pub outcome: DeathOutcome,
    pub x: f32,
    pub y: f32,
}

/// Transient chain-lightning link recorded for one tick, for VFX.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChainLink {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Complete per-frame view of the simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub enemies: Vec<EnemySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub particles: Vec<ParticleSnapshot>,
    pub emitters: Vec<EmitterSnapshot>,
    /// Deaths since the previous snapshot.
    pub deaths: Vec<DeathEvent>,
    /// Chain-lightning links fired this tick.
    pub chains: Vec<ChainLink>,
    pub wave: u32,
    pub wave_active: bool,
    /// Set on the tick a wave's last enemy left the field.
    pub wave_cleared: Option<u32>,
}

impl Snapshot {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let snapshot = Snapshot {
            tick: 7,
            time: 0.35,
            enemies: vec![EnemySnapshot {
                id: 3,
                kind: EnemyKind::Grunt,
                x: 10.0,
                y: 20.0,
                health: 25.0,
                max_health: 30.0,
                radius: 12.0,
                flags: 0,
                flash_timer: 0.0,
            }],
            deaths: vec![DeathEvent {
                id: 2,
                kind: EnemyKind::Runner,
                outcome: DeathOutcome::Killed { reward: 6 },
                x: 1.0,
                y: 2.0,
            }],
            ..Default::default()
        };

        let json = snapshot.to_json().unwrap();
        let restored: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.tick, 7);
        assert_eq!(restored.enemies.len(), 1);
        assert_eq!(
            restored.deaths[0].outcome,
            DeathOutcome::Killed { reward: 6 }
        );
    }
}
