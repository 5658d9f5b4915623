//! Immutable per-kind configuration tables.
//!
//! Enemy, emitter, and projectile behavior differences are data, not
//! dispatch: each kind maps to a flat stats record, and projectile
//! specialties are a tagged union consumed by the collision system. The
//! tables are read-only during simulation.

use serde::{Deserialize, Serialize};

/// Enemy kinds spawnable by waves (and by splitter deaths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline walker.
    Grunt,
    /// Fast, fragile.
    Runner,
    /// Slow, heavy, hard to knock around.
    Brute,
    /// Splits into scaled-down grunts on death.
    Splitter,
}

/// Stats record for an enemy kind.
#[derive(Debug, Clone, Copy)]
pub struct EnemyArchetype {
    pub max_health: f32,
    /// Path-following speed, world units per second.
    pub speed: f32,
    /// Divides knockback impulses.
    pub mass: f32,
    /// Per-60Hz-frame knockback velocity retention, in (0, 1).
    pub friction: f32,
    /// Collision radius.
    pub radius: f32,
    /// Gold granted on kill.
    pub reward: u32,
    /// Death-split behavior, if any.
    pub split: Option<SplitSpec>,
}

/// What a splitter leaves behind.
#[derive(Debug, Clone, Copy)]
pub struct SplitSpec {
    pub count: u8,
    pub kind: EnemyKind,
    /// Health/radius scale applied to each child.
    pub scale: f32,
}

impl EnemyKind {
    /// Archetype lookup. Constant data, no allocation.
    pub const fn stats(self) -> EnemyArchetype {
        match self {
            EnemyKind::Grunt => EnemyArchetype {
                max_health: 30.0,
                speed: 55.0,
                mass: 1.0,
                friction: 0.88,
                radius: 12.0,
                reward: 8,
                split: None,
            },
            EnemyKind::Runner => EnemyArchetype {
                max_health: 16.0,
                speed: 95.0,
                mass: 0.7,
                friction: 0.82,
                radius: 9.0,
                reward: 6,
                split: None,
            },
            EnemyKind::Brute => EnemyArchetype {
                max_health: 140.0,
                speed: 30.0,
                mass: 2.6,
                friction: 0.93,
                radius: 18.0,
                reward: 25,
                split: None,
            },
            EnemyKind::Splitter => EnemyArchetype {
                max_health: 48.0,
                speed: 48.0,
                mass: 1.2,
                friction: 0.88,
                radius: 14.0,
                reward: 14,
                split: Some(SplitSpec {
                    count: 2,
                    kind: EnemyKind::Grunt,
                    scale: 0.5,
                }),
            },
        }
    }
}

/// Emitter (tower) kinds placeable by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmitterKind {
    /// Plain single-target bolt.
    Pulse,
    /// Ignites targets (damage over time).
    Ember,
    /// Chills targets and leaves slowing puddles.
    Frost,
    /// Chain lightning.
    Arc,
    /// Slow heavy shell with splash damage.
    Mortar,
}

/// Stats record for an emitter kind.
#[derive(Debug, Clone, Copy)]
pub struct EmitterArchetype {
    /// Targeting radius at level 1, world units.
    pub base_range: f32,
    /// Seconds between shots at a steady target.
    pub fire_interval: f32,
    /// What it shoots.
    pub projectile: ProjectileKind,
}

impl EmitterKind {
    pub const fn stats(self) -> EmitterArchetype {
        match self {
            EmitterKind::Pulse => EmitterArchetype {
                base_range: 150.0,
                fire_interval: 0.5,
                projectile: ProjectileKind::Bolt,
            },
            EmitterKind::Ember => EmitterArchetype {
                base_range: 130.0,
                fire_interval: 0.7,
                projectile: ProjectileKind::Ember,
            },
            EmitterKind::Frost => EmitterArchetype {
                base_range: 140.0,
                fire_interval: 0.9,
                projectile: ProjectileKind::Shard,
            },
            EmitterKind::Arc => EmitterArchetype {
                base_range: 170.0,
                fire_interval: 1.1,
                projectile: ProjectileKind::Spark,
            },
            EmitterKind::Mortar => EmitterArchetype {
                base_range: 200.0,
                fire_interval: 1.6,
                projectile: ProjectileKind::Shell,
            },
        }
    }
}

/// Highest reachable emitter upgrade level.
pub const MAX_EMITTER_LEVEL: u8 = 3;

/// Range multiplier at the given upgrade level (level 1 = 1.0).
pub fn range_multiplier(level: u8) -> f32 {
    1.0 + 0.15 * level.saturating_sub(1) as f32
}

/// Damage multiplier at the given upgrade level.
pub fn damage_multiplier(level: u8) -> f32 {
    1.0 + 0.25 * level.saturating_sub(1) as f32
}

/// Knockback multiplier at the given upgrade level.
pub fn knockback_multiplier(level: u8) -> f32 {
    1.0 + 0.2 * level.saturating_sub(1) as f32
}

/// Projectile kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    Bolt,
    Ember,
    Shard,
    Spark,
    Shell,
}

/// Stats record for a projectile kind.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileArchetype {
    /// Flight speed, world units per second.
    pub speed: f32,
    pub damage: f32,
    /// How many enemies it may damage before being removed.
    pub pierce: u32,
    /// Seconds of flight before it fizzles.
    pub lifespan: f32,
    /// Collision radius.
    pub radius: f32,
    /// Knockback impulse applied on non-killing hits.
    pub knockback: f32,
    pub effect: SpecialEffect,
}

/// Secondary effect applied on a non-killing hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecialEffect {
    None,
    /// Damage over time.
    Burn { dps: f32, duration: f32 },
    /// Slow on hit plus a slowing ground puddle at the impact point.
    Chill {
        /// Speed multiplier while slowed, in (0, 1).
        factor: f32,
        duration: f32,
        puddle_radius: f32,
        puddle_duration: f32,
    },
    /// Chain lightning hopping to nearby untouched enemies.
    Chain { count: u32, radius: f32 },
    /// Area damage with linear falloff around the impact.
    Splash { radius: f32 },
}

impl ProjectileKind {
    pub const fn stats(self) -> ProjectileArchetype {
        match self {
            ProjectileKind::Bolt => ProjectileArchetype {
                speed: 340.0,
                damage: 10.0,
                pierce: 1,
                lifespan: 1.6,
                radius: 4.0,
                knockback: 120.0,
                effect: SpecialEffect::None,
            },
            ProjectileKind::Ember => ProjectileArchetype {
                speed: 300.0,
                damage: 6.0,
                pierce: 1,
                lifespan: 1.4,
                radius: 5.0,
                knockback: 40.0,
                effect: SpecialEffect::Burn {
                    dps: 8.0,
                    duration: 2.5,
                },
            },
            ProjectileKind::Shard => ProjectileArchetype {
                speed: 320.0,
                damage: 7.0,
                pierce: 2,
                lifespan: 1.5,
                radius: 5.0,
                knockback: 60.0,
                effect: SpecialEffect::Chill {
                    factor: 0.45,
                    duration: 1.8,
                    puddle_radius: 26.0,
                    puddle_duration: 3.0,
                },
            },
            ProjectileKind::Spark => ProjectileArchetype {
                speed: 420.0,
                damage: 9.0,
                pierce: 1,
                lifespan: 1.2,
                radius: 4.0,
                knockback: 0.0,
                effect: SpecialEffect::Chain {
                    count: 3,
                    radius: 90.0,
                },
            },
            ProjectileKind::Shell => ProjectileArchetype {
                speed: 240.0,
                damage: 14.0,
                pierce: 1,
                lifespan: 2.2,
                radius: 6.0,
                knockback: 160.0,
                effect: SpecialEffect::Splash { radius: 70.0 },
            },
        }
    }
}
