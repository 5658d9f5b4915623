//! Nexus Defence - Simulation Core
//!
//! A data-oriented, frame-stepped simulation for a 2D tower-defense game:
//! enemies follow a fixed waypoint path toward the nexus, player-placed
//! emitters acquire and fire at them through a spatial hash, and projectiles
//! carry damage plus status effects (burn, chill + puddles, knockback, chain
//! lightning, splash).
//!
//! Entities live in structure-of-arrays stores with swap-remove slot
//! management and stable ids, sized for thousands of entities per tick with
//! no steady-state allocation. Rendering, input, and game-loop glue are the
//! host's job; the boundary is commands in, snapshots and events out.

pub mod api;
pub mod archetypes;
pub mod config;
pub mod emitters;
pub mod entities;
pub mod path;
pub mod profiler;
pub mod spatial;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use archetypes::{EmitterKind, EnemyKind, ProjectileKind, SpecialEffect};
pub use config::SimConfig;
pub use emitters::{EmitterError, EmitterId, PlacementError};
pub use entities::EntityId;
pub use path::Path;
pub use profiler::Profiler;
pub use spatial::{SpatialEntry, SpatialHash};
pub use systems::{SpawnEntry, SpawnQueue};
pub use world::{ChainLink, DeathEvent, DeathOutcome, Snapshot};
