//! Per-tick simulation systems.
//!
//! `SimWorld::step` runs these in a fixed order; no system reads another's
//! unresolved output except through the state it has already written:
//!
//! 1. `spawning` — release due wave entries into the enemy store.
//! 2. `status::refresh_slow_factors` — reset every slow multiplier to 1 and
//!    re-derive it from live sources (hit timers, puddles).
//! 3. `movement` — knockback decay + path following, projectile flight,
//!    particle physics.
//! 4. `targeting` — acquire nearest targets, convert accumulated time into
//!    shots, spawn projectiles with lead-predicted aim.
//! 5. `collision` — projectile/enemy hits, knockback, secondary effects
//!    (burn, chill + puddles, chain lightning, splash).
//! 6. `status::resolve` — damage-over-time ticking, timer decay, puddle
//!    expiry.
//! 7. `damage::collect_deaths` — killed / reached-end events, splitter
//!    cascades, debris scatter, batched swap-removal; projectile and
//!    particle culling.
//! 8. Enemy spatial hash rebuild for the next tick.

pub mod collision;
pub mod damage;
pub mod movement;
pub mod spawning;
pub mod status;
pub mod targeting;

pub use spawning::{SpawnEntry, SpawnQueue};
pub use status::Puddles;
