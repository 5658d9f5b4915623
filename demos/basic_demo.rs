//! Basic demonstration of the Nexus Defence simulation.
//!
//! Run with: cargo run --example basic_demo

use nexus_sim::{DeathOutcome, EmitterKind, EnemyKind, Path, SimWorld, SpawnEntry};
use std::collections::HashSet;

fn main() {
    env_logger::init();
    println!("=== Nexus Defence - Simulation Demo ===\n");

    // An L-shaped path across the default 1280x704 world.
    let path = Path::new(vec![
        (0.0, 96.0),
        (640.0, 96.0),
        (640.0, 480.0),
        (1280.0, 480.0),
    ]);
    let mut sim = SimWorld::new(path);

    // A small defense along the corridor.
    let blocked = HashSet::new();
    let pulse = sim.place_emitter(EmitterKind::Pulse, 8, 4, &blocked).unwrap();
    let _ = sim.place_emitter(EmitterKind::Frost, 14, 4, &blocked).unwrap();
    let _ = sim.place_emitter(EmitterKind::Arc, 20, 10, &blocked).unwrap();
    sim.upgrade_emitter(pulse).unwrap();

    // Wave 1: a trickle of grunts and runners with a splitter at the back.
    let mut entries: Vec<SpawnEntry> = (0..10)
        .map(|i| SpawnEntry::new(EnemyKind::Grunt, i as f32 * 0.8))
        .collect();
    entries.push(SpawnEntry::new(EnemyKind::Runner, 4.0));
    entries.push(SpawnEntry::new(EnemyKind::Runner, 4.5));
    entries.push(SpawnEntry::new(EnemyKind::Splitter, 9.0));
    sim.queue_wave(1, entries);

    println!("Running wave 1 at 60 Hz...\n");
    let mut gold = 0u32;
    let mut leaked = 0u32;
    for tick in 0..3600 {
        sim.step(1.0 / 60.0);

        for event in sim.drain_events() {
            match event.outcome {
                DeathOutcome::Killed { reward } => {
                    gold += reward;
                    println!(
                        "  t={:>5.2}s  kill: {:?} at ({:.0}, {:.0})  +{} gold",
                        sim.current_time(),
                        event.kind,
                        event.x,
                        event.y,
                        reward
                    );
                }
                DeathOutcome::ReachedEnd => {
                    leaked += 1;
                    println!(
                        "  t={:>5.2}s  LEAK: {:?} reached the nexus",
                        sim.current_time(),
                        event.kind
                    );
                }
            }
        }

        if (tick + 1) % 300 == 0 {
            println!(
                "--- t={:.1}s  enemies={} projectiles={} particles={} ---",
                sim.current_time(),
                sim.enemy_count(),
                sim.projectile_count(),
                sim.particle_count()
            );
        }

        if sim.wave_cleared().is_some() {
            println!("\nWave 1 cleared at t={:.2}s", sim.current_time());
            break;
        }
    }

    println!("\nGold earned: {gold}  Leaks: {leaked}");
    println!("\n=== Final State (JSON) ===\n");
    println!("{}", sim.snapshot().to_json_pretty().unwrap());
}
