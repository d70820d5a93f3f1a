//! Headless runner
//!
//! Drives a run to completion from the command line, standing in for a
//! rendering host. Usage:
//!
//! ```text
//! clash-arena [population-per-kind] [eliminate|convert] [seed] [--json]
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use clash_arena::{Arena, Engine, OutcomeMode, RunConfig, RunPhase};

/// Safety cap so a degenerate run (e.g. two survivors that never meet)
/// cannot spin forever
const MAX_TICKS: u64 = 500_000;

const LOG_EVERY: u64 = 600;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let mut positional = args.iter().filter(|a| !a.starts_with("--"));

    let population = positional
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let mode = match positional.next().map(String::as_str) {
        Some("convert") => OutcomeMode::Convert,
        _ => OutcomeMode::Eliminate,
    };
    let seed = positional
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });

    let config = RunConfig {
        population_per_kind: population,
        mode,
        favored: None,
    };
    let arena = Arena::new(800.0, 400.0);

    let mut engine = match Engine::start(&config, arena, seed) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let mut snapshot = engine.snapshot();
    while engine.phase() == RunPhase::Running && snapshot.tick < MAX_TICKS {
        snapshot = engine.tick();
        if snapshot.tick % LOG_EVERY == 0 {
            log::info!(
                "tick {}: rock {} / paper {} / scissors {}",
                snapshot.tick,
                snapshot.counts.get(clash_arena::EntityKind::Rock),
                snapshot.counts.get(clash_arena::EntityKind::Paper),
                snapshot.counts.get(clash_arena::EntityKind::Scissors),
            );
        }
    }

    match snapshot.phase {
        RunPhase::Ended(Some(winner)) => {
            println!(
                "{} conquered the arena after {} ticks ({} alive)",
                winner.as_str(),
                snapshot.tick,
                snapshot.counts.total()
            );
        }
        RunPhase::Ended(None) => {
            println!("total elimination after {} ticks: draw", snapshot.tick);
        }
        _ => {
            println!("no verdict within {MAX_TICKS} ticks, stopping");
            engine.stop();
        }
    }

    if json {
        let out = serde_json::to_string_pretty(&snapshot).expect("snapshot serializes");
        println!("{out}");
    }
}
