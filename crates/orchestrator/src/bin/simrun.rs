//! Headless simulation driver.
//!
//! Loads a JSON configuration, seeds the engine, steps the requested number
//! of ticks, and reports per-stage timings.
//!
//! Usage: `simrun <config.json> [ticks]`

use engine::Stage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simrun=info,orchestrator=info,engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(config_path) = args.next() else {
        eprintln!("usage: simrun <config.json> [ticks]");
        std::process::exit(2);
    };
    let ticks: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(600);

    let mut engine = match orchestrator::create_engine(&config_path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to create simulation: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "{:>8} {:>8} {:>12} {:>12} {:>12}",
        "tick", "alive", "integrate ms", "sort ms", "resolve ms"
    );

    let report_every = (ticks / 10).max(1);
    for tick in 1..=ticks {
        engine.step();
        if tick % report_every == 0 || tick == ticks {
            let timings = engine.timings();
            println!(
                "{:>8} {:>8} {:>12.3} {:>12.3} {:>12.3}",
                tick,
                engine.alive(),
                timings.total(Stage::Integrate).as_secs_f64() * 1000.0,
                timings.total(Stage::Sort).as_secs_f64() * 1000.0,
                timings.total(Stage::Resolve).as_secs_f64() * 1000.0,
            );
        }
    }

    tracing::info!(
        ticks,
        alive = engine.alive(),
        "simulation run complete"
    );
}
