#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Lane Defence session headlessly.
//!
//! A seeded autopilot stands in for the player. The session state is
//! printed once per redraw until the session concludes or the time budget
//! runs out.

mod autopilot;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use lane_defence_core::{SessionSnapshot, Tier};
use lane_defence_simulation::{ChannelSink, SessionConfig, Simulation};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::autopilot::{Action, Autopilot};

#[derive(Debug, Parser)]
#[command(name = "lane-defence")]
#[command(about = "Plays a Lane Defence session headlessly")]
#[command(version)]
struct Cli {
    /// Difficulty tier: 0 easy, 1 medium, 2 hard. Overrides the config file.
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=2))]
    tier: Option<u32>,

    /// Session configuration file in TOML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the autopilot's placement choices.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Wall-clock seconds to play before giving up.
    #[arg(long, default_value_t = 300)]
    budget_secs: u64,

    /// Milliseconds between printed snapshots.
    #[arg(long, default_value_t = 500)]
    redraw_ms: u64,

    /// Enable debug logging when RUST_LOG is unset.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Lane Defence command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to load session config {}", path.display()))?,
        None => SessionConfig::for_tier(Tier::Easy),
    };
    if let Some(tier) = cli.tier {
        config.tier = Tier::try_from(tier).context("invalid --tier")?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("failed to build the tokio runtime")?;
    let summary = runtime.block_on(play(config, &cli))?;
    println!("final: {}", render(&summary));
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn play(config: SessionConfig, cli: &Cli) -> Result<SessionSnapshot> {
    let (sink, mut events) = ChannelSink::new();
    let simulation =
        Simulation::start(config, Arc::new(sink)).context("failed to start the session")?;
    let mut autopilot = Autopilot::new(cli.seed);

    let redraw = Duration::from_millis(cli.redraw_ms.max(1));
    let deadline = Instant::now() + Duration::from_secs(cli.budget_secs);
    let mut ticker = time::interval(redraw);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let _ = ticker.tick().await;
        while let Ok(event) = events.try_recv() {
            debug!(?event, "session event");
        }
        match autopilot.act(&simulation) {
            Some(Action::Placed { kind, cell }) => {
                info!(?kind, %cell, "autopilot placed defender");
            }
            Some(Action::Upgraded { cell, level }) => {
                info!(%cell, level, "autopilot upgraded defender");
            }
            None => {}
        }

        let snapshot = simulation.snapshot();
        println!("{}", render(&snapshot));
        if let Some(outcome) = snapshot.outcome {
            info!(?outcome, "session concluded");
            break;
        }
        if Instant::now() >= deadline {
            warn!(budget_secs = cli.budget_secs, "time budget exhausted");
            break;
        }
    }

    Ok(simulation.quit_to_menu())
}

fn render(snapshot: &SessionSnapshot) -> String {
    let alive = snapshot.units.iter().filter(|unit| unit.alive).count();
    let status = match snapshot.outcome {
        Some(outcome) => format!("{outcome:?}"),
        None if snapshot.paused => "paused".to_owned(),
        None => "running".to_owned(),
    };
    format!(
        "wave {}/{} | money {} | lives {} | units {} | defenders {} | {}",
        snapshot.wave,
        snapshot.total_waves,
        snapshot.money,
        snapshot.objective_hit_points,
        alive,
        snapshot.defenders.len(),
        status,
    )
}

#[cfg(test)]
mod tests {
    use lane_defence_core::{Outcome, WorldPoint};

    use super::*;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            tier: Tier::Easy,
            money: 150,
            wave: 1,
            total_waves: 2,
            objective_hit_points: 10,
            objective_position: WorldPoint::new(0.0, 0.0),
            paused: false,
            outcome: None,
            units: Vec::new(),
            defenders: Vec::new(),
        }
    }

    #[test]
    fn render_summarises_a_running_session() {
        assert_eq!(
            render(&snapshot()),
            "wave 1/2 | money 150 | lives 10 | units 0 | defenders 0 | running"
        );
    }

    #[test]
    fn render_reports_the_outcome() {
        let mut snapshot = snapshot();
        snapshot.paused = true;
        assert!(render(&snapshot).ends_with("paused"));
        snapshot.outcome = Some(Outcome::Victory);
        assert!(render(&snapshot).ends_with("Victory"));
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "lane-defence",
            "--tier",
            "2",
            "--seed",
            "9",
            "--budget-secs",
            "5",
            "--verbose",
        ])
        .expect("parse flags");
        assert_eq!(cli.tier, Some(2));
        assert_eq!(cli.seed, 9);
        assert_eq!(cli.budget_secs, 5);
        assert!(cli.verbose);

        assert!(Cli::try_parse_from(["lane-defence", "--tier", "3"]).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn headless_run_ends_within_its_budget() {
        let cli = Cli::try_parse_from(["lane-defence", "--budget-secs", "2"]).expect("parse");
        let summary = play(SessionConfig::for_tier(Tier::Easy), &cli)
            .await
            .expect("play");
        assert_eq!(summary.outcome, None);
        assert!(!summary.defenders.is_empty());
    }
}
