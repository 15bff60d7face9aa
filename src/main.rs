use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use futures_util::future::join_all;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use hoops_sim::config::{Command, Config, SimArgs};
use hoops_sim::dashboard::{self, AppState};
use hoops_sim::db::models::{MarketLine, SimulationConfig, SimulationResult, Team};
use hoops_sim::db::Database;
use hoops_sim::engine::{analyze_market, simulate};
use hoops_sim::schedule::{fetch_with_fallback, EspnScoreboard, MockSchedule};
use hoops_sim::teams::TeamDirectory;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    match &config.command {
        Command::Simulate {
            team_a,
            team_b,
            sim,
            show_flow,
            no_save,
            ..
        } => {
            let directory = TeamDirectory::new();
            let (a, b) = {
                let mut rng = rand::thread_rng();
                (
                    directory.resolve_by_name(team_a, &mut rng),
                    directory.resolve_by_name(team_b, &mut rng),
                )
            };
            let result = run_matchup(a, b, sim.to_config()).await?;
            print_result(&result, config.market_line().as_ref());
            if *show_flow {
                print_flow(&result);
            }
            if !no_save {
                let db = Database::open(&config.database_path)?;
                db.insert_simulation(&result)?;
                info!("Saved simulation {}", result.id);
            }
        }
        Command::Slate { date, sim } => run_slate(&config, *date, sim).await?,
        Command::History { limit } => {
            let db = Database::open(&config.database_path)?;
            let entries = db.list_history(*limit)?;
            if entries.is_empty() {
                println!("No stored simulations.");
            }
            for e in entries {
                println!(
                    "{}  {}  {:>5} {:>3} - {:<3} {:<5}  A {:>5.1}%  B {:>5.1}%  ({} trials)",
                    e.id,
                    e.created_at.format("%Y-%m-%d %H:%M"),
                    e.team_a,
                    e.avg_score_a,
                    e.avg_score_b,
                    e.team_b,
                    e.win_prob_a * 100.0,
                    e.win_prob_b * 100.0,
                    e.iterations
                );
            }
        }
        Command::Serve { addr } => {
            let db = Database::open(&config.database_path)?;
            info!("Database opened: {}", config.database_path);

            let state = AppState {
                db,
                directory: TeamDirectory::new(),
                schedule: Arc::new(EspnScoreboard::new(Some(&config.schedule_api_url))?),
                defaults: SimulationConfig::default(),
            };
            let app = dashboard::router(state);
            let addr: SocketAddr = addr
                .parse()
                .with_context(|| format!("Invalid dashboard address {}", addr))?;
            info!("Dashboard listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

/// Simulations are CPU-bound; keep them off the async workers.
async fn run_matchup(
    team_a: Team,
    team_b: Team,
    config: SimulationConfig,
) -> Result<SimulationResult> {
    let result = tokio::task::spawn_blocking(move || simulate(&team_a, &team_b, &config))
        .await
        .context("Simulation task panicked")??;
    Ok(result)
}

async fn run_slate(config: &Config, date: Option<chrono::NaiveDate>, sim: &SimArgs) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let espn = EspnScoreboard::new(Some(&config.schedule_api_url))?;
    let games = fetch_with_fallback(&espn, &MockSchedule, date).await?;
    if games.is_empty() {
        println!("No games scheduled for {}.", date);
        return Ok(());
    }
    info!("Simulating {} game(s) for {}", games.len(), date);

    let directory = TeamDirectory::new();
    let matchups: Vec<(Team, Team)> = {
        let mut rng = rand::thread_rng();
        games
            .iter()
            .map(|g| {
                (
                    directory.resolve_schedule_team(&g.away_team, &mut rng),
                    directory.resolve_schedule_team(&g.home_team, &mut rng),
                )
            })
            .collect()
    };

    let sim_config = sim.to_config();
    let runs = matchups
        .into_iter()
        .map(|(a, b)| run_matchup(a, b, sim_config.clone()));
    let results = join_all(runs).await;

    let db = Database::open(&config.database_path)?;
    for (game, result) in games.iter().zip(results) {
        println!("── {} @ {} ({})", game.away_team.name, game.home_team.name, game.status);
        match result {
            Ok(result) => {
                print_result(&result, game.odds.as_ref());
                if let Err(e) = db.insert_simulation(&result) {
                    warn!("Failed to save simulation {}: {:#}", result.id, e);
                }
            }
            Err(e) => warn!("Simulation failed for game {}: {:#}", game.id, e),
        }
        println!();
    }
    Ok(())
}

fn print_result(result: &SimulationResult, line: Option<&MarketLine>) {
    let (a, b) = (&result.team_a, &result.team_b);
    println!(
        "{} {}  vs  {} {}   (avg over {} trials, seed {})",
        a.abbrev, result.avg_score_a, b.abbrev, result.avg_score_b, result.simulations_run, result.seed
    );
    println!(
        "  win  {} {:.1}%  {} {:.1}%   high {}-{}   winner {}",
        a.abbrev,
        result.win_prob_a * 100.0,
        b.abbrev,
        result.win_prob_b * 100.0,
        result.high_score_a,
        result.high_score_b,
        result.winner_id
    );

    let Some(line) = line else { return };
    let m = analyze_market(result, line);
    let pct = |p: Option<f64>| p.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v));
    if let Some(spread) = &line.spread {
        println!(
            "  spread {:<12} cover {} {}  {} {}",
            spread,
            a.abbrev,
            pct(m.cover_prob_a),
            b.abbrev,
            pct(m.cover_prob_b)
        );
    }
    if let Some(total) = line.over_under {
        println!(
            "  total  {:<12} over {}  under {}",
            total,
            pct(m.over_prob),
            pct(m.under_prob)
        );
    }
}

fn print_flow(result: &SimulationResult) {
    for seg in &result.flow {
        let events = if seg.event_log.is_empty() {
            String::new()
        } else {
            format!("  {}", seg.event_log.join("; "))
        };
        println!(
            "  [{:>2}] {:<8} {:>3}-{:<3}{}",
            seg.segment, seg.time_display, seg.score_a, seg.score_b, events
        );
    }
}
