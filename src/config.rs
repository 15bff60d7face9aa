use clap::{Args, Parser, Subcommand};

use crate::db::models::{MarketLine, SimulationConfig};
use crate::engine::MAX_ITERATIONS;
use crate::schedule::espn::DEFAULT_SCOREBOARD_URL;

/// College basketball matchup simulator
#[derive(Parser, Debug, Clone)]
#[command(name = "hoops-sim", version, about)]
pub struct Config {
    /// SQLite database path for simulation history
    #[arg(long, env = "DATABASE_PATH", default_value = "hoops-sim.db", global = true)]
    pub database_path: String,

    /// Scoreboard API URL for the daily schedule
    #[arg(long, env = "SCHEDULE_API_URL", default_value = DEFAULT_SCOREBOARD_URL, global = true)]
    pub schedule_api_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Simulate a single matchup (team A is the visitor, team B the host)
    Simulate {
        /// Team A name, e.g. "North Carolina"
        team_a: String,
        /// Team B name, e.g. "Duke"
        team_b: String,

        #[command(flatten)]
        sim: SimArgs,

        /// Posted spread, e.g. "DUKE -3.5"
        #[arg(long)]
        spread: Option<String>,

        /// Posted over/under total
        #[arg(long)]
        total: Option<f64>,

        /// Print the segment-by-segment flow of the first trial
        #[arg(long, default_value = "false")]
        show_flow: bool,

        /// Do not store the result in the history database
        #[arg(long, default_value = "false")]
        no_save: bool,
    },
    /// Simulate every game on a date's schedule
    Slate {
        /// Date as YYYY-MM-DD (defaults to today, UTC)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,

        #[command(flatten)]
        sim: SimArgs,
    },
    /// List stored simulations, newest first
    History {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Serve the JSON dashboard API
    Serve {
        /// Dashboard listen address
        #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

/// Simulation knobs shared by the `simulate` and `slate` commands
#[derive(Args, Debug, Clone)]
pub struct SimArgs {
    /// Number of simulated games per matchup (1–100000)
    #[arg(
        long,
        env = "SIM_ITERATIONS",
        default_value = "50",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_ITERATIONS))
    )]
    pub iterations: u32,

    /// Variance and injury knob (0.0–0.2)
    #[arg(long, env = "CHAOS_FACTOR", default_value = "0.05")]
    pub chaos: f64,

    /// Neutral-site game (recorded only, does not change the model)
    #[arg(long, default_value = "false")]
    pub neutral_court: bool,

    /// Fixed RNG seed for reproducible runs
    #[arg(long, env = "SIM_SEED")]
    pub seed: Option<u64>,
}

impl SimArgs {
    pub fn to_config(&self) -> SimulationConfig {
        SimulationConfig {
            iterations: self.iterations,
            chaos_factor: self.chaos,
            neutral_court: self.neutral_court,
            seed: self.seed,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.chaos.is_finite() {
            anyhow::bail!("chaos must be a finite number");
        }
        if !(0.0..=0.2).contains(&self.chaos) {
            tracing::warn!(
                "chaos {} is outside the intended 0.0–0.2 range; running anyway",
                self.chaos
            );
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match &self.command {
            Command::Simulate { sim, total, .. } => {
                sim.validate()?;
                if total.is_some_and(|t| !t.is_finite()) {
                    anyhow::bail!("total must be a finite number");
                }
            }
            Command::Slate { sim, .. } => sim.validate()?,
            Command::History { limit } => {
                if *limit < 1 {
                    anyhow::bail!("limit must be positive");
                }
            }
            Command::Serve { .. } => {}
        }
        Ok(())
    }

    /// Posted lines given on the command line, if any.
    pub fn market_line(&self) -> Option<MarketLine> {
        match &self.command {
            Command::Simulate { spread, total, .. } if spread.is_some() || total.is_some() => {
                Some(MarketLine {
                    spread: spread.clone(),
                    over_under: *total,
                })
            }
            _ => None,
        }
    }
}
