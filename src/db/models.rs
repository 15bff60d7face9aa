use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team's standout player. Only `is_star` affects the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarPlayer {
    pub id: String,
    pub name: String,
    /// "G" | "F" | "C"
    pub position: String,
    pub is_star: bool,
    /// Points per game
    pub ppg: f64,
}

/// A rated team as fed into the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Display abbreviation, also the key matched against posted spreads
    pub abbrev: String,
    pub conference: String,
    pub logo_url: Option<String>,
    /// AP rank, if ranked
    pub rank: Option<u32>,
    /// Adjusted offensive efficiency (points scored per 100 possessions)
    pub adj_o: f64,
    /// Adjusted defensive efficiency (points allowed per 100 possessions)
    pub adj_d: f64,
    /// Possessions per 40 minutes
    pub tempo: f64,
    pub star_player: Option<StarPlayer>,
}

impl Team {
    /// Whether the team carries a flagged star contributor.
    pub fn has_star(&self) -> bool {
        self.star_player.as_ref().is_some_and(|p| p.is_star)
    }
}

/// Knobs for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of trials, must be at least 1
    pub iterations: u32,
    /// Variance / injury knob, intended range 0.0–0.2
    pub chaos_factor: f64,
    /// Accepted but not used by any computation
    pub neutral_court: bool,
    /// Fixed run seed; a fresh one is drawn when absent
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            iterations: 50,
            chaos_factor: 0.05,
            neutral_court: false,
            seed: None,
        }
    }
}

/// One of the two sides of a matchup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// A snapshot of the canonical trial after one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSegment {
    /// 1–8 for regulation, 9 for every overtime period
    pub segment: u32,
    /// e.g. "15:00 1H", "FINAL/OT"
    pub time_display: String,
    pub score_a: u32,
    pub score_b: u32,
    pub event_log: Vec<String>,
}

/// Outcome of a single trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSimResult {
    /// 1-based trial number
    pub id: u32,
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Side,
    pub is_ot: bool,
    pub overtime_periods: u32,
}

/// Aggregate output of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub id: String,
    pub date: DateTime<Utc>,
    pub team_a: Team,
    pub team_b: Team,
    /// Id of the team that won more than half of the trials (team B on an exact split)
    pub winner_id: String,
    pub avg_score_a: u32,
    pub avg_score_b: u32,
    pub win_prob_a: f64,
    pub win_prob_b: f64,
    pub high_score_a: u32,
    pub high_score_b: u32,
    pub simulations_run: u32,
    pub config: SimulationConfig,
    /// Seed the run actually used
    pub seed: u64,
    /// Segment-by-segment progression of the first trial
    pub flow: Vec<GameSegment>,
    pub all_sims: Vec<SingleSimResult>,
}

/// Posted betting lines for a game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketLine {
    /// e.g. "HOU -2.5"
    pub spread: Option<String>,
    pub over_under: Option<f64>,
}

/// Cover and total percentages (0–100) derived from a run's trials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalyticsResult {
    pub cover_prob_a: Option<f64>,
    pub cover_prob_b: Option<f64>,
    pub over_prob: Option<f64>,
    pub under_prob: Option<f64>,
}

/// One side of a scheduled game, as reported by the schedule provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTeam {
    pub name: String,
    pub abbreviation: String,
    pub id: String,
    pub logo: String,
    pub rank: Option<u32>,
    pub score: Option<String>,
}

/// A scheduled game with optional posted odds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGame {
    pub id: String,
    pub date: String,
    /// Provider status text, e.g. "Scheduled", "7:00 PM EST", "Final"
    pub status: String,
    pub odds: Option<MarketLine>,
    pub home_team: ScheduleTeam,
    pub away_team: ScheduleTeam,
}

/// Summary row of a stored simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub team_a: String,
    pub team_b: String,
    pub winner_id: String,
    pub win_prob_a: f64,
    pub win_prob_b: f64,
    pub avg_score_a: u32,
    pub avg_score_b: u32,
    pub iterations: u32,
}
