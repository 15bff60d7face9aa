//! Efficiency-based scoring rates for a matchup.
//!
//! A side's expected points per 100 possessions is its offensive rating
//! scaled by how generous the opponent's defense is relative to the league:
//!
//!   ppp_a = adj_o(A) × adj_d(B) / league_avg_adj_o
//!
//! The pace of the game is the plain mean of both tempos.

use crate::db::models::Team;

/// League-average adjusted offensive efficiency (points per 100 possessions).
pub const LEAGUE_AVG_ADJO: f64 = 106.0;
/// League-average tempo (possessions per 40 minutes). Reference only.
pub const LEAGUE_AVG_TEMPO: f64 = 67.5;

/// Scoring rates for one matchup, shared by every trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchupRates {
    /// Team A raw points per 100 possessions
    pub ppp_a: f64,
    /// Team B raw points per 100 possessions
    pub ppp_b: f64,
    /// Expected possessions per side for a full 40-minute game
    pub expected_possessions: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RatingModel {
    pub league_avg_adj_o: f64,
    /// Informational; pace comes from the two teams' tempos alone.
    pub league_avg_tempo: f64,
}

impl Default for RatingModel {
    fn default() -> Self {
        RatingModel {
            league_avg_adj_o: LEAGUE_AVG_ADJO,
            league_avg_tempo: LEAGUE_AVG_TEMPO,
        }
    }
}

impl RatingModel {
    /// Compute both sides' rates. Non-positive ratings are passed through
    /// unchanged and yield degenerate (but finite) rates.
    pub fn rates(&self, team_a: &Team, team_b: &Team) -> MatchupRates {
        MatchupRates {
            ppp_a: team_a.adj_o * team_b.adj_d / self.league_avg_adj_o,
            ppp_b: team_b.adj_o * team_a.adj_d / self.league_avg_adj_o,
            expected_possessions: (team_a.tempo + team_b.tempo) / 2.0,
        }
    }
}
