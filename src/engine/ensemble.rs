use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use uuid::Uuid;

use super::rating::RatingModel;
use super::simulator::MatchSimulator;
use crate::db::models::{Side, SimulationConfig, SimulationResult, SingleSimResult, Team};
use crate::error::SimError;

/// Index of the trial whose flow is kept on the result.
pub const CANONICAL_TRIAL: u32 = 0;

/// Largest ensemble a single run accepts.
pub const MAX_ITERATIONS: u32 = 100_000;

/// Run `config.iterations` independent trials of `team_a` vs `team_b`.
pub fn simulate(
    team_a: &Team,
    team_b: &Team,
    config: &SimulationConfig,
) -> Result<SimulationResult, SimError> {
    simulate_with_cancel(team_a, team_b, config, &AtomicBool::new(false))
}

/// Like [`simulate`], but checks `cancel` between trials and stops early
/// with [`SimError::Cancelled`] once it is set.
pub fn simulate_with_cancel(
    team_a: &Team,
    team_b: &Team,
    config: &SimulationConfig,
    cancel: &AtomicBool,
) -> Result<SimulationResult, SimError> {
    validate(team_a, team_b, config)?;

    let seed = config.seed.unwrap_or_else(rand::random::<u64>);
    let rates = RatingModel::default().rates(team_a, team_b);
    let simulator = MatchSimulator::new(team_a, team_b, rates, config.chaos_factor);
    debug!(
        team_a = %team_a.abbrev,
        team_b = %team_b.abbrev,
        iterations = config.iterations,
        seed,
        ppp_a = rates.ppp_a,
        ppp_b = rates.ppp_b,
        possessions = rates.expected_possessions,
        "Starting simulation"
    );

    let mut tally = Tally::default();
    let mut flow = Vec::new();
    let mut all_sims = Vec::new();

    for trial in 0..config.iterations {
        if cancel.load(Ordering::Relaxed) {
            debug!(completed = trial, "Simulation cancelled");
            return Err(SimError::Cancelled { completed: trial });
        }
        let mut rng = StdRng::seed_from_u64(trial_seed(seed, trial));
        let outcome = simulator.run_trial(trial + 1, trial == CANONICAL_TRIAL, &mut rng);
        if let Some(recorded) = outcome.flow {
            flow = recorded;
        }
        tally.record(&outcome.result);
        all_sims.push(outcome.result);
    }

    let n = config.iterations as f64;
    let win_prob_a = round3(tally.wins_a as f64 / n);
    let winner_id = match favored_side(tally.wins_a, config.iterations) {
        Side::A => team_a.id.clone(),
        Side::B => team_b.id.clone(),
    };

    let result = SimulationResult {
        id: Uuid::new_v4().to_string(),
        date: Utc::now(),
        team_a: team_a.clone(),
        team_b: team_b.clone(),
        winner_id,
        avg_score_a: (tally.total_a as f64 / n).round() as u32,
        avg_score_b: (tally.total_b as f64 / n).round() as u32,
        win_prob_a,
        win_prob_b: round3(1.0 - win_prob_a),
        high_score_a: tally.high_a,
        high_score_b: tally.high_b,
        simulations_run: config.iterations,
        config: config.clone(),
        seed,
        flow,
        all_sims,
    };
    debug!(
        win_prob_a = result.win_prob_a,
        avg_a = result.avg_score_a,
        avg_b = result.avg_score_b,
        "Simulation finished"
    );
    Ok(result)
}

#[derive(Debug, Default)]
struct Tally {
    total_a: u64,
    total_b: u64,
    high_a: u32,
    high_b: u32,
    wins_a: u32,
}

impl Tally {
    fn record(&mut self, sim: &SingleSimResult) {
        self.total_a += u64::from(sim.score_a);
        self.total_b += u64::from(sim.score_b);
        self.high_a = self.high_a.max(sim.score_a);
        self.high_b = self.high_b.max(sim.score_b);
        if sim.winner == Side::A {
            self.wins_a += 1;
        }
    }
}

/// Team A is the designated winner only with strictly more than half the
/// wins; an exact split goes to team B.
fn favored_side(wins_a: u32, iterations: u32) -> Side {
    if u64::from(wins_a) * 2 > u64::from(iterations) {
        Side::A
    } else {
        Side::B
    }
}

fn validate(team_a: &Team, team_b: &Team, config: &SimulationConfig) -> Result<(), SimError> {
    if config.iterations < 1 {
        return Err(SimError::InvalidConfiguration(
            "iterations must be at least 1".into(),
        ));
    }
    if config.iterations > MAX_ITERATIONS {
        return Err(SimError::InvalidConfiguration(format!(
            "iterations must be at most {}, got {}",
            MAX_ITERATIONS, config.iterations
        )));
    }
    if !config.chaos_factor.is_finite() {
        return Err(SimError::InvalidConfiguration(format!(
            "chaos_factor must be finite, got {}",
            config.chaos_factor
        )));
    }
    for team in [team_a, team_b] {
        for (field, value) in [("adj_o", team.adj_o), ("adj_d", team.adj_d), ("tempo", team.tempo)] {
            if !value.is_finite() {
                return Err(SimError::InvalidConfiguration(format!(
                    "{} {} must be finite, got {}",
                    team.abbrev, field, value
                )));
            }
        }
    }
    Ok(())
}

/// Seed for one trial's private stream (SplitMix64 over run seed + index).
fn trial_seed(run_seed: u64, trial: u32) -> u64 {
    let mut z = run_seed.wrapping_add((u64::from(trial) + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests_support::team;

    fn config(iterations: u32, chaos: f64, seed: u64) -> SimulationConfig {
        SimulationConfig {
            iterations,
            chaos_factor: chaos,
            neutral_court: false,
            seed: Some(seed),
        }
    }

    fn duke() -> Team {
        team("DUKE", 121.2, 95.8, 68.0)
    }

    fn unc() -> Team {
        team("UNC", 120.5, 96.1, 71.5)
    }

    #[test]
    fn probabilities_are_complementary_and_match_wins() {
        for seed in [1, 2, 3, 42, 1234] {
            let r = simulate(&duke(), &unc(), &config(137, 0.1, seed)).unwrap();
            assert!((r.win_prob_a + r.win_prob_b - 1.0).abs() < 1e-9);
            for p in [r.win_prob_a, r.win_prob_b] {
                assert_eq!(round3(p), p, "{} has more than three decimals", p);
            }
            let wins = r.all_sims.iter().filter(|s| s.winner == Side::A).count();
            let raw = wins as f64 / 137.0;
            assert!((raw - r.win_prob_a).abs() <= 0.0005 + 1e-12);
        }
    }

    #[test]
    fn trial_list_and_flow_shape() {
        let r = simulate(&duke(), &unc(), &config(250, 0.05, 9)).unwrap();
        assert_eq!(r.all_sims.len(), 250);
        assert_eq!(r.simulations_run, 250);
        for (i, sim) in r.all_sims.iter().enumerate() {
            assert_eq!(sim.id, i as u32 + 1);
            assert_ne!(sim.score_a, sim.score_b);
            let expected = if sim.score_a > sim.score_b { Side::A } else { Side::B };
            assert_eq!(sim.winner, expected);
        }
        assert_eq!(r.flow.len() as u32, 8 + r.all_sims[0].overtime_periods);
        let last = r.flow.last().unwrap();
        assert_eq!(last.score_a, r.all_sims[0].score_a);
        assert_eq!(last.score_b, r.all_sims[0].score_b);
    }

    #[test]
    fn averages_stay_within_peaks() {
        let r = simulate(&duke(), &unc(), &config(300, 0.2, 77)).unwrap();
        assert!(r.avg_score_a <= r.high_score_a);
        assert!(r.avg_score_b <= r.high_score_b);
        assert_eq!(r.high_score_a, r.all_sims.iter().map(|s| s.score_a).max().unwrap());
        assert_eq!(r.high_score_b, r.all_sims.iter().map(|s| s.score_b).max().unwrap());
        // realistic college scores
        assert!(r.avg_score_a > 50 && r.avg_score_a < 110, "avg A {}", r.avg_score_a);
    }

    #[test]
    fn identical_teams_are_a_coin_flip() {
        let a = team("A", 112.0, 98.0, 67.0);
        let b = team("B", 112.0, 98.0, 67.0);
        let r = simulate(&a, &b, &config(2000, 0.05, 2024)).unwrap();
        assert!((r.win_prob_a - 0.5).abs() <= 0.1, "win_prob_a {}", r.win_prob_a);
    }

    #[test]
    fn stronger_team_is_favored() {
        let a = team("UCONN", 126.4, 93.2, 64.5);
        let b = team("AVG", 106.0, 106.0, 67.5);
        let r = simulate(&a, &b, &config(1000, 0.05, 5)).unwrap();
        assert!(r.win_prob_a > 0.6, "win_prob_a {}", r.win_prob_a);
        assert_eq!(r.winner_id, a.id);
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let err = simulate(&duke(), &unc(), &config(0, 0.05, 1)).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
    }

    #[test]
    fn oversized_ensemble_is_rejected_before_running() {
        for iterations in [MAX_ITERATIONS + 1, u32::MAX] {
            let err = simulate(&duke(), &unc(), &config(iterations, 0.05, 1)).unwrap_err();
            assert!(matches!(err, SimError::InvalidConfiguration(_)), "{:?}", err);
        }
    }

    #[test]
    fn odd_ensembles_round_both_probabilities() {
        for seed in 0..20 {
            let r = simulate(&duke(), &unc(), &config(3, 0.05, seed)).unwrap();
            assert_eq!(r.win_prob_b, round3(1.0 - r.win_prob_a));
            let json = serde_json::to_value(&r).unwrap();
            let b = json["win_prob_b"].as_f64().unwrap();
            assert!(
                [0.0, 0.333, 0.667, 1.0].contains(&b),
                "win_prob_b serialized as {}",
                b
            );
        }
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let mut bad = duke();
        bad.tempo = f64::NAN;
        let err = simulate(&bad, &unc(), &config(10, 0.05, 1)).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));

        let err = simulate(&duke(), &unc(), &config(10, f64::INFINITY, 1)).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
    }

    #[test]
    fn degenerate_ratings_still_run() {
        let a = team("ZERO", 0.0, 0.0, 0.0);
        let b = team("NEG", -10.0, 100.0, 60.0);
        let r = simulate(&a, &b, &config(20, 0.05, 3)).unwrap();
        assert_eq!(r.all_sims.len(), 20);
        assert!(r.all_sims.iter().all(|s| s.score_a != s.score_b));
    }

    #[test]
    fn same_seed_same_result() {
        let r1 = simulate(&duke(), &unc(), &config(200, 0.1, 12345)).unwrap();
        let r2 = simulate(&duke(), &unc(), &config(200, 0.1, 12345)).unwrap();
        assert_eq!(r1.all_sims, r2.all_sims);
        assert_eq!(r1.flow, r2.flow);
        assert_eq!(r1.win_prob_a, r2.win_prob_a);
        assert_ne!(r1.id, r2.id);

        let r3 = simulate(&duke(), &unc(), &config(200, 0.1, 54321)).unwrap();
        assert_ne!(r1.all_sims, r3.all_sims);
    }

    #[test]
    fn canonical_trial_does_not_depend_on_ensemble_size() {
        let small = simulate(&duke(), &unc(), &config(5, 0.05, 8)).unwrap();
        let large = simulate(&duke(), &unc(), &config(500, 0.05, 8)).unwrap();
        assert_eq!(small.flow, large.flow);
        assert_eq!(small.all_sims[..], large.all_sims[..5]);
    }

    #[test]
    fn unseeded_runs_record_their_seed() {
        let cfg = SimulationConfig {
            iterations: 20,
            ..SimulationConfig::default()
        };
        let r = simulate(&duke(), &unc(), &cfg).unwrap();
        let replay = simulate(&duke(), &unc(), &config(20, cfg.chaos_factor, r.seed)).unwrap();
        assert_eq!(r.all_sims, replay.all_sims);
    }

    #[test]
    fn neutral_court_has_no_effect() {
        let home = config(100, 0.05, 31);
        let neutral = SimulationConfig {
            neutral_court: true,
            ..home.clone()
        };
        let r1 = simulate(&duke(), &unc(), &home).unwrap();
        let r2 = simulate(&duke(), &unc(), &neutral).unwrap();
        assert_eq!(r1.all_sims, r2.all_sims);
    }

    #[test]
    fn exact_split_goes_to_team_b() {
        assert_eq!(favored_side(5, 10), Side::B);
        assert_eq!(favored_side(6, 10), Side::A);
        assert_eq!(favored_side(3, 7), Side::B);
        assert_eq!(favored_side(4, 7), Side::A);
        assert_eq!(favored_side(1, 1), Side::A);
    }

    #[test]
    fn cancellation_stops_before_the_next_trial() {
        let cancel = AtomicBool::new(true);
        let err = simulate_with_cancel(&duke(), &unc(), &config(100, 0.05, 1), &cancel).unwrap_err();
        assert_eq!(err, SimError::Cancelled { completed: 0 });
    }

    #[test]
    fn trial_seeds_are_distinct() {
        let seeds: std::collections::HashSet<u64> = (0..10_000).map(|t| trial_seed(42, t)).collect();
        assert_eq!(seeds.len(), 10_000);
    }

    #[test]
    fn round3_rounds_to_three_places() {
        assert_eq!(round3(2.0 / 3.0), 0.667);
        assert_eq!(round3(0.5), 0.5);
        assert_eq!(round3(0.0004), 0.0);
    }
}
