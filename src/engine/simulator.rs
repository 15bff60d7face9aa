//! One trial of a matchup: eight five-minute regulation segments followed by
//! as many overtime periods as it takes to break a tie.
//!
//! Scoring per segment is possession based: a side's efficiency for the
//! segment is drawn around its raw rate, scaled by a star / injury
//! multiplier, and converted to points over the segment's share of the
//! game's possessions.

use rand::Rng;
use tracing::debug;

use super::rating::MatchupRates;
use super::sampler::GaussianSampler;
use crate::db::models::{GameSegment, Side, SingleSimResult, Team};

/// Regulation is split into eight 5-minute segments.
pub const REGULATION_SEGMENTS: u32 = 8;
/// Segment number used for every overtime period in the flow.
pub const OVERTIME_SEGMENT: u32 = 9;
/// Hard ceiling on overtime periods; the last one ends in a sudden-death point.
pub const MAX_OVERTIME_PERIODS: u32 = 25;

const STAR_MULTIPLIER: f64 = 1.05;
const INJURY_MULTIPLIER: f64 = 0.9;
/// Injury chance per side = chaos_factor × INJURY_RATE.
const INJURY_RATE: f64 = 0.05;
/// Regulation std dev = BASE_STD_DEV × (1 + chaos_factor).
const BASE_STD_DEV: f64 = 10.0;
/// Overtime std dev ignores the chaos factor and both multipliers.
const OVERTIME_STD_DEV: f64 = 15.0;
/// A segment differential above this is narrated as a run.
const RUN_THRESHOLD: i64 = 8;
/// Injuries are narrated when the flow reaches this segment.
const INJURY_NARRATION_SEGMENT: u32 = 4;

const OVERTIME_LABEL: &str = "FINAL/OT";
const OVERTIME_EVENT: &str = "Overtime Thriller!";

/// A finished trial, plus its flow when it was recorded.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub result: SingleSimResult,
    pub flow: Option<Vec<GameSegment>>,
}

/// Plays single trials for a fixed matchup.
pub struct MatchSimulator<'a> {
    team_a: &'a Team,
    team_b: &'a Team,
    rates: MatchupRates,
    chaos_factor: f64,
}

impl<'a> MatchSimulator<'a> {
    pub fn new(team_a: &'a Team, team_b: &'a Team, rates: MatchupRates, chaos_factor: f64) -> Self {
        MatchSimulator {
            team_a,
            team_b,
            rates,
            chaos_factor,
        }
    }

    /// Play one trial. `trial_id` is 1-based; the segment-by-segment flow is
    /// only built when `record_flow` is set.
    pub fn run_trial<R: Rng>(&self, trial_id: u32, record_flow: bool, rng: &mut R) -> TrialOutcome {
        let mut sampler = GaussianSampler::new(rng);

        let injury_chance = self.chaos_factor * INJURY_RATE;
        let injured_a = sampler.uniform() < injury_chance;
        let injured_b = sampler.uniform() < injury_chance;
        let mult_a = side_multiplier(self.team_a, injured_a);
        let mult_b = side_multiplier(self.team_b, injured_b);

        let std_dev = BASE_STD_DEV * (1.0 + self.chaos_factor);
        let possessions = self.rates.expected_possessions / REGULATION_SEGMENTS as f64;

        let mut flow = record_flow.then(Vec::new);
        let mut score_a = 0u32;
        let mut score_b = 0u32;

        for segment in 1..=REGULATION_SEGMENTS {
            let eff_a = sampler.sample(self.rates.ppp_a, std_dev) * mult_a;
            let eff_b = sampler.sample(self.rates.ppp_b, std_dev) * mult_b;
            let points_a = raw_points(possessions, eff_a);
            let points_b = raw_points(possessions, eff_b);

            score_a = score_a.saturating_add(floor_points(points_a));
            score_b = score_b.saturating_add(floor_points(points_b));

            if let Some(flow) = flow.as_mut() {
                let event = segment_event(
                    self.team_a,
                    self.team_b,
                    points_a - points_b,
                    segment,
                    injured_a,
                    injured_b,
                );
                flow.push(GameSegment {
                    segment,
                    time_display: segment_clock(segment),
                    score_a,
                    score_b,
                    event_log: event.into_iter().collect(),
                });
            }
        }

        let mut overtime_periods = 0u32;
        while score_a == score_b {
            overtime_periods += 1;
            let eff_a = sampler.sample(self.rates.ppp_a, OVERTIME_STD_DEV);
            let eff_b = sampler.sample(self.rates.ppp_b, OVERTIME_STD_DEV);
            score_a = score_a.saturating_add(floor_points(raw_points(possessions, eff_a)));
            score_b = score_b.saturating_add(floor_points(raw_points(possessions, eff_b)));

            if score_a == score_b && overtime_periods >= MAX_OVERTIME_PERIODS {
                debug!(trial = trial_id, "overtime cap reached, awarding sudden-death point");
                if sampler.uniform() < 0.5 {
                    score_a = score_a.saturating_add(1);
                } else {
                    score_b = score_b.saturating_add(1);
                }
            }

            if let Some(flow) = flow.as_mut() {
                flow.push(GameSegment {
                    segment: OVERTIME_SEGMENT,
                    time_display: OVERTIME_LABEL.to_string(),
                    score_a,
                    score_b,
                    event_log: vec![OVERTIME_EVENT.to_string()],
                });
            }
        }

        let winner = if score_a > score_b { Side::A } else { Side::B };
        TrialOutcome {
            result: SingleSimResult {
                id: trial_id,
                score_a,
                score_b,
                winner,
                is_ot: overtime_periods > 0,
                overtime_periods,
            },
            flow,
        }
    }
}

/// Scoring multiplier for a side: an injury overrides the star bonus.
fn side_multiplier(team: &Team, injured: bool) -> f64 {
    if injured {
        INJURY_MULTIPLIER
    } else if team.has_star() {
        STAR_MULTIPLIER
    } else {
        1.0
    }
}

/// Rounded points for `possessions` at `efficiency` points per 100; may be negative.
fn raw_points(possessions: f64, efficiency: f64) -> i64 {
    // `as` saturates and maps NaN to 0
    (possessions * efficiency / 100.0).round() as i64
}

fn floor_points(points: i64) -> u32 {
    points.clamp(0, u32::MAX as i64) as u32
}

/// Game clock at the end of a regulation segment, e.g. "15:00 1H", "00:00 2H".
fn segment_clock(segment: u32) -> String {
    let (half, remaining) = if segment <= 4 {
        ("1H", 20 - segment * 5)
    } else {
        ("2H", 40 - segment * 5)
    };
    if remaining == 0 {
        format!("00:00 {}", half)
    } else {
        format!("{}:00 {}", remaining, half)
    }
}

/// At most one narrative line per segment. Runs take precedence over injuries.
fn segment_event(
    team_a: &Team,
    team_b: &Team,
    differential: i64,
    segment: u32,
    injured_a: bool,
    injured_b: bool,
) -> Option<String> {
    if differential.abs() > RUN_THRESHOLD {
        return Some(if differential > 0 {
            format!("{} dominant run", team_a.abbrev)
        } else {
            format!("{} goes on a tear", team_b.abbrev)
        });
    }
    if segment != INJURY_NARRATION_SEGMENT {
        return None;
    }
    if injured_a {
        Some(player_exits(team_a))
    } else if injured_b {
        Some(player_exits(team_b))
    } else {
        None
    }
}

fn player_exits(team: &Team) -> String {
    match &team.star_player {
        Some(star) => format!("{} limps off court", star.name),
        None => format!("{} loses a key player", team.abbrev),
    }
}
