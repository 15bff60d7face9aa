//! Against-the-spread and over/under percentages from a finished run.
//!
//! Percentages are taken over every trial, so pushes count in the
//! denominator but in neither numerator: over + under (or cover A + cover B)
//! falls short of 100 whenever a trial lands exactly on the line.

use crate::db::models::{MarketAnalyticsResult, MarketLine, Side, SimulationResult};

/// Score the posted lines against every trial of `result`.
///
/// The spread and the total are handled independently: a spread that does
/// not parse, or names neither team, leaves only the cover fields empty.
pub fn analyze_market(result: &SimulationResult, line: &MarketLine) -> MarketAnalyticsResult {
    let mut analytics = MarketAnalyticsResult::default();
    if result.all_sims.is_empty() {
        return analytics;
    }
    let n = result.all_sims.len() as f64;

    if let Some(total_line) = line.over_under.filter(|t| t.is_finite()) {
        let mut over = 0u32;
        let mut under = 0u32;
        for sim in &result.all_sims {
            let total = f64::from(sim.score_a) + f64::from(sim.score_b);
            if total > total_line {
                over += 1;
            } else if total < total_line {
                under += 1;
            }
        }
        analytics.over_prob = Some(over as f64 / n * 100.0);
        analytics.under_prob = Some(under as f64 / n * 100.0);
    }

    if let Some((favored, value)) = line
        .spread
        .as_deref()
        .and_then(parse_spread)
        .and_then(|(abbrev, value)| favored_side(result, &abbrev).map(|side| (side, value)))
    {
        let mut cover_a = 0u32;
        let mut cover_b = 0u32;
        for sim in &result.all_sims {
            let margin_a = f64::from(sim.score_a) - f64::from(sim.score_b);
            // adjusted margin from the favorite's point of view
            let adjusted = match favored {
                Side::A => margin_a + value,
                Side::B => -margin_a + value,
            };
            if adjusted > 0.0 {
                match favored {
                    Side::A => cover_a += 1,
                    Side::B => cover_b += 1,
                }
            } else if adjusted < 0.0 {
                match favored {
                    Side::A => cover_b += 1,
                    Side::B => cover_a += 1,
                }
            }
        }
        analytics.cover_prob_a = Some(cover_a as f64 / n * 100.0);
        analytics.cover_prob_b = Some(cover_b as f64 / n * 100.0);
    }

    analytics
}

/// Split a spread such as `"HOU -2.5"` into `("HOU", -2.5)`.
///
/// Returns `None` for fewer than two tokens or a non-numeric value
/// (e.g. `"EVEN"`, `"PK"`). Extra trailing tokens are ignored.
pub fn parse_spread(spread: &str) -> Option<(String, f64)> {
    let mut parts = spread.split_whitespace();
    let abbrev = parts.next()?;
    let value: f64 = parts.next()?.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((abbrev.to_string(), value))
}

fn favored_side(result: &SimulationResult, abbrev: &str) -> Option<Side> {
    if result.team_a.abbrev == abbrev {
        Some(Side::A)
    } else if result.team_b.abbrev == abbrev {
        Some(Side::B)
    } else {
        None
    }
}
