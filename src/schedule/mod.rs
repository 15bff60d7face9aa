pub mod espn;
pub mod mock;
pub mod provider;

pub use espn::EspnScoreboard;
pub use mock::MockSchedule;
pub use provider::ScheduleProvider;

use anyhow::Result;
use chrono::NaiveDate;
use std::cmp::Reverse;
use tracing::{info, warn};

use crate::db::models::ScheduleGame;

/// Fetch the slate for `date` from `primary`, falling back to `fallback` when
/// the primary provider errors. Ranked matchups are listed first.
pub async fn fetch_with_fallback(
    primary: &dyn ScheduleProvider,
    fallback: &dyn ScheduleProvider,
    date: NaiveDate,
) -> Result<Vec<ScheduleGame>> {
    let mut games = match primary.fetch_schedule(date).await {
        Ok(games) => {
            info!("{} returned {} game(s) for {}", primary.name(), games.len(), date);
            games
        }
        Err(e) => {
            warn!(
                "Provider '{}' failed ({:#}), using {}",
                primary.name(),
                e,
                fallback.name()
            );
            fallback.fetch_schedule(date).await?
        }
    };
    sort_by_rank_weight(&mut games);
    Ok(games)
}

/// Each ranked side contributes `1000 - rank`, so top-25 clashes outweigh
/// games with a single ranked team.
fn rank_weight(game: &ScheduleGame) -> i64 {
    [game.home_team.rank, game.away_team.rank]
        .into_iter()
        .flatten()
        .map(|r| 1000 - i64::from(r))
        .sum()
}

/// Stable sort, heaviest rank weight first.
pub fn sort_by_rank_weight(games: &mut [ScheduleGame]) {
    games.sort_by_key(|g| Reverse(rank_weight(g)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl ScheduleProvider for Unreachable {
        fn name(&self) -> &str {
            "Unreachable"
        }

        async fn fetch_schedule(&self, _date: NaiveDate) -> Result<Vec<ScheduleGame>> {
            anyhow::bail!("connection refused")
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 8).unwrap()
    }

    #[test]
    fn test_rank_weight_ordering() {
        let mut games = MockSchedule::games_for(date());
        games[0].home_team.rank = None;
        games[0].away_team.rank = None;
        sort_by_rank_weight(&mut games);

        // unranked game sinks to the bottom, the one-ranked-team game just above it
        assert_eq!(games.last().unwrap().id, "mock-0");
        assert_eq!(games[games.len() - 2].id, "mock-5");
        // Kansas (5) vs Houston (3) has the highest combined weight
        assert_eq!(games[0].id, "mock-1");
        assert_eq!(games[1].id, "mock-3");
        let weights: Vec<i64> = games.iter().map(rank_weight).collect();
        assert!(weights.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_sort_is_stable_for_equal_weights() {
        let mut games = MockSchedule::games_for(date());
        for g in games.iter_mut() {
            g.home_team.rank = None;
            g.away_team.rank = None;
        }
        sort_by_rank_weight(&mut games);
        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["mock-0", "mock-1", "mock-2", "mock-3", "mock-4", "mock-5", "mock-6"]);
    }

    #[tokio::test]
    async fn test_fallback_on_provider_failure() {
        let games = fetch_with_fallback(&Unreachable, &MockSchedule, date())
            .await
            .unwrap();
        assert_eq!(games.len(), 7);
        assert_eq!(games[0].id, "mock-1");
    }
}
