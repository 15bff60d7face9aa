use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::provider::ScheduleProvider;
use crate::db::models::{MarketLine, ScheduleGame, ScheduleTeam};

pub const DEFAULT_SCOREBOARD_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/basketball/mens-college-basketball/scoreboard";

/// ESPN reports unranked teams with a curated rank of 99.
const UNRANKED: u64 = 99;

/// Men's college basketball schedule backed by ESPN's public scoreboard API.
pub struct EspnScoreboard {
    http: Client,
    /// Base URL for overriding in tests
    base_url: String,
}

impl EspnScoreboard {
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(EspnScoreboard {
            http,
            base_url: base_url.unwrap_or(DEFAULT_SCOREBOARD_URL).to_string(),
        })
    }

    /// `<base>?limit=200&groups=50&dates=YYYYMMDD` (group 50 is Division I).
    fn scoreboard_url(&self, date: NaiveDate) -> Result<Url> {
        let dates = date.format("%Y%m%d").to_string();
        Url::parse_with_params(
            &self.base_url,
            &[("limit", "200"), ("groups", "50"), ("dates", dates.as_str())],
        )
        .with_context(|| format!("Invalid scoreboard URL: {}", self.base_url))
    }
}

#[async_trait]
impl ScheduleProvider for EspnScoreboard {
    fn name(&self) -> &str {
        "ESPN"
    }

    async fn fetch_schedule(&self, date: NaiveDate) -> Result<Vec<ScheduleGame>> {
        let url = self.scoreboard_url(date)?;
        debug!("Fetching schedule from {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("ESPN scoreboard request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("ESPN scoreboard error: {}", resp.status());
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .context("Failed to parse ESPN scoreboard response")?;

        Ok(parse_scoreboard_response(&raw))
    }
}

/// Map the scoreboard payload onto schedule games. Events missing either
/// competitor or their identifying fields are skipped.
fn parse_scoreboard_response(raw: &serde_json::Value) -> Vec<ScheduleGame> {
    let events = match raw["events"].as_array() {
        Some(a) => a,
        None => return vec![],
    };

    events
        .iter()
        .filter_map(|ev| {
            let competition = &ev["competitions"][0];
            let competitors = competition["competitors"].as_array()?;
            let side = |which: &str| {
                competitors
                    .iter()
                    .find(|c| c["homeAway"].as_str() == Some(which))
                    .and_then(parse_competitor)
            };
            let home_team = side("home")?;
            let away_team = side("away")?;

            let odds = competition["odds"].get(0).and_then(|o| {
                let line = MarketLine {
                    spread: o["details"].as_str().map(str::to_string),
                    over_under: o["overUnder"].as_f64(),
                };
                (line.spread.is_some() || line.over_under.is_some()).then_some(line)
            });

            Some(ScheduleGame {
                id: ev["id"].as_str()?.to_string(),
                date: ev["date"].as_str().unwrap_or_default().to_string(),
                status: ev["status"]["type"]["shortDetail"]
                    .as_str()
                    .unwrap_or("Scheduled")
                    .to_string(),
                odds,
                home_team,
                away_team,
            })
        })
        .collect()
}

fn parse_competitor(c: &serde_json::Value) -> Option<ScheduleTeam> {
    let team = &c["team"];
    let rank = c["curatedRank"]["current"]
        .as_u64()
        .filter(|r| *r < UNRANKED)
        .map(|r| r as u32);
    Some(ScheduleTeam {
        name: team["displayName"].as_str()?.to_string(),
        abbreviation: team["abbreviation"].as_str().unwrap_or_default().to_string(),
        id: team["id"].as_str()?.to_string(),
        logo: team["logo"].as_str().unwrap_or_default().to_string(),
        rank,
        score: c["score"].as_str().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn competitor(home_away: &str, name: &str, abbr: &str, id: &str, rank: u64) -> serde_json::Value {
        json!({
            "homeAway": home_away,
            "score": "0",
            "curatedRank": { "current": rank },
            "team": {
                "displayName": name,
                "abbreviation": abbr,
                "id": id,
                "logo": format!("https://logo/{}.png", id)
            }
        })
    }

    #[test]
    fn test_parse_scoreboard() {
        let raw = json!({
            "events": [
                {
                    "id": "401",
                    "date": "2025-02-01T23:00Z",
                    "status": { "type": { "shortDetail": "2/1 - 6:00 PM EST" } },
                    "competitions": [{
                        "competitors": [
                            competitor("home", "Duke Blue Devils", "DUKE", "150", 9),
                            competitor("away", "North Carolina Tar Heels", "UNC", "153", 99)
                        ],
                        "odds": [{ "details": "DUKE -4.5", "overUnder": 151.5 }]
                    }]
                },
                {
                    "id": "402",
                    "date": "2025-02-01T19:00Z",
                    "status": { "type": { "shortDetail": "Final" } },
                    "competitions": [{
                        "competitors": [
                            competitor("home", "Indiana Hoosiers", "IU", "84", 99),
                            competitor("away", "Purdue Boilermakers", "PUR", "2509", 2)
                        ]
                    }]
                }
            ]
        });

        let games = parse_scoreboard_response(&raw);
        assert_eq!(games.len(), 2);

        let g = &games[0];
        assert_eq!(g.id, "401");
        assert_eq!(g.status, "2/1 - 6:00 PM EST");
        assert_eq!(g.home_team.abbreviation, "DUKE");
        assert_eq!(g.home_team.rank, Some(9));
        assert_eq!(g.away_team.name, "North Carolina Tar Heels");
        assert_eq!(g.away_team.rank, None);
        assert_eq!(g.away_team.logo, "https://logo/153.png");
        let odds = g.odds.as_ref().unwrap();
        assert_eq!(odds.spread.as_deref(), Some("DUKE -4.5"));
        assert_eq!(odds.over_under, Some(151.5));

        assert!(games[1].odds.is_none());
        assert_eq!(games[1].away_team.rank, Some(2));
    }

    #[test]
    fn test_parse_skips_incomplete_events() {
        let raw = json!({
            "events": [
                { "id": "1", "competitions": [{ "competitors": [
                    competitor("home", "Duke Blue Devils", "DUKE", "150", 9)
                ]}]},
                { "competitions": [] }
            ]
        });
        assert!(parse_scoreboard_response(&raw).is_empty());
        assert!(parse_scoreboard_response(&json!({})).is_empty());
    }

    #[test]
    fn test_scoreboard_url() {
        let espn = EspnScoreboard::new(Some("http://localhost:9/scoreboard")).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let url = espn.scoreboard_url(date).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9/scoreboard?limit=200&groups=50&dates=20250307"
        );
    }
}
