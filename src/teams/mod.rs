//! Team ratings lookup.
//!
//! A small reference table covers the top programs. Anything else gets
//! synthetic ratings: ranked teams are drawn around a stronger baseline than
//! unranked ones. The engine treats both kinds identically.

use rand::Rng;
use tracing::debug;

use crate::db::models::{ScheduleTeam, StarPlayer, Team};

/// Reference ratings, keyed by normalized name.
struct RatedTeam {
    key: &'static str,
    id: &'static str,
    name: &'static str,
    abbrev: &'static str,
    conference: &'static str,
    rank: u32,
    adj_o: f64,
    adj_d: f64,
    tempo: f64,
    /// (player id, name, position, is_star, ppg)
    star: Option<(&'static str, &'static str, &'static str, bool, f64)>,
}

#[rustfmt::skip]
const REFERENCE_TEAMS: &[RatedTeam] = &[
    RatedTeam { key: "UCONN", id: "conn", name: "Connecticut", abbrev: "UCONN", conference: "Big East", rank: 1, adj_o: 126.4, adj_d: 93.2, tempo: 64.5, star: Some(("p1", "A. Karaban", "F", true, 14.5)) },
    RatedTeam { key: "PURDUE", id: "pur", name: "Purdue", abbrev: "PUR", conference: "Big Ten", rank: 2, adj_o: 125.1, adj_d: 94.5, tempo: 67.2, star: Some(("p2", "B. Smith", "G", true, 18.2)) },
    RatedTeam { key: "HOUSTON", id: "hou", name: "Houston", abbrev: "HOU", conference: "Big 12", rank: 3, adj_o: 119.8, adj_d: 85.5, tempo: 61.8, star: Some(("p3", "L. Cryer", "G", true, 16.0)) },
    RatedTeam { key: "N CAROLINA", id: "unc", name: "North Carolina", abbrev: "UNC", conference: "ACC", rank: 7, adj_o: 120.5, adj_d: 96.1, tempo: 71.5, star: Some(("p4", "R. Davis", "G", true, 21.5)) },
    RatedTeam { key: "DUKE", id: "duke", name: "Duke", abbrev: "DUKE", conference: "ACC", rank: 9, adj_o: 121.2, adj_d: 95.8, tempo: 68.0, star: Some(("p5", "C. Flagg", "F", true, 17.8)) },
    RatedTeam { key: "KANSAS", id: "kan", name: "Kansas", abbrev: "KU", conference: "Big 12", rank: 5, adj_o: 118.5, adj_d: 92.4, tempo: 69.1, star: Some(("p6", "H. Dickinson", "C", true, 18.5)) },
    RatedTeam { key: "ARIZONA", id: "ari", name: "Arizona", abbrev: "ARIZ", conference: "Big 12", rank: 11, adj_o: 122.0, adj_d: 97.5, tempo: 72.8, star: Some(("p7", "C. Love", "G", true, 19.1)) },
    RatedTeam { key: "TENNESSEE", id: "tenn", name: "Tennessee", abbrev: "TENN", conference: "SEC", rank: 8, adj_o: 117.5, adj_d: 91.0, tempo: 68.5, star: Some(("p8", "Z. Zeigler", "G", true, 14.2)) },
    RatedTeam { key: "ALABAMA", id: "ala", name: "Alabama", abbrev: "BAMA", conference: "SEC", rank: 13, adj_o: 124.5, adj_d: 101.2, tempo: 74.5, star: Some(("p9", "M. Sears", "G", true, 22.1)) },
    RatedTeam { key: "CREIGHTON", id: "crei", name: "Creighton", abbrev: "CREI", conference: "Big East", rank: 15, adj_o: 120.1, adj_d: 96.5, tempo: 69.0, star: Some(("p10", "R. Kalkbrenner", "C", true, 17.1)) },
    RatedTeam { key: "GONZAGA", id: "gonz", name: "Gonzaga", abbrev: "GONZ", conference: "WCC", rank: 10, adj_o: 121.5, adj_d: 98.2, tempo: 70.1, star: Some(("p11", "R. Nembhard", "G", true, 16.5)) },
    RatedTeam { key: "KENTUCKY", id: "uk", name: "Kentucky", abbrev: "UK", conference: "SEC", rank: 12, adj_o: 123.0, adj_d: 99.5, tempo: 71.0, star: Some(("p12", "A. Thiero", "F", false, 12.5)) },
    RatedTeam { key: "BAYLOR", id: "bay", name: "Baylor", abbrev: "BAY", conference: "Big 12", rank: 14, adj_o: 120.8, adj_d: 97.0, tempo: 66.5, star: None },
    RatedTeam { key: "IOWA ST", id: "isu", name: "Iowa State", abbrev: "ISU", conference: "Big 12", rank: 6, adj_o: 114.5, adj_d: 86.2, tempo: 65.0, star: None },
];

impl RatedTeam {
    fn to_team(&self) -> Team {
        Team {
            id: self.id.to_string(),
            name: self.name.to_string(),
            abbrev: self.abbrev.to_string(),
            conference: self.conference.to_string(),
            logo_url: None,
            rank: Some(self.rank),
            adj_o: self.adj_o,
            adj_d: self.adj_d,
            tempo: self.tempo,
            star_player: self.star.map(|(id, name, position, is_star, ppg)| StarPlayer {
                id: id.to_string(),
                name: name.to_string(),
                position: position.to_string(),
                is_star,
                ppg,
            }),
        }
    }
}

/// Map a provider team name onto a reference-table key.
///
/// Names that match no key come back upper-cased with the suffix rewrites
/// applied.
pub fn normalize_name(name: &str) -> String {
    let n = name
        .to_uppercase()
        .replacen(" UNIVERSITY", "", 1)
        .replacen(" STATE", " ST", 1);

    if n.contains("NORTH CAROLINA") {
        return "N CAROLINA".to_string();
    }
    if n.contains("CONN") {
        return "UCONN".to_string();
    }
    if n.contains("KANSAS") || n == "KU" {
        return "KANSAS".to_string();
    }
    REFERENCE_TEAMS
        .iter()
        .find(|t| n.contains(t.key))
        .map(|t| t.key.to_string())
        .unwrap_or(n)
}

/// Supplies Team records by name, from the reference table or synthesized.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamDirectory;

impl TeamDirectory {
    pub fn new() -> Self {
        TeamDirectory
    }

    /// Reference-table team for `name`, if there is one.
    pub fn lookup(&self, name: &str) -> Option<Team> {
        let key = normalize_name(name);
        REFERENCE_TEAMS
            .iter()
            .find(|t| t.key == key)
            .map(RatedTeam::to_team)
    }

    /// All reference-table teams, in table order.
    pub fn reference_teams(&self) -> Vec<Team> {
        REFERENCE_TEAMS.iter().map(RatedTeam::to_team).collect()
    }

    /// Team for a provider entry: the table team with the provider's logo
    /// and rank (when given), or a synthetic team.
    pub fn resolve<R: Rng>(
        &self,
        name: &str,
        id: &str,
        logo: &str,
        rank: Option<u32>,
        rng: &mut R,
    ) -> Team {
        let rank = rank.filter(|r| *r > 0);
        match self.lookup(name) {
            Some(mut team) => {
                if !logo.is_empty() {
                    team.logo_url = Some(logo.to_string());
                }
                team.rank = rank.or(team.rank);
                team
            }
            None => {
                debug!("No reference ratings for '{}', synthesizing", name);
                synthesize(name, id, logo, rank, rng)
            }
        }
    }

    pub fn resolve_schedule_team<R: Rng>(&self, entry: &ScheduleTeam, rng: &mut R) -> Team {
        self.resolve(&entry.name, &entry.id, &entry.logo, entry.rank, rng)
    }

    /// Team for a bare name typed by a user; synthetic teams get a slug id.
    pub fn resolve_by_name<R: Rng>(&self, name: &str, rng: &mut R) -> Team {
        let slug = name.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
        self.resolve(name.trim(), &slug, "", None, rng)
    }
}

/// Synthetic ratings: ranked (top-25) teams are centred on 116 / 94, the
/// rest on 108 / 102, each ±5; tempo 67 ± 3.
fn synthesize<R: Rng>(name: &str, id: &str, logo: &str, rank: Option<u32>, rng: &mut R) -> Team {
    let is_ranked = rank.is_some_and(|r| r < 26);
    let (base_o, base_d) = if is_ranked { (116.0, 94.0) } else { (108.0, 102.0) };

    let adj_o = base_o + rng.gen_range(-5.0_f64..5.0);
    let adj_d = base_d + rng.gen_range(-5.0_f64..5.0);
    let tempo = 67.0 + rng.gen_range(-3.0_f64..3.0);

    let star_player = is_ranked.then(|| StarPlayer {
        id: format!("s-{}", id),
        name: "Star Player".to_string(),
        position: "G".to_string(),
        is_star: true,
        ppg: 15.0 + rng.gen::<f64>() * 5.0,
    });

    Team {
        id: id.to_string(),
        name: name.to_string(),
        abbrev: name.chars().take(3).collect::<String>().to_uppercase(),
        conference: "D1".to_string(),
        logo_url: (!logo.is_empty()).then(|| logo.to_string()),
        rank,
        adj_o: round1(adj_o),
        adj_d: round1(adj_d),
        tempo: round1(tempo),
        star_player,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
