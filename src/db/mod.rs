use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
use models::*;

/// Simulation history store: a single SQLite connection behind a mutex.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path.
    /// `":memory:"` opens a throwaway in-memory store.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        self.conn()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    // ── Simulations ───────────────────────────────────────────────────────────

    /// Store a completed simulation. Re-inserting the same id replaces it.
    pub fn insert_simulation(&self, result: &SimulationResult) -> Result<()> {
        let payload = serde_json::to_string(result).context("Failed to serialize simulation")?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO simulations (
                id, created_at, team_a, team_b, winner_id,
                win_prob_a, win_prob_b, avg_score_a, avg_score_b,
                iterations, payload
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
            params![
                result.id,
                result.date,
                result.team_a.abbrev,
                result.team_b.abbrev,
                result.winner_id,
                result.win_prob_a,
                result.win_prob_b,
                result.avg_score_a,
                result.avg_score_b,
                result.simulations_run,
                payload,
            ],
        )?;
        Ok(())
    }

    /// Full result for `id`, if stored.
    pub fn get_simulation(&self, id: &str) -> Result<Option<SimulationResult>> {
        let conn = self.conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM simulations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        payload
            .map(|p| serde_json::from_str(&p).context("Corrupt simulation payload"))
            .transpose()
    }

    /// Most recent simulations first.
    pub fn list_history(&self, limit: i64) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, created_at, team_a, team_b, winner_id,
                    win_prob_a, win_prob_b, avg_score_a, avg_score_b, iterations
             FROM simulations ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], map_history_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Delete one stored simulation; `false` when `id` is unknown.
    pub fn delete_simulation(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM simulations WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// Delete every stored simulation; returns how many were removed.
    pub fn clear_history(&self) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM simulations", [])?;
        Ok(removed)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_history_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.get(0)?,
        created_at: row.get(1)?,
        team_a: row.get(2)?,
        team_b: row.get(3)?,
        winner_id: row.get(4)?,
        win_prob_a: row.get(5)?,
        win_prob_b: row.get(6)?,
        avg_score_a: row.get(7)?,
        avg_score_b: row.get(8)?,
        iterations: row.get(9)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS simulations (
    id          TEXT    PRIMARY KEY,
    created_at  TEXT    NOT NULL,
    team_a      TEXT    NOT NULL,
    team_b      TEXT    NOT NULL,
    winner_id   TEXT    NOT NULL,
    win_prob_a  REAL    NOT NULL,
    win_prob_b  REAL    NOT NULL,
    avg_score_a INTEGER NOT NULL,
    avg_score_b INTEGER NOT NULL,
    iterations  INTEGER NOT NULL,
    payload     TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_simulations_created ON simulations(created_at);
"#;
