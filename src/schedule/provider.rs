use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::models::ScheduleGame;

/// Trait that every schedule provider must implement.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    /// Return the games scheduled on `date`, with posted odds where available.
    async fn fetch_schedule(&self, date: NaiveDate) -> Result<Vec<ScheduleGame>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
