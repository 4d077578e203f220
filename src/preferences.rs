//! The persisted report range.
//!
//! One value per installation, stored in the `options` table under
//! [`RANGE_OPTION`]. Every admin sees and changes the same value. Writes are
//! plain overwrites: when two admins change the range at the same time, the
//! later write wins and nothing detects the race.
use crate::range::RangeLabel;
use crate::storage::{Database, DatabaseError};

/// Option name holding the selected range label.
pub const RANGE_OPTION: &str = "author_report.range";

// ============================================================================
// RangePreference
// ============================================================================

/// Accessor/mutator pair for the stored range label.
#[derive(Clone)]
pub struct RangePreference {
    db: Database,
}

impl RangePreference {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The stored range, or [`RangeLabel::DEFAULT`] when nothing usable is stored.
    pub async fn get(&self) -> Result<RangeLabel, DatabaseError> {
        let stored = self.db.get_option(RANGE_OPTION).await?;
        Ok(stored
            .as_deref()
            .map_or(RangeLabel::DEFAULT, RangeLabel::parse_or_default))
    }

    /// Overwrite the stored range (last write wins).
    pub async fn set(&self, range: RangeLabel) -> Result<(), DatabaseError> {
        self.db.set_option(RANGE_OPTION, range.as_str()).await?;
        tracing::info!(range = %range, "Stored author report range");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_absent_preference_is_default() {
        let pref = RangePreference::new(test_db().await);
        assert_eq!(pref.get().await.unwrap(), RangeLabel::OneYear);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let pref = RangePreference::new(test_db().await);
        pref.set(RangeLabel::AllTime).await.unwrap();
        assert_eq!(pref.get().await.unwrap(), RangeLabel::AllTime);
    }

    #[tokio::test]
    async fn test_stored_as_canonical_label() {
        let db = test_db().await;
        let pref = RangePreference::new(db.clone());
        pref.set(RangeLabel::SixMonths).await.unwrap();
        assert_eq!(
            db.get_option(RANGE_OPTION).await.unwrap().as_deref(),
            Some("6 months ago")
        );
    }

    #[tokio::test]
    async fn test_unrecognized_stored_value_reads_as_default() {
        let db = test_db().await;
        db.set_option(RANGE_OPTION, "last tuesday").await.unwrap();
        let pref = RangePreference::new(db);
        assert_eq!(pref.get().await.unwrap(), RangeLabel::DEFAULT);
    }

    #[tokio::test]
    async fn test_last_write_wins_across_handles() {
        let db = test_db().await;
        let first = RangePreference::new(db.clone());
        let second = RangePreference::new(db);

        first.set(RangeLabel::OneMonth).await.unwrap();
        second.set(RangeLabel::TwoYears).await.unwrap();

        assert_eq!(first.get().await.unwrap(), RangeLabel::TwoYears);
    }
}
