//! The range-selection round trip.
//!
//! [`RangeSelection::initial_render`] builds what the settings page shows on
//! load. [`RangeSelection::handle_selection_change`] serves the client's
//! refresh: it checks the caller and the anti-forgery token, coerces the
//! submitted label into a known range, stores it, and returns the re-rendered
//! report fragment. Rejected requests touch neither the store nor the database.
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::access::Caller;
use crate::config::{Config, ConfigError};
use crate::nonce::{NonceKeeper, RANGE_ACTION};
use crate::preferences::RangePreference;
use crate::range::RangeLabel;
use crate::render::{render_report, render_selector};
use crate::storage::{Database, DatabaseError, ReportQuery};
use crate::util::sanitize_text_field;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum SelectionError {
    /// Missing capability, or a missing/invalid anti-forgery token.
    #[error("Not allowed to manage the author report")]
    Unauthorized,

    /// The content store failed; no report was produced.
    #[error(transparent)]
    DataAccess(#[from] DatabaseError),
}

// ============================================================================
// Settings
// ============================================================================

/// Fixed inputs to every report, taken from configuration.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub excluded_categories: Vec<i64>,
    pub post_type: String,
    pub site_url: Url,
    pub query_timeout: Duration,
}

impl ReportSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            excluded_categories: config.excluded_categories.clone(),
            post_type: config.post_type.clone(),
            site_url: config.site_url()?,
            query_timeout: Duration::from_secs(config.query_timeout_secs.max(1)),
        })
    }
}

/// Resolve `range` against `now`, run the author query under the configured
/// timeout, and render the fragment.
pub async fn build_report(
    db: &Database,
    settings: &ReportSettings,
    range: RangeLabel,
    now: DateTime<Utc>,
) -> Result<String, DatabaseError> {
    let query = ReportQuery {
        cutoff: range.resolve(now.naive_utc()),
        excluded_categories: &settings.excluded_categories,
        post_type: &settings.post_type,
        site_url: &settings.site_url,
    };

    let reports = tokio::time::timeout(
        settings.query_timeout,
        db.find_authors_with_articles(&query),
    )
    .await
    .map_err(|_| DatabaseError::Timeout(settings.query_timeout.as_secs()))??;

    tracing::debug!(
        range = %range,
        cutoff = %query.cutoff,
        authors = reports.len(),
        "Built author report"
    );
    Ok(render_report(&reports, range))
}

// ============================================================================
// RangeSelection
// ============================================================================

/// What the settings page needs on first load.
#[derive(Debug, Clone)]
pub struct InitialRender {
    pub selected: RangeLabel,
    pub selector: String,
    pub fragment: String,
    pub token: String,
}

pub struct RangeSelection {
    db: Database,
    preference: RangePreference,
    nonces: NonceKeeper,
    settings: ReportSettings,
}

impl RangeSelection {
    pub fn new(db: Database, nonces: NonceKeeper, settings: ReportSettings) -> Self {
        Self {
            preference: RangePreference::new(db.clone()),
            db,
            nonces,
            settings,
        }
    }

    /// Resolve `range`, query, and render. Read-only.
    pub async fn report(
        &self,
        range: RangeLabel,
        now: DateTime<Utc>,
    ) -> Result<String, SelectionError> {
        Ok(build_report(&self.db, &self.settings, range, now).await?)
    }

    /// Selector, report and token for the page as it is first shown.
    pub async fn initial_render(
        &self,
        caller: Option<&Caller>,
        now: DateTime<Utc>,
    ) -> Result<InitialRender, SelectionError> {
        let caller = caller.ok_or(SelectionError::Unauthorized)?;

        let selected = self.preference.get().await?;
        let fragment = self.report(selected, now).await?;
        Ok(InitialRender {
            selected,
            selector: render_selector(selected),
            fragment,
            token: self.nonces.issue(RANGE_ACTION, caller.user(), now),
        })
    }

    /// Apply a client's range choice and return the refreshed fragment.
    ///
    /// Order matters: authorization, then sanitization, then the write, then
    /// the query. Unknown or empty labels are stored as the default range.
    pub async fn handle_selection_change(
        &self,
        caller: Option<&Caller>,
        request_label: &str,
        security_token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, SelectionError> {
        let caller = caller.ok_or(SelectionError::Unauthorized)?;
        if !self
            .nonces
            .verify(RANGE_ACTION, caller.user(), security_token, now)
        {
            tracing::warn!(user = %caller.user(), "Rejected range change: invalid security token");
            return Err(SelectionError::Unauthorized);
        }

        let range = RangeLabel::parse_or_default(&sanitize_text_field(request_label));
        self.preference.set(range).await?;
        tracing::info!(user = %caller.user(), range = %range, "Author report range changed");

        self.report(range, now).await
    }
}

// ============================================================================
// Tests
// ============================================================================
