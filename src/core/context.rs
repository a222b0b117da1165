//! Request context and the collaborator interfaces the engine consumes.
//!
//! Every operation receives a [`RequestContext`] carrying the acting user, the clock
//! reading for the request, and the authorization collaborator. Nothing is read from
//! ambient global state.

use crate::entities::stats_report;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

/// Capabilities checked through the [`Authorizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Stash, validate and submit statistics for a center
    SubmitStats,
    /// Open another center's submission data
    ViewSubmissionUi,
    /// Submit for reporting dates before the configured earliest date
    OverrideReportingDateCutoff,
}

/// Authorization collaborator.
pub trait Authorizer: Send + Sync {
    /// Whether the current user holds `capability` for `center_id`.
    fn can(&self, capability: Capability, center_id: i64) -> bool;
}

/// Per-request inputs shared by every operation.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    /// Acting user
    pub user_id: i64,
    /// Clock reading for this request
    pub now: DateTime<Utc>,
    authorizer: &'a dyn Authorizer,
}

impl std::fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("user_id", &self.user_id)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl<'a> RequestContext<'a> {
    /// Creates a context for `user_id` at `now`.
    #[must_use]
    pub const fn new(user_id: i64, now: DateTime<Utc>, authorizer: &'a dyn Authorizer) -> Self {
        Self {
            user_id,
            now,
            authorizer,
        }
    }

    /// Asks the authorization collaborator.
    #[must_use]
    pub fn can(&self, capability: Capability, center_id: i64) -> bool {
        self.authorizer.can(capability, center_id)
    }

    /// Fails with [`Error::Forbidden`] unless the user holds `capability`.
    pub fn require(&self, capability: Capability, center_id: i64) -> Result<()> {
        if self.can(capability, center_id) {
            Ok(())
        } else {
            Err(Error::Forbidden {
                message: format!(
                    "user {} lacks {capability:?} for center {center_id}",
                    self.user_id
                ),
            })
        }
    }
}

/// Data handed to the notifier after a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct EmailContext {
    /// Center display name
    pub center_name: String,
    /// Reporting week
    pub reporting_date: NaiveDate,
    /// Submitting user
    pub submitted_by: i64,
    /// Submitter's comment
    pub comment: Option<String>,
    /// Points of the reporting week's scoreboard
    pub points: u32,
    /// Rating label of the reporting week's scoreboard
    pub rating: String,
    /// Warnings that were accepted with the submission
    pub warning_count: usize,
}

/// Notification collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends the "statistics received" notification for `report`.
    async fn send(&self, report: &stats_report::Model, context: &EmailContext) -> Result<()>;
}

/// Notifier that only writes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, report: &stats_report::Model, context: &EmailContext) -> Result<()> {
        info!(
            report_id = report.id,
            center = %context.center_name,
            reporting_date = %context.reporting_date,
            rating = %context.rating,
            "Statistics received"
        );
        Ok(())
    }
}
