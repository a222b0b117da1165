//! Submission coordinator - the operations a center uses during a reporting week.
//!
//! A center-week moves through [`SubmissionState`]s: it starts `Uninitialized`, becomes
//! a `Draft` with the first stash write, is `Validating` and `Committing` while
//! [`SubmissionCoordinator::complete_submission`] runs, and ends `Finalized` or
//! `Rejected`. Preconditions (weekday, active center, configured quarter, capabilities,
//! submission cutoff) fail with an [`Error`]; validation and commit failures are turned
//! into a [`SubmissionOutcome`].

/// Accountability holder assignments
pub mod accountability;
/// Values derived from the roster
pub mod actuals;
/// The atomic commit
pub mod commit;
/// Last official report plus stash
pub mod merge;
/// Identity and weekly table access
pub mod records;

use crate::config::settings::EngineSettings;
use crate::core::context::{Capability, EmailContext, Notifier, RequestContext};
use crate::core::reporting::{
    find_draft_report, find_or_create_draft_report, following_quarters, get_active_center,
    official_report, require_configured_quarter, require_reporting_weekday,
};
use crate::core::scoreboard::Scoreboard;
use crate::core::scoreboard_lock::ScoreboardLockQuarter;
use crate::core::stash::{self, StashType, scoreboard_week};
use crate::core::validation::{
    ValidationContext, ValidationGroup, ValidationMessage, ValidationResult, validate_submission,
};
use crate::entities::{accountability_mapping, center, quarter};
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use commit::{CommitPlan, commit_submission};
use merge::{MergeScope, MergedSubmission, merge_submission};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{Value as Json, json};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Message returned when the report was stored but the notification failed.
pub const NOTIFICATION_DEGRADED_MESSAGE: &str =
    "stats received, but notification could not be sent";

/// Message returned for a fully successful submission.
pub const SUBMITTED_MESSAGE: &str = "stats received";

/// Quarters offered as incoming quarters for new team members and applications.
const INCOMING_QUARTER_COUNT: u64 = 3;

/// Lifecycle of a center-week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionState {
    /// Nothing stashed yet
    Uninitialized,
    /// Edits are being stashed
    Draft,
    /// Running the validation pipeline
    Validating,
    /// Writing the report
    Committing,
    /// The report is official
    Finalized,
    /// Validation or the commit failed; nothing was written
    Rejected,
}

/// Outcome of [`SubmissionCoordinator::complete_submission`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    /// The report is official
    pub success: bool,
    /// Final state
    pub state: SubmissionState,
    /// Human-readable summary
    pub message: String,
    /// Locked report, when finalized
    pub report_id: Option<i64>,
    /// Validation result the decision was based on
    pub validation: Option<ValidationResult>,
    /// Steps completed before a commit failure
    pub diagnostics: Option<String>,
}

impl SubmissionOutcome {
    fn rejected(message: impl Into<String>, validation: Option<ValidationResult>, diagnostics: Option<String>) -> Self {
        Self {
            success: false,
            state: SubmissionState::Rejected,
            message: message.into(),
            report_id: None,
            validation,
            diagnostics,
        }
    }
}

/// Lookups a client needs to start editing a center-week.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInit {
    /// Current state of the week
    pub state: SubmissionState,
    /// The center
    pub center: center::Model,
    /// Reporting week
    pub reporting_date: NaiveDate,
    /// Quarter of the reporting week
    pub quarter: quarter::Model,
    /// Every reporting week of the quarter
    pub reporting_dates: Vec<NaiveDate>,
    /// Quarters a new team member may start in: this one and the following ones
    pub start_quarters: Vec<quarter::Model>,
    /// Quarters an application may register for
    pub registration_quarters: Vec<quarter::Model>,
    /// Accountability holders on the reporting date
    pub accountabilities: Vec<accountability_mapping::Model>,
    /// Scoreboard edit windows
    pub locks: Json,
}

/// Acknowledgement of a stash write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StashReceipt {
    /// Always [`SubmissionState::Draft`]
    pub state: SubmissionState,
    /// Kind of entry written
    pub stored_type: &'static str,
    /// Id the entry is stored under
    pub stored_id: i64,
    /// Draft report collecting the week's activity
    pub report_id: i64,
    /// Validation messages about the written entity in the merged submission
    pub messages: Vec<ValidationMessage>,
}

/// Everything resolved for a center-week before an operation runs.
#[derive(Debug, Clone)]
struct WeekScope {
    center: center::Model,
    quarter: quarter::Model,
    reporting_date: NaiveDate,
    reporting_dates: Vec<NaiveDate>,
    locks: ScoreboardLockQuarter,
}

impl WeekScope {
    fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            reporting_date: self.reporting_date,
            quarter: self.quarter.clone(),
            locks: self.locks.clone(),
        }
    }
}

/// Runs the weekly submission lifecycle against one database.
pub struct SubmissionCoordinator {
    db: DatabaseConnection,
    settings: EngineSettings,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for SubmissionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionCoordinator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SubmissionCoordinator {
    /// Creates a coordinator.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: EngineSettings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            settings,
            notifier,
        }
    }

    /// Settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    async fn resolve_week(&self, center_id: i64, reporting_date: NaiveDate) -> Result<WeekScope> {
        require_reporting_weekday(reporting_date, self.settings.reporting_weekday)?;
        let center = get_active_center(&self.db, center_id).await?;
        let quarter = require_configured_quarter(&self.db, reporting_date).await?;
        let reporting_dates = quarter.reporting_dates(self.settings.reporting_weekday);
        let locks = ScoreboardLockQuarter::load(
            &self.db,
            center.id,
            quarter.id,
            &reporting_dates,
            reporting_date,
        )
        .await?;
        Ok(WeekScope {
            center,
            quarter,
            reporting_date,
            reporting_dates,
            locks,
        })
    }

    /// Checks every write precondition.
    async fn writable_week(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
    ) -> Result<WeekScope> {
        ctx.require(Capability::SubmitStats, center_id)?;
        if let Some(earliest) = self.settings.earliest_submission_date {
            if reporting_date < earliest
                && !ctx.can(Capability::OverrideReportingDateCutoff, center_id)
            {
                return Err(Error::bad_request(format!(
                    "Reports for {reporting_date} are closed; the earliest accepted date is {earliest}"
                )));
            }
        }
        self.resolve_week(center_id, reporting_date).await
    }

    async fn merged(&self, scope: &WeekScope) -> Result<MergedSubmission> {
        merge_submission(
            &self.db,
            MergeScope {
                center_id: scope.center.id,
                reporting_date: scope.reporting_date,
                reporting_dates: &scope.reporting_dates,
                locks: &scope.locks,
                parse_mode: self.settings.parse_mode,
            },
        )
        .await
    }

    /// Read-only lookups for the submission UI.
    ///
    /// Fails with [`Error::BadRequest`] for a date off the reporting weekday, an inactive
    /// center, or a quarter with unconfigured milestones.
    #[instrument(skip(self, ctx), fields(user_id = ctx.user_id))]
    pub async fn init_submission(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
    ) -> Result<SubmissionInit> {
        ctx.require(Capability::ViewSubmissionUi, center_id)?;
        let scope = self.resolve_week(center_id, reporting_date).await?;

        let following = following_quarters(&self.db, &scope.quarter, INCOMING_QUARTER_COUNT).await?;
        let mut start_quarters = vec![scope.quarter.clone()];
        start_quarters.extend(following.iter().cloned());
        let accountabilities =
            accountability::active_mappings(&self.db, center_id, reporting_date).await?;

        let state = if official_report(&self.db, center_id, reporting_date)
            .await?
            .is_some()
        {
            SubmissionState::Finalized
        } else if find_draft_report(&self.db, center_id, reporting_date)
            .await?
            .is_some()
        {
            SubmissionState::Draft
        } else {
            SubmissionState::Uninitialized
        };
        info!(center_id, %reporting_date, ?state, "Submission initialized");

        Ok(SubmissionInit {
            state,
            locks: scope.locks.to_json(),
            center: scope.center,
            reporting_date,
            quarter: scope.quarter,
            reporting_dates: scope.reporting_dates,
            start_quarters,
            registration_quarters: following,
            accountabilities,
        })
    }

    async fn stash_entity(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
        stored_type: StashType,
        data: Json,
    ) -> Result<StashReceipt> {
        let scope = self.writable_week(ctx, center_id, reporting_date).await?;
        let schema = stored_type
            .schema()
            .ok_or_else(|| Error::bad_request(format!("{stored_type} has no entity schema")))?;
        // Reject payloads that do not cast before anything is written.
        crate::core::parser_domain::Domain::from_json(schema, &data, self.settings.parse_mode)?;

        let group = match stored_type {
            StashType::Application => ValidationGroup::Applications,
            StashType::TeamMember => ValidationGroup::TeamMembers,
            StashType::Course => ValidationGroup::Courses,
            StashType::ProgramLeader => ValidationGroup::ProgramLeaders,
            StashType::ScoreboardWeek => ValidationGroup::Scoreboard,
        };
        self.store_and_check(ctx, &scope, stored_type, group, data).await
    }

    async fn store_and_check(
        &self,
        ctx: &RequestContext<'_>,
        scope: &WeekScope,
        stored_type: StashType,
        group: ValidationGroup,
        data: Json,
    ) -> Result<StashReceipt> {
        let report = find_or_create_draft_report(
            &self.db,
            scope.center.id,
            scope.reporting_date,
            scope.quarter.id,
            ctx.now,
        )
        .await?;
        let row = stash::store(
            &self.db,
            scope.center.id,
            scope.reporting_date,
            stored_type,
            data,
            ctx.user_id,
            ctx.now,
        )
        .await?;

        let merged = self.merged(scope).await?;
        let result = validate_submission(&merged.view(), &scope.validation_context());
        let messages = result
            .group(group)
            .iter()
            .filter(|message| message.reference.id == Some(row.stored_id))
            .cloned()
            .collect();

        info!(
            center_id = scope.center.id,
            reporting_date = %scope.reporting_date,
            %stored_type,
            stored_id = row.stored_id,
            state = ?SubmissionState::Draft,
            "Stashed"
        );
        Ok(StashReceipt {
            state: SubmissionState::Draft,
            stored_type: stored_type.key(),
            stored_id: row.stored_id,
            report_id: report.id,
            messages,
        })
    }

    /// Stashes an application draft.
    #[instrument(skip(self, ctx, data), fields(user_id = ctx.user_id))]
    pub async fn stash_application(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
        data: Json,
    ) -> Result<StashReceipt> {
        self.stash_entity(ctx, center_id, reporting_date, StashType::Application, data)
            .await
    }

    /// Stashes a team member draft.
    #[instrument(skip(self, ctx, data), fields(user_id = ctx.user_id))]
    pub async fn stash_team_member(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
        data: Json,
    ) -> Result<StashReceipt> {
        self.stash_entity(ctx, center_id, reporting_date, StashType::TeamMember, data)
            .await
    }

    /// Stashes a course draft.
    #[instrument(skip(self, ctx, data), fields(user_id = ctx.user_id))]
    pub async fn stash_course(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
        data: Json,
    ) -> Result<StashReceipt> {
        self.stash_entity(ctx, center_id, reporting_date, StashType::Course, data)
            .await
    }

    /// Stashes a program leader draft.
    #[instrument(skip(self, ctx, data), fields(user_id = ctx.user_id))]
    pub async fn stash_program_leader(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
        data: Json,
    ) -> Result<StashReceipt> {
        self.stash_entity(ctx, center_id, reporting_date, StashType::ProgramLeader, data)
            .await
    }

    /// Stashes one week of scoreboard values.
    ///
    /// The payload names its `week`, which must be a reporting week of the quarter whose
    /// edit window is not fully closed.
    #[instrument(skip(self, ctx, data), fields(user_id = ctx.user_id))]
    pub async fn stash_scoreboard(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
        data: Json,
    ) -> Result<StashReceipt> {
        let scope = self.writable_week(ctx, center_id, reporting_date).await?;
        let week = scoreboard_week(&data)?;
        if !scope.reporting_dates.contains(&week) {
            return Err(Error::bad_request(format!(
                "{week} is not a reporting week of quarter {} {}",
                scope.quarter.t1_distinction, scope.quarter.year
            )));
        }
        Scoreboard::from_json(&data)?;
        let lock = scope.locks.get(week);
        if !lock.edit_promise && !lock.edit_actual {
            return Err(Error::bad_request(format!("Scoreboard for {week} is locked")));
        }

        self.store_and_check(ctx, &scope, StashType::ScoreboardWeek, ValidationGroup::Scoreboard, data)
            .await
    }

    /// Flags a stashed entity as deleted.
    #[instrument(skip(self, ctx), fields(user_id = ctx.user_id))]
    pub async fn delete_stashed(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
        stored_type: StashType,
        stored_id: i64,
    ) -> Result<()> {
        self.writable_week(ctx, center_id, reporting_date).await?;
        stash::delete_one(
            &self.db,
            center_id,
            reporting_date,
            stored_type,
            stored_id,
            ctx.user_id,
            ctx.now,
        )
        .await
    }

    /// Merged scoreboards of the quarter with their edit windows.
    #[instrument(skip(self, ctx), fields(user_id = ctx.user_id))]
    pub async fn get_scoreboard(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
    ) -> Result<Json> {
        ctx.require(Capability::ViewSubmissionUi, center_id)?;
        let scope = self.resolve_week(center_id, reporting_date).await?;
        let merged = self.merged(&scope).await?;
        Ok(json!({
            "reportingDate": reporting_date,
            "weeks": merged.scoreboards.to_json(),
            "locks": scope.locks.to_json(),
        }))
    }

    /// Validates the merged submission without writing anything.
    #[instrument(skip(self, ctx), fields(user_id = ctx.user_id))]
    pub async fn validate(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
    ) -> Result<ValidationResult> {
        ctx.require(Capability::SubmitStats, center_id)?;
        let scope = self.resolve_week(center_id, reporting_date).await?;
        let merged = self.merged(&scope).await?;
        let result = validate_submission(&merged.view(), &scope.validation_context());
        info!(
            center_id,
            %reporting_date,
            state = ?SubmissionState::Validating,
            valid = result.valid,
            errors = result.error_count(),
            warnings = result.warning_count(),
            "Validated submission"
        );
        Ok(result)
    }

    /// Validates, commits and notifies.
    ///
    /// Precondition failures are errors. An invalid submission or a failed commit is
    /// `Rejected` with nothing written; a failed notification still counts as success.
    #[instrument(skip(self, ctx, comment), fields(user_id = ctx.user_id))]
    pub async fn complete_submission(
        &self,
        ctx: &RequestContext<'_>,
        center_id: i64,
        reporting_date: NaiveDate,
        comment: Option<String>,
    ) -> Result<SubmissionOutcome> {
        let scope = self.writable_week(ctx, center_id, reporting_date).await?;

        info!(state = ?SubmissionState::Validating, "Completing submission");
        let merged = self.merged(&scope).await?;
        let validation = validate_submission(&merged.view(), &scope.validation_context());
        if !validation.valid {
            warn!(
                state = ?SubmissionState::Rejected,
                errors = validation.error_count(),
                "Submission failed validation"
            );
            return Ok(SubmissionOutcome::rejected(
                format!(
                    "Submission has {} validation error(s)",
                    validation.error_count()
                ),
                Some(validation),
                None,
            ));
        }

        info!(state = ?SubmissionState::Committing, "Committing submission");
        let plan = CommitPlan {
            center: &scope.center,
            quarter: &scope.quarter,
            reporting_date,
            user_id: ctx.user_id,
            now: ctx.now,
            comment: comment.as_deref(),
            validation: &validation,
            grace_days: self.settings.accountability_grace_days,
        };
        let mut trail = Vec::new();
        let receipt = match commit_submission(&self.db, &merged, &plan, &mut trail).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!(
                    state = ?SubmissionState::Rejected,
                    error = %err,
                    trail = ?trail,
                    "Submission commit failed"
                );
                return Ok(SubmissionOutcome::rejected(
                    format!("Submission could not be saved: {err}"),
                    Some(validation),
                    Some(trail.join("; ")),
                ));
            }
        };
        info!(
            state = ?SubmissionState::Finalized,
            report_id = receipt.report.id,
            "Submission finalized"
        );

        let email = EmailContext {
            center_name: scope.center.name.clone(),
            reporting_date,
            submitted_by: ctx.user_id,
            comment,
            points: receipt.scoreboard.points(),
            rating: receipt.scoreboard.rating().label().to_string(),
            warning_count: validation.warning_count(),
        };
        let message = match self.notifier.send(&receipt.report, &email).await {
            Ok(()) => SUBMITTED_MESSAGE,
            Err(err) => {
                warn!(report_id = receipt.report.id, error = %err, "Notification failed");
                NOTIFICATION_DEGRADED_MESSAGE
            }
        };

        Ok(SubmissionOutcome {
            success: true,
            state: SubmissionState::Finalized,
            message: message.to_string(),
            report_id: Some(receipt.report.id),
            validation: Some(validation),
            diagnostics: None,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::context::Capability;
    use crate::core::scoreboard_lock::WeekLock;
    use crate::entities::{
        Application, ApplicationData, CenterStatsData, StatsReport, SubmissionData, TeamMember,
        accountability_mapping, application_data, center_stats_data, stats_report, submission_data,
    };
    use crate::test_utils::{
        Allow, AllowAll, FailingNotifier, RecordingNotifier, create_test_center,
        create_test_quarter, create_unconfigured_quarter, friday, setup_test_db,
    };
    use chrono::Utc;
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    const WEEK: &str = "2026-10-16";

    struct Fixture {
        coordinator: SubmissionCoordinator,
        notifier: Arc<RecordingNotifier>,
        center: center::Model,
        quarter: quarter::Model,
        week: NaiveDate,
    }

    async fn fixture_with(settings: EngineSettings) -> Result<Fixture> {
        let db = setup_test_db().await?;
        let center = create_test_center(&db, "Springfield", true).await?;
        let quarter = create_test_quarter(&db).await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let shared: Arc<dyn Notifier> = Arc::clone(&notifier) as Arc<dyn Notifier>;
        let coordinator = SubmissionCoordinator::new(db, settings, shared);
        Ok(Fixture {
            coordinator,
            notifier,
            center,
            quarter,
            week: friday(2026, 10, 16),
        })
    }

    async fn fixture() -> Result<Fixture> {
        fixture_with(EngineSettings::default()).await
    }

    fn full_scoreboard() -> Json {
        json!({
            "week": WEEK,
            "promise": { "cap": 10, "cpc": 5, "t1x": 2, "t2x": 1, "gitw": 80, "lf": 4 },
            "actual": { "cap": 9, "cpc": 5, "t1x": 2, "t2x": 0, "gitw": 75, "lf": 4 },
        })
    }

    fn new_member() -> Json {
        json!({
            "id": -1,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "team_year": 1,
            "gitw": true,
            "tdo": 1,
            "travel": true,
            "room": true,
            "accountabilities": ["t1tl"],
        })
    }

    fn new_application() -> Json {
        json!({
            "id": -2,
            "first_name": "Alan",
            "last_name": "Turing",
            "team_year": 1,
            "reg_date": "2026-10-12",
            "committed_team_member_id": -1,
        })
    }

    fn program_manager() -> Json {
        json!({
            "id": -3,
            "accountability": "programManager",
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.org",
            "attending_weekend": true,
        })
    }

    async fn stash_full_week(f: &Fixture, ctx: &RequestContext<'_>) -> Result<()> {
        let (c, id, week) = (&f.coordinator, f.center.id, f.week);
        c.stash_team_member(ctx, id, week, new_member()).await?;
        c.stash_application(ctx, id, week, new_application()).await?;
        c.stash_program_leader(ctx, id, week, program_manager()).await?;
        c.stash_scoreboard(ctx, id, week, full_scoreboard()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_submission_commits_everything() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let db = &f.coordinator.db;
        stash_full_week(&f, &ctx).await?;

        let outcome = f
            .coordinator
            .complete_submission(&ctx, f.center.id, f.week, Some("all good".to_string()))
            .await?;
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.state, SubmissionState::Finalized);
        assert_eq!(outcome.message, SUBMITTED_MESSAGE);

        let report_id = outcome.report_id.unwrap();
        let report = StatsReport::find_by_id(report_id).one(db).await?.unwrap();
        assert!(report.locked && report.validated);
        assert_eq!(report.submitted_by, Some(7));
        assert_eq!(report.comment.as_deref(), Some("all good"));
        assert_eq!(
            official_report(db, f.center.id, f.week).await?.map(|r| r.id),
            Some(report_id)
        );

        let members = TeamMember::find().all(db).await?;
        assert_eq!(members.len(), 1);
        let app_data = ApplicationData::find()
            .filter(application_data::Column::StatsReportId.eq(report_id))
            .one(db)
            .await?
            .unwrap();
        assert_eq!(app_data.committed_team_member_id, Some(members[0].id));

        let actual = CenterStatsData::find()
            .filter(center_stats_data::Column::StatsReportId.eq(report_id))
            .filter(center_stats_data::Column::Kind.eq(center_stats_data::KIND_ACTUAL))
            .filter(center_stats_data::Column::WeekDate.eq(f.week))
            .one(db)
            .await?
            .unwrap();
        assert_eq!(actual.cap, Some(9));
        assert_eq!(actual.tdo, Some(100));
        assert_eq!(actual.program_manager_attending_weekend, Some(1));

        let held = accountability::active_mappings(db, f.center.id, f.week).await?;
        let names: Vec<&str> = held.iter().map(|m| m.accountability.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"t1tl") && names.contains(&"programManager"));

        let pending = SubmissionData::find()
            .filter(submission_data::Column::ConsumedAt.is_null())
            .count(db)
            .await?;
        assert_eq!(pending, 0);

        let sent = f.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, report_id);
        assert_eq!(sent[0].1.comment.as_deref(), Some("all good"));
        Ok(())
    }

    #[tokio::test]
    async fn test_resubmission_does_not_duplicate_entities() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let db = &f.coordinator.db;
        stash_full_week(&f, &ctx).await?;

        let first = f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await?;
        let second = f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await?;
        assert!(first.success && second.success, "{second:?}");
        assert_ne!(first.report_id, second.report_id);

        assert_eq!(TeamMember::find().count(db).await?, 1);
        assert_eq!(Application::find().count(db).await?, 1);
        assert_eq!(
            official_report(db, f.center.id, f.week).await?.map(|r| r.id),
            second.report_id
        );
        let mappings = accountability_mapping::Entity::find().count(db).await?;
        assert_eq!(mappings, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_remapped_pending_id_cannot_be_restashed() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        stash_full_week(&f, &ctx).await?;
        f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await?;

        let result = f
            .coordinator
            .stash_team_member(&ctx, f.center.id, f.week, new_member())
            .await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_submission_is_rejected_without_writes() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let db = &f.coordinator.db;
        f.coordinator
            .stash_team_member(&ctx, f.center.id, f.week, new_member())
            .await?;

        let outcome = f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await?;
        assert!(!outcome.success);
        assert_eq!(outcome.state, SubmissionState::Rejected);
        let validation = outcome.validation.unwrap();
        assert!(!validation.valid);
        assert!(
            validation
                .group(ValidationGroup::Scoreboard)
                .iter()
                .any(|m| m.id == "SCOREBOARD_NOT_UPDATED")
        );

        assert_eq!(TeamMember::find().count(db).await?, 0);
        let locked = StatsReport::find()
            .filter(stats_report::Column::Locked.eq(true))
            .count(db)
            .await?;
        assert_eq!(locked, 0);
        assert!(f.notifier.sent.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let db = &f.coordinator.db;
        let mut missing_app = new_application();
        missing_app["id"] = json!(999);

        f.coordinator
            .stash_team_member(&ctx, f.center.id, f.week, new_member())
            .await?;
        f.coordinator
            .stash_application(&ctx, f.center.id, f.week, missing_app)
            .await?;
        f.coordinator
            .stash_scoreboard(&ctx, f.center.id, f.week, full_scoreboard())
            .await?;

        let outcome = f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await?;
        assert!(!outcome.success);
        assert_eq!(outcome.state, SubmissionState::Rejected);
        let diagnostics = outcome.diagnostics.unwrap();
        assert!(diagnostics.contains("team members: 1 created"), "{diagnostics}");
        assert!(diagnostics.contains("failed:"), "{diagnostics}");
        assert!(outcome.message.contains("999 not found"), "{}", outcome.message);

        assert_eq!(TeamMember::find().count(db).await?, 0);
        assert_eq!(CenterStatsData::find().count(db).await?, 0);
        assert!(official_report(db, f.center.id, f.week).await?.is_none());
        let member_row = SubmissionData::find()
            .filter(submission_data::Column::StoredType.eq(StashType::TeamMember.key()))
            .one(db)
            .await?
            .unwrap();
        assert_eq!(member_row.stored_id, -1);
        assert!(member_row.consumed_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_notification_failure_still_finalizes() -> Result<()> {
        let db = setup_test_db().await?;
        let center = create_test_center(&db, "Springfield", true).await?;
        create_test_quarter(&db).await?;
        let coordinator =
            SubmissionCoordinator::new(db, EngineSettings::default(), Arc::new(FailingNotifier));
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let week = friday(2026, 10, 16);
        coordinator
            .stash_scoreboard(&ctx, center.id, week, full_scoreboard())
            .await?;

        let outcome = coordinator.complete_submission(&ctx, center.id, week, None).await?;
        assert!(outcome.success);
        assert_eq!(outcome.state, SubmissionState::Finalized);
        assert_eq!(outcome.message, NOTIFICATION_DEGRADED_MESSAGE);
        assert!(official_report(&coordinator.db, center.id, week).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_capabilities_are_enforced() -> Result<()> {
        let f = fixture().await?;
        let viewer = Allow(&[Capability::ViewSubmissionUi]);
        let ctx = RequestContext::new(7, Utc::now(), &viewer);

        let stash = f
            .coordinator
            .stash_team_member(&ctx, f.center.id, f.week, new_member())
            .await;
        assert!(matches!(stash, Err(Error::Forbidden { .. })));
        let submit = f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await;
        assert!(matches!(submit, Err(Error::Forbidden { .. })));
        assert!(f.coordinator.get_scoreboard(&ctx, f.center.id, f.week).await.is_ok());

        let submitter = Allow(&[Capability::SubmitStats]);
        let ctx = RequestContext::new(7, Utc::now(), &submitter);
        let init = f.coordinator.init_submission(&ctx, f.center.id, f.week).await;
        assert!(matches!(init, Err(Error::Forbidden { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_earliest_submission_date_needs_override() -> Result<()> {
        let settings = EngineSettings {
            earliest_submission_date: Some(friday(2026, 10, 23)),
            ..EngineSettings::default()
        };
        let f = fixture_with(settings).await?;

        let submitter = Allow(&[Capability::SubmitStats]);
        let ctx = RequestContext::new(7, Utc::now(), &submitter);
        let blocked = f
            .coordinator
            .stash_scoreboard(&ctx, f.center.id, f.week, full_scoreboard())
            .await;
        assert!(matches!(blocked, Err(Error::BadRequest { .. })));

        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let receipt = f
            .coordinator
            .stash_scoreboard(&ctx, f.center.id, f.week, full_scoreboard())
            .await?;
        assert_eq!(receipt.stored_type, "scoreboard_week");
        assert_eq!(receipt.state, SubmissionState::Draft);
        Ok(())
    }

    #[tokio::test]
    async fn test_precondition_failures() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);

        let thursday = friday(2026, 10, 15);
        let result = f.coordinator.init_submission(&ctx, f.center.id, thursday).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        let closed = create_test_center(&f.coordinator.db, "Closed", false).await?;
        let result = f.coordinator.validate(&ctx, closed.id, f.week).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        create_unconfigured_quarter(&f.coordinator.db).await?;
        let result = f
            .coordinator
            .init_submission(&ctx, f.center.id, friday(2026, 12, 4))
            .await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_scoreboard_week_must_be_open() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let dates = f.quarter.reporting_dates(f.coordinator.settings().reporting_weekday);
        let closed_week = friday(2026, 10, 2);

        let mut locks = ScoreboardLockQuarter::new(f.center.id, f.quarter.id, &dates, f.week);
        locks.set(
            closed_week,
            WeekLock {
                edit_promise: false,
                edit_actual: false,
            },
        );
        locks.save(&f.coordinator.db).await?;

        let locked = f
            .coordinator
            .stash_scoreboard(
                &ctx,
                f.center.id,
                f.week,
                json!({ "week": "2026-10-02", "actual": { "cap": 1 } }),
            )
            .await;
        assert!(matches!(locked, Err(Error::BadRequest { .. })));

        let outside = f
            .coordinator
            .stash_scoreboard(
                &ctx,
                f.center.id,
                f.week,
                json!({ "week": "2027-01-01", "promise": { "cap": 1 } }),
            )
            .await;
        assert!(matches!(outside, Err(Error::BadRequest { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_stash_receipt_reports_entity_messages() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let mut incomplete = new_application();
        incomplete["last_name"] = Json::Null;

        let receipt = f
            .coordinator
            .stash_application(&ctx, f.center.id, f.week, incomplete)
            .await?;
        assert_eq!(receipt.stored_id, -2);
        assert!(receipt.messages.iter().any(|m| m.id == "APP_MISSING_FIELD"));
        assert!(receipt.messages.iter().all(|m| m.reference.id == Some(-2)));

        f.coordinator
            .delete_stashed(&ctx, f.center.id, f.week, StashType::Application, -2)
            .await?;
        let result = f.coordinator.validate(&ctx, f.center.id, f.week).await?;
        assert!(result.group(ValidationGroup::Applications).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_init_and_scoreboard_follow_the_lifecycle() -> Result<()> {
        let f = fixture().await?;
        create_unconfigured_quarter(&f.coordinator.db).await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);

        let init = f.coordinator.init_submission(&ctx, f.center.id, f.week).await?;
        assert_eq!(init.state, SubmissionState::Uninitialized);
        assert_eq!(init.start_quarters.len(), 2);
        assert_eq!(init.registration_quarters.len(), 1);
        assert_eq!(init.reporting_dates.len(), 12);

        f.coordinator
            .stash_scoreboard(&ctx, f.center.id, f.week, full_scoreboard())
            .await?;
        let init = f.coordinator.init_submission(&ctx, f.center.id, f.week).await?;
        assert_eq!(init.state, SubmissionState::Draft);

        let scoreboard = f.coordinator.get_scoreboard(&ctx, f.center.id, f.week).await?;
        assert_eq!(scoreboard["reportingDate"], json!(WEEK));
        assert_eq!(scoreboard["weeks"][WEEK]["actual"]["cap"], json!(9));

        f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await?;
        let init = f.coordinator.init_submission(&ctx, f.center.id, f.week).await?;
        assert_eq!(init.state, SubmissionState::Finalized);
        assert_eq!(init.accountabilities.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_committed_member_fails_validation() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let mut orphan = new_application();
        orphan["committed_team_member_id"] = json!(-5);
        f.coordinator
            .stash_application(&ctx, f.center.id, f.week, orphan)
            .await?;
        f.coordinator
            .stash_scoreboard(&ctx, f.center.id, f.week, full_scoreboard())
            .await?;

        let result = f.coordinator.validate(&ctx, f.center.id, f.week).await?;
        assert!(!result.valid);
        assert!(
            result
                .group(ValidationGroup::Applications)
                .iter()
                .any(|m| m.id == "APP_COMMITTED_MEMBER_UNKNOWN")
        );

        let outcome = f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await?;
        assert_eq!(outcome.state, SubmissionState::Rejected);
        assert!(outcome.diagnostics.is_none());
        assert_eq!(outcome.validation, Some(result));
        Ok(())
    }

    #[tokio::test]
    async fn test_original_promises_survive_commit() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let db = &f.coordinator.db;
        let mut week = full_scoreboard();
        week["original"] = json!({ "cap": 12 });
        f.coordinator
            .stash_scoreboard(&ctx, f.center.id, f.week, week)
            .await?;

        let outcome = f.coordinator.complete_submission(&ctx, f.center.id, f.week, None).await?;
        assert!(outcome.success, "{outcome:?}");
        let original = CenterStatsData::find()
            .filter(center_stats_data::Column::StatsReportId.eq(outcome.report_id.unwrap()))
            .filter(center_stats_data::Column::Kind.eq(center_stats_data::KIND_ORIGINAL))
            .one(db)
            .await?
            .unwrap();
        assert_eq!(original.cap, Some(12));

        let next_week = friday(2026, 10, 23);
        let scoreboard = f.coordinator.get_scoreboard(&ctx, f.center.id, next_week).await?;
        assert_eq!(scoreboard["weeks"][WEEK]["original"]["cap"], json!(12));
        assert_eq!(scoreboard["weeks"][WEEK]["promise"]["cap"], json!(10));
        Ok(())
    }

    #[tokio::test]
    async fn test_shared_accountability_is_rejected() -> Result<()> {
        let f = fixture().await?;
        let ctx = RequestContext::new(7, Utc::now(), &AllowAll);
        let mut second = new_member();
        second["id"] = json!(-4);
        second["first_name"] = json!("Mary");
        f.coordinator
            .stash_team_member(&ctx, f.center.id, f.week, new_member())
            .await?;
        let receipt = f
            .coordinator
            .stash_team_member(&ctx, f.center.id, f.week, second)
            .await?;
        assert!(
            receipt
                .messages
                .iter()
                .any(|m| m.id == "TEAM_DUPLICATE_ACCOUNTABILITY")
        );
        Ok(())
    }
}
