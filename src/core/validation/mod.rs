//! Validation pipeline for a center-week submission.
//!
//! Each [`ValidationGroup`] has one validator. The pipeline runs two passes per group:
//!
//! 1. Changed data: every entity that differs from the last official report is checked
//!    against the group's rules.
//! 2. Stale data: for groups that must be re-confirmed every week, an entity that is due
//!    but unchanged produces an error of its own, even though no rule was violated.
//!
//! Messages are reduced into a [`ValidationResult`]; only `error` severity makes a
//! submission invalid.

/// Application rules
pub mod applications;
/// Course rules
pub mod courses;
/// Program leader rules
pub mod program_leaders;
/// Scoreboard rules
pub mod scoreboard;
/// Team member rules
pub mod team_members;

use crate::core::parser_domain::Domain;
use crate::core::scoreboard::Scoreboard;
use crate::core::scoreboard_lock::ScoreboardLockQuarter;
use crate::entities::quarter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Entity groups validated separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationGroup {
    /// Team applications
    Applications,
    /// Team members
    TeamMembers,
    /// Courses
    Courses,
    /// Program leaders
    ProgramLeaders,
    /// Weekly scoreboard
    Scoreboard,
}

impl ValidationGroup {
    /// All groups in reporting order.
    pub const ALL: [Self; 5] = [
        Self::Applications,
        Self::TeamMembers,
        Self::Courses,
        Self::ProgramLeaders,
        Self::Scoreboard,
    ];

    /// Key used in results.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Applications => "applications",
            Self::TeamMembers => "teamMembers",
            Self::Courses => "courses",
            Self::ProgramLeaders => "programLeaders",
            Self::Scoreboard => "scoreboard",
        }
    }

    /// Whether due entities must be changed every week.
    #[must_use]
    pub const fn update_required(self) -> bool {
        matches!(self, Self::Scoreboard)
    }
}

impl fmt::Display for ValidationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the submission
    Error,
    /// Reported but accepted
    Warning,
}

/// What a message is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Group of the offending entity
    pub group: ValidationGroup,
    /// Entity id, or the week as `yyyymmdd` for scoreboard weeks
    pub id: Option<i64>,
    /// Offending field
    pub field: Option<String>,
}

impl EntityRef {
    /// Reference to a whole entity.
    #[must_use]
    pub const fn entity(group: ValidationGroup, id: Option<i64>) -> Self {
        Self {
            group,
            id,
            field: None,
        }
    }

    /// Reference to one field of an entity.
    #[must_use]
    pub fn field(group: ValidationGroup, id: Option<i64>, field: &str) -> Self {
        Self {
            group,
            id,
            field: Some(field.to_string()),
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Stable message code (e.g., `"APP_REG_DATE_MISSING"`)
    pub id: String,
    /// Severity
    pub severity: Severity,
    /// Offending entity or field
    pub reference: EntityRef,
    /// Interpolated text
    pub message: String,
}

impl ValidationMessage {
    /// An error-severity message.
    #[must_use]
    pub fn error(id: &str, reference: EntityRef, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            severity: Severity::Error,
            reference,
            message: message.into(),
        }
    }

    /// A warning-severity message.
    #[must_use]
    pub fn warning(id: &str, reference: EntityRef, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            severity: Severity::Warning,
            reference,
            message: message.into(),
        }
    }

    /// Whether this message blocks the submission.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of validating a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// No message has error severity
    pub valid: bool,
    /// Messages per group; groups without messages are absent
    pub messages: BTreeMap<ValidationGroup, Vec<ValidationMessage>>,
}

impl ValidationResult {
    /// Reduces per-group message lists into a result.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (ValidationGroup, Vec<ValidationMessage>)>,
    {
        let messages = groups.into_iter().fold(
            BTreeMap::<ValidationGroup, Vec<ValidationMessage>>::new(),
            |mut acc, (group, found)| {
                if !found.is_empty() {
                    acc.entry(group).or_default().extend(found);
                }
                acc
            },
        );
        let valid = !messages.values().flatten().any(ValidationMessage::is_error);
        Self { valid, messages }
    }

    /// Number of error messages.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.messages.values().flatten().filter(|m| m.is_error()).count()
    }

    /// Number of warning messages.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.messages.values().flatten().filter(|m| !m.is_error()).count()
    }

    /// Messages of one group.
    #[must_use]
    pub fn group(&self, group: ValidationGroup) -> &[ValidationMessage] {
        self.messages.get(&group).map_or(&[], Vec::as_slice)
    }
}

/// Facts every validator may consult.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Reporting week being validated
    pub reporting_date: NaiveDate,
    /// Quarter the week belongs to
    pub quarter: quarter::Model,
    /// Edit windows of the quarter
    pub locks: ScoreboardLockQuarter,
}

impl ValidationContext {
    /// Whether the reporting week is past the quarter's second classroom.
    #[must_use]
    pub fn after_classroom2(&self) -> bool {
        self.quarter
            .classroom2_date
            .is_some_and(|classroom2| self.reporting_date > classroom2)
    }
}

/// An entity together with whether it changed since the last official report.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    /// Merged value
    pub value: T,
    /// Differs from the last official report
    pub changed: bool,
}

/// One scoreboard week of the merged view.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardWeek {
    /// Reporting week
    pub week: NaiveDate,
    /// Merged values
    pub scoreboard: Scoreboard,
}

/// The merged view of last official report plus stash, per group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionView {
    /// Applications
    pub applications: Vec<Tracked<Domain>>,
    /// Team members
    pub team_members: Vec<Tracked<Domain>>,
    /// Courses
    pub courses: Vec<Tracked<Domain>>,
    /// Program leaders
    pub program_leaders: Vec<Tracked<Domain>>,
    /// Scoreboard weeks of the quarter
    pub scoreboard: Vec<Tracked<ScoreboardWeek>>,
    /// Pending team member ids that resolve within this week, including those an earlier
    /// submission of the week already created
    pub pending_member_ids: BTreeSet<i64>,
}

/// Rules of one group.
pub trait GroupValidator {
    /// Entity type checked
    type Item;

    /// Group the messages belong to.
    fn group(&self) -> ValidationGroup;

    /// Checks one changed entity.
    fn validate(&self, item: &Self::Item, ctx: &ValidationContext) -> Vec<ValidationMessage>;

    /// For update-required groups: whether an unchanged entity is due this week.
    fn is_due(&self, _item: &Self::Item, _ctx: &ValidationContext) -> bool {
        false
    }

    /// Message for a due entity that was not updated.
    fn stale_message(&self, _item: &Self::Item, _ctx: &ValidationContext) -> Option<ValidationMessage> {
        None
    }
}

fn run_group<V>(validator: &V, items: &[Tracked<V::Item>], ctx: &ValidationContext) -> Vec<ValidationMessage>
where
    V: GroupValidator,
{
    let mut messages: Vec<ValidationMessage> = items
        .iter()
        .filter(|item| item.changed)
        .flat_map(|item| validator.validate(&item.value, ctx))
        .collect();

    if validator.group().update_required() {
        messages.extend(
            items
                .iter()
                .filter(|item| !item.changed && validator.is_due(&item.value, ctx))
                .filter_map(|item| validator.stale_message(&item.value, ctx)),
        );
    }
    messages
}

/// Runs both passes for every group, plus the checks that span entities.
#[must_use]
pub fn validate_submission(view: &SubmissionView, ctx: &ValidationContext) -> ValidationResult {
    let mut application_messages =
        run_group(&applications::ApplicationValidator, &view.applications, ctx);
    application_messages.extend(applications::unknown_committed_members(
        &view.applications,
        &view.pending_member_ids,
    ));
    let mut member_messages = run_group(&team_members::TeamMemberValidator, &view.team_members, ctx);
    member_messages.extend(team_members::duplicate_accountabilities(&view.team_members));

    ValidationResult::from_groups([
        (ValidationGroup::Applications, application_messages),
        (ValidationGroup::TeamMembers, member_messages),
        (
            ValidationGroup::Courses,
            run_group(&courses::CourseValidator, &view.courses, ctx),
        ),
        (
            ValidationGroup::ProgramLeaders,
            run_group(&program_leaders::ProgramLeaderValidator, &view.program_leaders, ctx),
        ),
        (
            ValidationGroup::Scoreboard,
            run_group(&scoreboard::ScoreboardValidator, &view.scoreboard, ctx),
        ),
    ])
}

/// Display name of a person-like domain for message text.
pub(crate) fn display_name(domain: &Domain) -> String {
    match (domain.str("first_name"), domain.str("last_name")) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.to_string(),
        _ => format!("#{}", domain.id().unwrap_or_default()),
    }
}

/// Error messages for required fields that are missing.
pub(crate) fn missing_required(domain: &Domain, group: ValidationGroup, code: &str) -> Vec<ValidationMessage> {
    domain
        .schema()
        .fields
        .iter()
        .filter(|spec| spec.options.required)
        .filter(|spec| *domain.get(spec.name) == crate::core::parser_domain::FieldValue::Null)
        .map(|spec| {
            ValidationMessage::error(
                code,
                EntityRef::field(group, domain.id(), spec.name),
                format!("{} is missing {}", display_name(domain), spec.name.replace('_', " ")),
            )
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::scoreboard_lock::ScoreboardLockQuarter;
    use crate::test_utils::friday;
    use chrono::Weekday;

    /// Context for the week of 2026-10-16 in a quarter with classroom 2 on 2026-10-09.
    pub(crate) fn context() -> ValidationContext {
        let quarter = quarter::Model {
            id: 1,
            t1_distinction: "Relatedness".to_string(),
            year: 2026,
            start_weekend_date: Some(friday(2026, 8, 21)),
            classroom1_date: Some(friday(2026, 9, 11)),
            classroom2_date: Some(friday(2026, 10, 9)),
            classroom3_date: Some(friday(2026, 10, 30)),
            end_weekend_date: Some(friday(2026, 11, 13)),
        };
        let reporting_date = friday(2026, 10, 16);
        let locks = ScoreboardLockQuarter::new(
            1,
            quarter.id,
            &quarter.reporting_dates(Weekday::Fri),
            reporting_date,
        );
        ValidationContext {
            reporting_date,
            quarter,
            locks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(severity: Severity) -> ValidationMessage {
        ValidationMessage {
            id: "TEST".to_string(),
            severity,
            reference: EntityRef::entity(ValidationGroup::Courses, Some(1)),
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_warnings_do_not_affect_validity() {
        let result = ValidationResult::from_groups([
            (ValidationGroup::Courses, vec![message(Severity::Warning)]),
            (ValidationGroup::Applications, vec![]),
        ]);
        assert!(result.valid);
        assert_eq!(result.warning_count(), 1);
        assert!(!result.messages.contains_key(&ValidationGroup::Applications));
    }

    #[test]
    fn test_any_error_invalidates() {
        let result = ValidationResult::from_groups([
            (ValidationGroup::Courses, vec![message(Severity::Warning)]),
            (ValidationGroup::Scoreboard, vec![message(Severity::Error)]),
        ]);
        assert!(!result.valid);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.group(ValidationGroup::Scoreboard).len(), 1);
        assert!(result.group(ValidationGroup::TeamMembers).is_empty());
    }

    #[test]
    fn test_empty_submission_is_valid() {
        let result = validate_submission(&SubmissionView::default(), &test_support::context());
        assert!(result.valid);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_results_serialize_with_group_keys() {
        let result = ValidationResult::from_groups([(
            ValidationGroup::TeamMembers,
            vec![message(Severity::Error)],
        )]);
        let json = serde_json::to_value(&result).unwrap_or_default();
        assert_eq!(json["valid"], serde_json::json!(false));
        assert_eq!(json["messages"]["teamMembers"][0]["severity"], serde_json::json!("error"));
    }
}
