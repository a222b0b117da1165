//! The atomic commit of a validated center-week.
//!
//! Everything happens inside one transaction. Any error rolls it back, so either the
//! whole submission is persisted or nothing is.

use super::accountability::{AccountabilityChanges, Assignment, apply_assignments, mapping_end};
use super::actuals::{self, DerivedActuals, PROMISE_TDO};
use super::merge::{MergedEntity, MergedGroup, MergedSubmission};
use super::records::{IdentityRecord, WeeklyRecord};
use crate::core::parser_domain::{Domain, FieldOwner, FieldValue};
use crate::core::reporting::{attach_to_global_report, find_or_create_draft_report};
use crate::core::scoreboard::{Game, Scoreboard, ValueKind};
use crate::core::stash::{self, EntryState};
use crate::core::validation::ValidationResult;
use crate::entities::accountability_mapping::{HOLDER_PROGRAM_LEADER, HOLDER_TEAM_MEMBER};
use crate::entities::{
    Application, ApplicationData, Course, CourseData, ProgramLeader, TeamMember, TeamMemberData,
    center, center_stats_data, quarter, stats_report,
};
use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, IntoActiveModel, QueryFilter, Set,
    TransactionTrait,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, error, info, warn};

/// What a commit needs besides the merged view.
#[derive(Debug, Clone, Copy)]
pub struct CommitPlan<'a> {
    /// Center being reported
    pub center: &'a center::Model,
    /// Quarter of the reporting week
    pub quarter: &'a quarter::Model,
    /// Reporting week
    pub reporting_date: NaiveDate,
    /// Submitting user
    pub user_id: i64,
    /// Submission time
    pub now: DateTime<Utc>,
    /// Submitter's comment
    pub comment: Option<&'a str>,
    /// Validation result accepted with the submission
    pub validation: &'a ValidationResult,
    /// Days past quarter end for new accountability mappings
    pub grace_days: i64,
}

/// Entities written per group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeCounts {
    /// New entities created from pending stash entries
    pub created: usize,
    /// Existing entities whose identity fields changed
    pub updated: usize,
    /// Entities carried into the report without identity changes
    pub carried: usize,
}

impl fmt::Display for MaterializeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} carried",
            self.created, self.updated, self.carried
        )
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    /// The locked report
    pub report: stats_report::Model,
    /// Global report the center is now linked from
    pub global_report_id: i64,
    /// Pending ids and the ids created for them, per stash type key
    pub created_ids: BTreeMap<&'static str, BTreeMap<i64, i64>>,
    /// Derived values stored with the reporting week
    pub derived: DerivedActuals,
    /// Accountability mapping changes
    pub accountability: AccountabilityChanges,
    /// Scoreboard of the reporting week as persisted
    pub scoreboard: Scoreboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Materialized {
    Created { pending: i64, id: i64 },
    Updated(i64),
    Carried(i64),
}

impl Materialized {
    const fn id(self) -> i64 {
        match self {
            Self::Created { id, .. } | Self::Updated(id) | Self::Carried(id) => id,
        }
    }

    fn count(self, counts: &mut MaterializeCounts) {
        match self {
            Self::Created { .. } => counts.created += 1,
            Self::Updated(_) => counts.updated += 1,
            Self::Carried(_) => counts.carried += 1,
        }
    }
}

/// Commits a merged submission atomically.
///
/// Each completed step is appended to `trail`; on failure the trail ends with the step
/// that failed and the transaction is rolled back.
pub async fn commit_submission<C>(
    db: &C,
    merged: &MergedSubmission,
    plan: &CommitPlan<'_>,
    trail: &mut Vec<String>,
) -> Result<CommitReceipt>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;
    match write_submission(&txn, merged, plan, trail).await {
        Ok(receipt) => {
            txn.commit().await?;
            trail.push(format!("committed report {}", receipt.report.id));
            Ok(receipt)
        }
        Err(error) => {
            trail.push(format!("failed: {error}"));
            warn!(
                center_id = plan.center.id,
                reporting_date = %plan.reporting_date,
                %error,
                "Rolling back submission"
            );
            if let Err(rollback_error) = txn.rollback().await {
                error!(%rollback_error, "Rollback failed");
            }
            Err(error)
        }
    }
}

async fn write_submission<C>(
    db: &C,
    merged: &MergedSubmission,
    plan: &CommitPlan<'_>,
    trail: &mut Vec<String>,
) -> Result<CommitReceipt>
where
    C: ConnectionTrait,
{
    let center_id = plan.center.id;
    let report = lock_report(db, plan).await?;
    trail.push(format!("locked report {} for {}", report.id, plan.reporting_date));

    let mut created_ids: BTreeMap<&'static str, BTreeMap<i64, i64>> = BTreeMap::new();
    let mut assignments: Vec<Assignment> = Vec::new();
    let mut released: Vec<(&'static str, i64)> = Vec::new();

    // Team members first: applications may reference members created in this commit.
    let mut counts = MaterializeCounts::default();
    let mut member_ids = HashMap::new();
    let mut created_members = BTreeMap::new();
    for entity in &merged.team_members.entities {
        let outcome = materialize::<TeamMember, _>(db, center_id, entity, &entity.merged).await?;
        outcome.count(&mut counts);
        if let Materialized::Created { pending, id } = outcome {
            member_ids.insert(pending, id);
            created_members.insert(pending, id);
        }
        let id = outcome.id();
        // Members created by an earlier submission of this week are still referenced
        // by their pending id in other stash payloads.
        if let Some(original) = entity.draft.as_ref().and_then(|draft| draft.original_id) {
            member_ids.entry(original).or_insert(id);
        }
        write_weekly::<TeamMemberData, _>(db, report.id, id, &entity.merged).await?;

        assignments.extend(entity.merged.list("accountabilities").iter().map(|name| Assignment {
            accountability: name.clone(),
            holder_kind: HOLDER_TEAM_MEMBER,
            holder_id: id,
        }));
        if entity
            .draft
            .as_ref()
            .is_some_and(|draft| draft.domain.is_set("accountabilities"))
        {
            released.push((HOLDER_TEAM_MEMBER, id));
        }
    }
    trail.push(format!("team members: {counts}"));
    created_ids.insert("team_member", created_members);

    let mut counts = MaterializeCounts::default();
    let mut application_ids = BTreeMap::new();
    for entity in &merged.applications.entities {
        let domain = resolve_committed_member(&entity.merged, &member_ids)?;
        let outcome = materialize::<Application, _>(db, center_id, entity, &domain).await?;
        outcome.count(&mut counts);
        if let Materialized::Created { pending, id } = outcome {
            application_ids.insert(pending, id);
        }
        write_weekly::<ApplicationData, _>(db, report.id, outcome.id(), &domain).await?;
    }
    trail.push(format!("applications: {counts}"));
    created_ids.insert("application", application_ids);

    let (counts, course_ids) =
        materialize_weekly_group::<Course, CourseData, _>(db, center_id, report.id, &merged.courses).await?;
    trail.push(format!("courses: {counts}"));
    created_ids.insert("course", course_ids);

    let mut counts = MaterializeCounts::default();
    let mut leader_ids = BTreeMap::new();
    let mut leaders = Vec::new();
    for entity in &merged.program_leaders.entities {
        let outcome = materialize::<ProgramLeader, _>(db, center_id, entity, &entity.merged).await?;
        outcome.count(&mut counts);
        if let Materialized::Created { pending, id } = outcome {
            leader_ids.insert(pending, id);
        }
        if entity.draft.is_some() {
            released.push((HOLDER_PROGRAM_LEADER, outcome.id()));
        }
        if let Some(role) = entity.merged.str("accountability") {
            leaders.push((entity.stashed_at(), role.to_string(), outcome.id()));
        }
    }
    trail.push(format!("program leaders: {counts}"));
    created_ids.insert("program_leader", leader_ids);

    // The most recently stashed leader of a role takes it.
    leaders.sort_by_key(|(stashed_at, _, _)| *stashed_at);
    assignments.extend(leaders.into_iter().map(|(_, role, id)| Assignment {
        accountability: role,
        holder_kind: HOLDER_PROGRAM_LEADER,
        holder_id: id,
    }));
    let assignments: Vec<Assignment> = assignments
        .into_iter()
        .map(|assignment| (assignment.accountability.clone(), assignment))
        .collect::<BTreeMap<_, _>>()
        .into_values()
        .collect();

    let derived = actuals::derive(merged.team_members.domains(), merged.leaders_by_recency());
    let rows = write_scoreboard_rows(db, report.id, plan.reporting_date, merged, derived).await?;
    trail.push(format!("scoreboard rows: {rows}"));

    let ends_at = mapping_end(plan.quarter, plan.reporting_date, plan.grace_days);
    let accountability =
        apply_assignments(db, center_id, plan.reporting_date, ends_at, &assignments, &released).await?;
    trail.push(format!(
        "accountabilities: {} started, {} extended, {} ended",
        accountability.started, accountability.extended, accountability.ended
    ));

    let global_report_id = attach_to_global_report(db, &report).await?;
    trail.push(format!("linked into global report {global_report_id}"));

    let consumed = stash::mark_consumed(db, center_id, plan.reporting_date, plan.now).await?;
    trail.push(format!("stash entries consumed: {consumed}"));

    info!(
        center_id,
        reporting_date = %plan.reporting_date,
        report_id = report.id,
        global_report_id,
        "Submission written"
    );

    Ok(CommitReceipt {
        report,
        global_report_id,
        created_ids,
        derived,
        accountability,
        scoreboard: merged.scoreboard(plan.reporting_date),
    })
}

async fn lock_report<C>(db: &C, plan: &CommitPlan<'_>) -> Result<stats_report::Model>
where
    C: ConnectionTrait,
{
    let report = find_or_create_draft_report(
        db,
        plan.center.id,
        plan.reporting_date,
        plan.quarter.id,
        plan.now,
    )
    .await?;
    let messages = serde_json::to_string(&plan.validation.messages)?;

    let mut active_model: stats_report::ActiveModel = report.into();
    active_model.validated = Set(plan.validation.valid);
    active_model.locked = Set(true);
    active_model.submitted_at = Set(Some(plan.now));
    active_model.submitted_by = Set(Some(plan.user_id));
    active_model.comment = Set(plan.comment.map(str::to_string));
    active_model.validation_messages = Set(Some(messages));
    active_model.update(db).await.map_err(Into::into)
}

/// Replaces a committed team member that is still pending with the id created for it.
fn resolve_committed_member(domain: &Domain, member_ids: &HashMap<i64, i64>) -> Result<Domain> {
    let Some(pending) = domain
        .int("committed_team_member_id")
        .filter(|id| *id < 0)
    else {
        return Ok(domain.clone());
    };
    let created = member_ids.get(&pending).ok_or_else(|| {
        Error::bad_request(format!(
            "Committed team member {pending} is not part of this submission"
        ))
    })?;
    let mut resolved = domain.clone();
    resolved.set("committed_team_member_id", FieldValue::Int(*created))?;
    Ok(resolved)
}

/// Creates, updates or carries one entity.
///
/// A pending entry creates the entity and remaps its stash row. An entry for an
/// existing entity writes only the identity fields the draft sets.
async fn materialize<E, C>(
    db: &C,
    center_id: i64,
    entity: &MergedEntity,
    domain: &Domain,
) -> Result<Materialized>
where
    E: IdentityRecord,
    E::Model: IntoActiveModel<E::Active>,
    C: ConnectionTrait,
{
    match entity.draft.as_ref() {
        Some(draft) if matches!(draft.state, EntryState::Pending(_)) => {
            let mut active_model = E::blank(center_id);
            domain.fill_model(&mut active_model, FieldOwner::Entity, false);
            let model = active_model.insert(db).await?;
            let id = E::id(&model);
            stash::remap_pending_id(db, draft.row_id, id).await?;
            debug!(kind = E::LABEL, pending = draft.state.id(), id, "Created entity");
            Ok(Materialized::Created {
                pending: draft.state.id(),
                id,
            })
        }
        Some(draft) => {
            let id = draft.state.id();
            let model = E::find()
                .filter(E::id_column().eq(id))
                .one(db)
                .await?
                .filter(|model| E::center_id(model) == center_id)
                .ok_or(Error::NotFound {
                    entity: E::LABEL,
                    id,
                })?;
            let mut active_model: E::Active = model.into();
            let changed = draft
                .domain
                .fill_model(&mut active_model, FieldOwner::Entity, true);
            if changed.is_empty() {
                return Ok(Materialized::Carried(id));
            }
            debug!(kind = E::LABEL, id, fields = ?changed, "Updating entity");
            active_model.update(db).await?;
            Ok(Materialized::Updated(id))
        }
        None => domain
            .id()
            .filter(|id| *id > 0)
            .map(Materialized::Carried)
            .ok_or_else(|| Error::bad_request(format!("{} without an id", E::LABEL))),
    }
}

async fn write_weekly<D, C>(db: &C, report_id: i64, entity_id: i64, domain: &Domain) -> Result<()>
where
    D: WeeklyRecord,
    D::Model: IntoActiveModel<D::Active>,
    C: ConnectionTrait,
{
    let mut active_model = D::blank(report_id, entity_id);
    domain.fill_model(&mut active_model, FieldOwner::Data, false);
    active_model.insert(db).await?;
    Ok(())
}

async fn materialize_weekly_group<E, D, C>(
    db: &C,
    center_id: i64,
    report_id: i64,
    group: &MergedGroup,
) -> Result<(MaterializeCounts, BTreeMap<i64, i64>)>
where
    E: IdentityRecord,
    E::Model: IntoActiveModel<E::Active>,
    D: WeeklyRecord,
    D::Model: IntoActiveModel<D::Active>,
    C: ConnectionTrait,
{
    let mut counts = MaterializeCounts::default();
    let mut created = BTreeMap::new();
    for entity in &group.entities {
        let outcome = materialize::<E, _>(db, center_id, entity, &entity.merged).await?;
        outcome.count(&mut counts);
        if let Materialized::Created { pending, id } = outcome {
            created.insert(pending, id);
        }
        write_weekly::<D, _>(db, report_id, outcome.id(), &entity.merged).await?;
    }
    Ok((counts, created))
}

fn scoreboard_row(
    report_id: i64,
    week: NaiveDate,
    kind: ValueKind,
    scoreboard: &Scoreboard,
) -> center_stats_data::ActiveModel {
    let value = |game| Set(scoreboard.value(game, kind));
    center_stats_data::ActiveModel {
        stats_report_id: Set(report_id),
        week_date: Set(week),
        kind: Set(match kind {
            ValueKind::Promise => center_stats_data::KIND_PROMISE,
            ValueKind::Actual => center_stats_data::KIND_ACTUAL,
            ValueKind::Original => center_stats_data::KIND_ORIGINAL,
        }
        .to_string()),
        cap: value(Game::Cap),
        cpc: value(Game::Cpc),
        t1x: value(Game::T1x),
        t2x: value(Game::T2x),
        gitw: value(Game::Gitw),
        lf: value(Game::Lf),
        ..Default::default()
    }
}

/// Writes promise and original rows for every promised week and actual rows up to the
/// reporting week.
async fn write_scoreboard_rows<C>(
    db: &C,
    report_id: i64,
    reporting_date: NaiveDate,
    merged: &MergedSubmission,
    derived: DerivedActuals,
) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut written = 0;
    for (week, scoreboard) in merged.scoreboards.iter() {
        if scoreboard.has_any(ValueKind::Promise) {
            let mut row = scoreboard_row(report_id, week, ValueKind::Promise, scoreboard);
            row.tdo = Set(Some(PROMISE_TDO));
            row.insert(db).await?;
            written += 1;
        }
        if scoreboard.has_any(ValueKind::Original) {
            scoreboard_row(report_id, week, ValueKind::Original, scoreboard)
                .insert(db)
                .await?;
            written += 1;
        }

        let is_reporting_week = week == reporting_date;
        if week <= reporting_date && (is_reporting_week || scoreboard.has_any(ValueKind::Actual)) {
            let mut row = scoreboard_row(report_id, week, ValueKind::Actual, scoreboard);
            if is_reporting_week {
                row.tdo = Set(Some(derived.tdo));
                row.program_manager_attending_weekend =
                    Set(derived.program_manager_attending_weekend);
                row.classroom_leader_attending_weekend =
                    Set(derived.classroom_leader_attending_weekend);
            }
            row.insert(db).await?;
            written += 1;
        }
    }
    Ok(written)
}
