//! Merged view of a center-week: the last official report overlaid with the stash.
//!
//! Entities carried by the last official report form the base. Every live stash entry
//! replaces the fields it sets on its base entity, or adds a new entity; deleted entries
//! drop the entity from the view. Scoreboard weeks are merged through the week's lock.

use super::records::{IdentityRecord, WeeklyRecord};
use crate::core::domains::{APPLICATION, COURSE, PROGRAM_LEADER, TEAM_MEMBER};
use crate::core::parser_domain::{Domain, FieldOwner, FieldValue, ParseMode, Schema};
use crate::core::reporting::last_official_report;
use crate::core::scoreboard::Scoreboard;
use crate::core::scoreboard_lock::ScoreboardLockQuarter;
use crate::core::scoreboard_multi_week::ScoreboardMultiWeek;
use crate::core::stash::{self, EntryState, StashEntry, StashType, scoreboard_week};
use crate::core::submission::accountability::{active_mappings, held_by};
use crate::core::validation::{ScoreboardWeek, SubmissionView, Tracked};
use crate::entities::accountability_mapping::{self, HOLDER_PROGRAM_LEADER, HOLDER_TEAM_MEMBER};
use crate::entities::{
    Application, ApplicationData, Course, CourseData, ProgramLeader, TeamMember, TeamMemberData,
    stats_report,
};
use crate::errors::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// A stash entry parsed against its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct StashedDraft {
    /// Stash row to remap once the entity exists
    pub row_id: i64,
    /// Identity state of the entry
    pub state: EntryState,
    /// Pending id of an entry an earlier submission already created
    pub original_id: Option<i64>,
    /// Parsed payload; only explicitly given fields are marked as set
    pub domain: Domain,
    /// Last write to the entry
    pub updated_at: DateTime<Utc>,
}

/// One entity of the merged view.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntity {
    /// Base values with the draft applied
    pub merged: Domain,
    /// Stash entry touching the entity, if any
    pub draft: Option<StashedDraft>,
    /// Differs from the last official report
    pub changed: bool,
}

impl MergedEntity {
    /// When the entity was last stashed.
    #[must_use]
    pub fn stashed_at(&self) -> Option<DateTime<Utc>> {
        self.draft.as_ref().map(|draft| draft.updated_at)
    }
}

/// Merged entities of one type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedGroup {
    /// Live entities: base order first, then entities only known to the stash
    pub entities: Vec<MergedEntity>,
    /// Ids deleted in the stash
    pub deleted_ids: BTreeSet<i64>,
}

impl MergedGroup {
    /// Merged domains in order.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> + Clone + '_ {
        self.entities.iter().map(|entity| &entity.merged)
    }

    fn tracked(&self) -> Vec<Tracked<Domain>> {
        self.entities
            .iter()
            .map(|entity| Tracked {
                value: entity.merged.clone(),
                changed: entity.changed,
            })
            .collect()
    }
}

/// Everything a center-week submission would contain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSubmission {
    /// Last official report before the reporting date
    pub base_report: Option<stats_report::Model>,
    /// Applications
    pub applications: MergedGroup,
    /// Team members
    pub team_members: MergedGroup,
    /// Courses
    pub courses: MergedGroup,
    /// Program leaders
    pub program_leaders: MergedGroup,
    /// Scoreboards of every week of the quarter
    pub scoreboards: ScoreboardMultiWeek,
    /// Weeks with a stashed scoreboard
    pub stashed_weeks: BTreeSet<NaiveDate>,
}

impl MergedSubmission {
    /// The view handed to the validation pipeline.
    #[must_use]
    pub fn view(&self) -> SubmissionView {
        SubmissionView {
            applications: self.applications.tracked(),
            team_members: self.team_members.tracked(),
            courses: self.courses.tracked(),
            program_leaders: self.program_leaders.tracked(),
            scoreboard: self
                .scoreboards
                .iter()
                .map(|(week, scoreboard)| Tracked {
                    value: ScoreboardWeek {
                        week,
                        scoreboard: scoreboard.clone(),
                    },
                    changed: self.stashed_weeks.contains(&week),
                })
                .collect(),
            pending_member_ids: self
                .team_members
                .entities
                .iter()
                .flat_map(|entity| {
                    let pending = entity.merged.id().filter(|id| *id < 0);
                    let original = entity.draft.as_ref().and_then(|draft| draft.original_id);
                    pending.into_iter().chain(original)
                })
                .collect(),
        }
    }

    /// Scoreboard of `week`, blank when the week is unknown.
    #[must_use]
    pub fn scoreboard(&self, week: NaiveDate) -> Scoreboard {
        self.scoreboards.get(week).cloned().unwrap_or_default()
    }

    /// Leaders paired with when they were stashed, for derived actuals.
    pub fn leaders_by_recency(&self) -> Vec<(&Domain, Option<DateTime<Utc>>)> {
        self.program_leaders
            .entities
            .iter()
            .map(|entity| (&entity.merged, entity.stashed_at()))
            .collect()
    }
}

/// Inputs of [`merge_submission`].
#[derive(Debug, Clone, Copy)]
pub struct MergeScope<'a> {
    /// Center being reported
    pub center_id: i64,
    /// Reporting week
    pub reporting_date: NaiveDate,
    /// Reporting weeks of the quarter
    pub reporting_dates: &'a [NaiveDate],
    /// Edit windows of the quarter
    pub locks: &'a ScoreboardLockQuarter,
    /// How stashed payloads are parsed
    pub parse_mode: ParseMode,
}

/// Builds the merged view of a center-week.
pub async fn merge_submission<C>(db: &C, scope: MergeScope<'_>) -> Result<MergedSubmission>
where
    C: ConnectionTrait,
{
    let base_report = last_official_report(db, scope.center_id, scope.reporting_date).await?;
    let base_id = base_report.as_ref().map(|report| report.id);
    let mappings = active_mappings(db, scope.center_id, scope.reporting_date).await?;

    let mut member_base =
        base_group::<TeamMember, TeamMemberData, _>(db, &TEAM_MEMBER, scope.center_id, base_id).await?;
    for (id, member) in &mut member_base {
        member.set(
            "accountabilities",
            FieldValue::List(held_by(&mappings, HOLDER_TEAM_MEMBER, *id)),
        )?;
    }
    let team_members =
        overlay_group::<TeamMember, _>(db, &TEAM_MEMBER, StashType::TeamMember, scope, member_base).await?;

    let application_base =
        base_group::<Application, ApplicationData, _>(db, &APPLICATION, scope.center_id, base_id).await?;
    let applications =
        overlay_group::<Application, _>(db, &APPLICATION, StashType::Application, scope, application_base)
            .await?;

    let course_base = base_group::<Course, CourseData, _>(db, &COURSE, scope.center_id, base_id).await?;
    let courses = overlay_group::<Course, _>(db, &COURSE, StashType::Course, scope, course_base).await?;

    let leader_base = base_leaders(db, scope.center_id, &mappings).await?;
    let program_leaders =
        overlay_group::<ProgramLeader, _>(db, &PROGRAM_LEADER, StashType::ProgramLeader, scope, leader_base)
            .await?;

    let mut scoreboards = match base_id {
        Some(report_id) => {
            ScoreboardMultiWeek::load_for_report(db, report_id, scope.reporting_dates).await?
        }
        None => ScoreboardMultiWeek::for_dates(scope.reporting_dates),
    };
    let mut stashed_weeks = BTreeSet::new();
    let weeks = stash::all_for_type(
        db,
        scope.center_id,
        scope.reporting_date,
        StashType::ScoreboardWeek,
        false,
    )
    .await?;
    for entry in weeks.entries {
        let week = scoreboard_week(&entry.data)?;
        let draft = Scoreboard::from_json(&entry.data)?;
        scoreboards
            .ensure_week(week)
            .merge_from(&draft, scope.locks.get(week));
        stashed_weeks.insert(week);
    }

    debug!(
        center_id = scope.center_id,
        reporting_date = %scope.reporting_date,
        base_report = ?base_id,
        team_members = team_members.entities.len(),
        applications = applications.entities.len(),
        courses = courses.entities.len(),
        program_leaders = program_leaders.entities.len(),
        stashed_weeks = stashed_weeks.len(),
        "Merged submission"
    );

    Ok(MergedSubmission {
        base_report,
        applications,
        team_members,
        courses,
        program_leaders,
        scoreboards,
        stashed_weeks,
    })
}

/// Entities carried by the base report, keyed by id.
async fn base_group<E, D, C>(
    db: &C,
    schema: &'static Schema,
    center_id: i64,
    report_id: Option<i64>,
) -> Result<BTreeMap<i64, Domain>>
where
    E: IdentityRecord,
    D: WeeklyRecord,
    C: ConnectionTrait,
{
    let mut base = BTreeMap::new();
    let Some(report_id) = report_id else {
        return Ok(base);
    };

    let identities: HashMap<i64, E::Model> = E::find()
        .filter(E::center_column().eq(center_id))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (E::id(&model), model))
        .collect();
    let rows = D::find()
        .filter(D::report_column().eq(report_id))
        .all(db)
        .await?;

    for row in rows {
        let id = D::entity_id(&row);
        let Some(identity) = identities.get(&id) else {
            warn!(schema = schema.name, id, report_id, "Weekly row without identity");
            continue;
        };
        let mut domain = Domain::new(schema);
        domain.absorb_model(identity, FieldOwner::Entity);
        domain.absorb_model(&row, FieldOwner::Data);
        domain.set("id", FieldValue::Int(id))?;
        base.insert(id, domain);
    }
    Ok(base)
}

/// Program leaders holding an accountability on the reporting date.
async fn base_leaders<C>(
    db: &C,
    center_id: i64,
    mappings: &[accountability_mapping::Model],
) -> Result<BTreeMap<i64, Domain>>
where
    C: ConnectionTrait,
{
    let ids: BTreeSet<i64> = mappings
        .iter()
        .filter(|mapping| mapping.holder_kind == HOLDER_PROGRAM_LEADER)
        .map(|mapping| mapping.holder_id)
        .collect();
    let mut base = BTreeMap::new();
    if ids.is_empty() {
        return Ok(base);
    }
    let leaders = ProgramLeader::find()
        .filter(<ProgramLeader as IdentityRecord>::center_column().eq(center_id))
        .filter(<ProgramLeader as IdentityRecord>::id_column().is_in(ids))
        .all(db)
        .await?;
    for leader in leaders {
        let mut domain = Domain::new(&PROGRAM_LEADER);
        domain.absorb_model(&leader, FieldOwner::Entity);
        domain.set("id", FieldValue::Int(leader.id))?;
        base.insert(leader.id, domain);
    }
    Ok(base)
}

/// Applies the fields a draft explicitly sets.
fn overlay(mut merged: Domain, draft: &Domain) -> Result<Domain> {
    for name in draft.set_fields() {
        if name != "id" {
            merged.set(name, draft.get(name).clone())?;
        }
    }
    Ok(merged)
}

async fn overlay_group<E, C>(
    db: &C,
    schema: &'static Schema,
    stored_type: StashType,
    scope: MergeScope<'_>,
    mut base: BTreeMap<i64, Domain>,
) -> Result<MergedGroup>
where
    E: IdentityRecord,
    C: ConnectionTrait,
{
    let listing =
        stash::all_for_type(db, scope.center_id, scope.reporting_date, stored_type, true).await?;
    base.retain(|id, _| !listing.deleted_ids.contains(id));

    let mut drafts: BTreeMap<i64, StashedDraft> = BTreeMap::new();
    for StashEntry {
        row_id,
        state,
        original_id,
        data,
        updated_at,
    } in listing.entries
    {
        let domain = Domain::from_json(schema, &data, scope.parse_mode)?;
        drafts.insert(
            state.id(),
            StashedDraft {
                row_id,
                state,
                original_id,
                domain,
                updated_at,
            },
        );
    }

    let mut group = MergedGroup {
        entities: Vec::with_capacity(base.len() + drafts.len()),
        deleted_ids: listing.deleted_ids,
    };

    for (id, domain) in base {
        let entity = match drafts.remove(&id) {
            Some(draft) => {
                let mut merged = overlay(domain.clone(), &draft.domain)?;
                merged.set("id", FieldValue::Int(id))?;
                MergedEntity {
                    changed: merged != domain,
                    merged,
                    draft: Some(draft),
                }
            }
            None => MergedEntity {
                merged: domain,
                draft: None,
                changed: false,
            },
        };
        group.entities.push(entity);
    }

    // Entities the base report does not carry: existing ones first loaded, new ones as drafted.
    for (id, draft) in drafts {
        let merged = if id > 0 {
            let mut start = Domain::new(schema);
            match E::find()
                .filter(E::id_column().eq(id))
                .filter(E::center_column().eq(scope.center_id))
                .one(db)
                .await?
            {
                Some(identity) => start.absorb_model(&identity, FieldOwner::Entity),
                None => warn!(schema = schema.name, id, "Stashed entity does not exist"),
            }
            let mut merged = overlay(start, &draft.domain)?;
            merged.set("id", FieldValue::Int(id))?;
            merged
        } else {
            draft.domain.clone()
        };
        group.entities.push(MergedEntity {
            merged,
            draft: Some(draft),
            changed: true,
        });
    }

    Ok(group)
}
