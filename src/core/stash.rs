//! Submission stash - draft storage for entities edited during a reporting week.
//!
//! Entries are keyed by (center, reporting date, stored type, stored id). Entities that
//! do not exist yet are stashed under negative ids; only a submission creates them, and
//! it then rewrites the entry to the real id with [`remap_pending_id`]. Deleting an entry
//! only flags it so a later submission cannot bring it back.

use crate::core::domains::{APPLICATION, COURSE, PROGRAM_LEADER, TEAM_MEMBER};
use crate::core::parser_domain::Schema;
use crate::entities::{SubmissionData, submission_data};
use crate::errors::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*, sea_query::Expr};
use serde_json::Value as Json;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Kinds of stashed entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StashType {
    /// Team applications
    Application,
    /// Team members
    TeamMember,
    /// Courses
    Course,
    /// Program leaders
    ProgramLeader,
    /// One week of scoreboard values
    ScoreboardWeek,
}

impl StashType {
    /// Value stored in the `stored_type` column.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::TeamMember => "team_member",
            Self::Course => "course",
            Self::ProgramLeader => "program_leader",
            Self::ScoreboardWeek => "scoreboard_week",
        }
    }

    /// Domain schema of the stashed payload; scoreboard weeks have their own format.
    #[must_use]
    pub const fn schema(self) -> Option<&'static Schema> {
        match self {
            Self::Application => Some(&APPLICATION),
            Self::TeamMember => Some(&TEAM_MEMBER),
            Self::Course => Some(&COURSE),
            Self::ProgramLeader => Some(&PROGRAM_LEADER),
            Self::ScoreboardWeek => None,
        }
    }
}

impl fmt::Display for StashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Identity state of a stash entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Refers to an existing entity
    Active(i64),
    /// Flagged as deleted
    Deleted(i64),
    /// Entity not created yet; the id is negative
    Pending(i64),
}

impl EntryState {
    /// State of a row with `stored_id` and deletion flag.
    #[must_use]
    pub const fn of(stored_id: i64, is_deleted: bool) -> Self {
        if is_deleted {
            Self::Deleted(stored_id)
        } else if stored_id < 0 {
            Self::Pending(stored_id)
        } else {
            Self::Active(stored_id)
        }
    }

    /// The stored id, whatever the state.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Active(id) | Self::Deleted(id) | Self::Pending(id) => id,
        }
    }

    /// Turns a pending entry into an active one with the id of the created entity.
    pub fn remap(self, new_id: i64) -> Result<Self> {
        match self {
            Self::Pending(_) if new_id > 0 => Ok(Self::Active(new_id)),
            Self::Pending(old) => Err(Error::bad_request(format!(
                "Cannot remap pending id {old} to non-positive id {new_id}"
            ))),
            other => Err(Error::bad_request(format!(
                "Only pending entries can be remapped, found {other:?}"
            ))),
        }
    }
}

/// A live stash entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StashEntry {
    /// Primary key of the stash row
    pub row_id: i64,
    /// Identity state
    pub state: EntryState,
    /// Pending id the entry was first stashed under, kept after a remap
    pub original_id: Option<i64>,
    /// Stashed payload
    pub data: Json,
    /// When the entry was last written
    pub updated_at: DateTime<Utc>,
}

impl From<submission_data::Model> for StashEntry {
    fn from(row: submission_data::Model) -> Self {
        Self {
            row_id: row.id,
            state: EntryState::of(row.stored_id, row.is_deleted),
            original_id: row.original_id,
            data: row.data,
            updated_at: row.updated_at,
        }
    }
}

/// Result of [`all_for_type`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StashListing {
    /// Live entries, oldest write first
    pub entries: Vec<StashEntry>,
    /// Ids flagged as deleted; only filled when requested
    pub deleted_ids: BTreeSet<i64>,
}

/// Extracts the numeric id stored under `key`.
///
/// Accepts integers and numeric strings. Negative ids mark entities that have not been
/// created yet; zero is never a valid id.
pub fn numeric_storage_id(data: &Json, key: &str) -> Result<i64> {
    let raw = data
        .get(key)
        .ok_or_else(|| Error::invalid_field(key, "missing storage id"))?;
    let id = match raw {
        Json::Number(number) => number.as_i64(),
        Json::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::invalid_field(key, format!("{raw} is not an integer id")))?;
    if id == 0 {
        return Err(Error::invalid_field(key, "id 0 is not valid"));
    }
    Ok(id)
}

/// Storage id of a scoreboard week: the date as `yyyymmdd`.
#[must_use]
pub fn week_storage_id(week: NaiveDate) -> i64 {
    i64::from(week.year()) * 10_000 + i64::from(week.month()) * 100 + i64::from(week.day())
}

/// Reads the `week` date of a stashed scoreboard payload.
pub fn scoreboard_week(data: &Json) -> Result<NaiveDate> {
    data.get("week")
        .and_then(Json::as_str)
        .and_then(|text| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok())
        .ok_or_else(|| Error::invalid_field("week", "scoreboard payload needs a YYYY-MM-DD week"))
}

fn storage_id(stored_type: StashType, data: &Json) -> Result<i64> {
    match stored_type {
        StashType::ScoreboardWeek => scoreboard_week(data).map(week_storage_id),
        _ => numeric_storage_id(data, "id"),
    }
}

async fn find_row<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
    stored_type: StashType,
    stored_id: i64,
) -> Result<Option<submission_data::Model>>
where
    C: ConnectionTrait,
{
    SubmissionData::find()
        .filter(submission_data::Column::CenterId.eq(center_id))
        .filter(submission_data::Column::ReportingDate.eq(reporting_date))
        .filter(submission_data::Column::StoredType.eq(stored_type.key()))
        .filter(submission_data::Column::StoredId.eq(stored_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Upserts a draft entity; last write wins.
///
/// Storing under a pending id that an earlier submission already remapped is rejected,
/// since it would create the entity a second time.
pub async fn store<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
    stored_type: StashType,
    data: Json,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<submission_data::Model>
where
    C: ConnectionTrait,
{
    let stored_id = storage_id(stored_type, &data)?;

    if stored_id < 0 {
        let remapped = SubmissionData::find()
            .filter(submission_data::Column::CenterId.eq(center_id))
            .filter(submission_data::Column::ReportingDate.eq(reporting_date))
            .filter(submission_data::Column::StoredType.eq(stored_type.key()))
            .filter(submission_data::Column::OriginalId.eq(stored_id))
            .filter(submission_data::Column::StoredId.ne(stored_id))
            .one(db)
            .await?;
        if let Some(row) = remapped {
            warn!(center_id, %stored_type, stored_id, created_id = row.stored_id, "Rejected stash under a remapped id");
            return Err(Error::bad_request(format!(
                "{stored_type} {stored_id} was already created as {}; stash it under that id",
                row.stored_id
            )));
        }
    }

    if let Some(existing) = find_row(db, center_id, reporting_date, stored_type, stored_id).await? {
        debug!(center_id, %stored_type, stored_id, "Overwriting stash entry");
        let mut active_model: submission_data::ActiveModel = existing.into();
        active_model.data = Set(data);
        active_model.is_deleted = Set(false);
        active_model.consumed_at = Set(None);
        active_model.user_id = Set(Some(user_id));
        active_model.updated_at = Set(now);
        return active_model.update(db).await.map_err(Into::into);
    }

    debug!(center_id, %stored_type, stored_id, "Creating stash entry");
    submission_data::ActiveModel {
        center_id: Set(center_id),
        reporting_date: Set(reporting_date),
        stored_type: Set(stored_type.key().to_string()),
        stored_id: Set(stored_id),
        original_id: Set((stored_id < 0).then_some(stored_id)),
        data: Set(data),
        is_deleted: Set(false),
        user_id: Set(Some(user_id)),
        consumed_at: Set(None),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// All entries of one type for a center-week.
///
/// With `include_deleted`, the ids of deleted entries are returned in
/// [`StashListing::deleted_ids`]; deleted entries never appear in `entries`.
pub async fn all_for_type<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
    stored_type: StashType,
    include_deleted: bool,
) -> Result<StashListing>
where
    C: ConnectionTrait,
{
    let rows = SubmissionData::find()
        .filter(submission_data::Column::CenterId.eq(center_id))
        .filter(submission_data::Column::ReportingDate.eq(reporting_date))
        .filter(submission_data::Column::StoredType.eq(stored_type.key()))
        .order_by_asc(submission_data::Column::UpdatedAt)
        .order_by_asc(submission_data::Column::Id)
        .all(db)
        .await?;

    let mut listing = StashListing::default();
    for row in rows {
        let entry = StashEntry::from(row);
        match entry.state {
            EntryState::Deleted(id) => {
                if include_deleted {
                    listing.deleted_ids.insert(id);
                }
            }
            EntryState::Active(_) | EntryState::Pending(_) => listing.entries.push(entry),
        }
    }
    Ok(listing)
}

/// Flags one entry as deleted.
///
/// Deleting an existing entity that has no stash entry yet records a deletion marker so
/// the submission can skip it.
pub async fn delete_one<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
    stored_type: StashType,
    stored_id: i64,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_row(db, center_id, reporting_date, stored_type, stored_id).await? {
        let mut active_model: submission_data::ActiveModel = existing.into();
        active_model.is_deleted = Set(true);
        active_model.consumed_at = Set(None);
        active_model.user_id = Set(Some(user_id));
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        submission_data::ActiveModel {
            center_id: Set(center_id),
            reporting_date: Set(reporting_date),
            stored_type: Set(stored_type.key().to_string()),
            stored_id: Set(stored_id),
            original_id: Set((stored_id < 0).then_some(stored_id)),
            data: Set(serde_json::json!({ "id": stored_id })),
            is_deleted: Set(true),
            user_id: Set(Some(user_id)),
            consumed_at: Set(None),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    info!(center_id, %stored_type, stored_id, "Stash entry deleted");
    Ok(())
}

/// Rewrites a pending entry to the id of the entity created for it.
///
/// Both the `stored_id` column and the `id` inside the payload are updated.
pub async fn remap_pending_id<C>(db: &C, row_id: i64, new_id: i64) -> Result<submission_data::Model>
where
    C: ConnectionTrait,
{
    let row = SubmissionData::find_by_id(row_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "submission_data",
            id: row_id,
        })?;
    let state = EntryState::of(row.stored_id, row.is_deleted).remap(new_id)?;

    let mut data = row.data.clone();
    if let Some(object) = data.as_object_mut() {
        object.insert("id".to_string(), Json::from(state.id()));
    }
    debug!(row_id, from = row.stored_id, to = new_id, "Remapping stash id");

    let mut active_model: submission_data::ActiveModel = row.into();
    active_model.stored_id = Set(state.id());
    active_model.data = Set(data);
    active_model.update(db).await.map_err(Into::into)
}

/// Records that a submission applied every entry of a center-week.
pub async fn mark_consumed<C>(
    db: &C,
    center_id: i64,
    reporting_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = SubmissionData::update_many()
        .col_expr(submission_data::Column::ConsumedAt, Expr::value(Some(now)))
        .filter(submission_data::Column::CenterId.eq(center_id))
        .filter(submission_data::Column::ReportingDate.eq(reporting_date))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
