//! Stats report entity - One snapshot of a center's statistics for a reporting week.
//!
//! A draft row is created on the first stash activity for a center-week. Once `locked`
//! is set the row is never updated again; a later submission creates a new row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stats report database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stats_reports")]
pub struct Model {
    /// Unique identifier for the report
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Center the report belongs to
    pub center_id: i64,
    /// Friday identifying the reporting week
    pub reporting_date: Date,
    /// Quarter the reporting week belongs to
    pub quarter_id: i64,
    /// Passed validation at submission time
    pub validated: bool,
    /// Finalized and immutable
    pub locked: bool,
    /// When the report was submitted
    pub submitted_at: Option<DateTimeUtc>,
    /// User who submitted the report
    pub submitted_by: Option<i64>,
    /// Free-text comment from the submitter
    pub comment: Option<String>,
    /// Validation messages serialized as JSON
    pub validation_messages: Option<String>,
    /// When the row was created
    pub created_at: DateTimeUtc,
}

/// `StatsReport` has no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
