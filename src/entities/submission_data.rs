//! Submission data entity - Draft ("stashed") entities awaiting a submission.
//!
//! Rows are keyed by (center, reporting date, stored type, stored id). A negative
//! `stored_id` marks an entity that has not been created yet; the commit rewrites it to
//! the real id and keeps the negative one in `original_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Submission data database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission_data")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Center the draft belongs to
    pub center_id: i64,
    /// Reporting week the draft belongs to
    pub reporting_date: Date,
    /// Kind of stashed entity (e.g., `"application"`)
    pub stored_type: String,
    /// Entity id; negative while the entity has not been created
    pub stored_id: i64,
    /// The pending id this row was created with, kept after remapping
    pub original_id: Option<i64>,
    /// Stashed payload
    pub data: Json,
    /// Soft delete flag
    pub is_deleted: bool,
    /// User who last wrote the row
    pub user_id: Option<i64>,
    /// When the row was last applied by a successful submission
    pub consumed_at: Option<DateTimeUtc>,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
}

/// `SubmissionData` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
