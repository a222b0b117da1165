//! Course data entity - One week of registration counts for a course.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Course data database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course_data")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Report that carried this row
    pub stats_report_id: i64,
    /// Course described
    pub course_id: i64,
    /// Total enrolled at quarter start
    pub quarter_start_ter: Option<i64>,
    /// Standard starts at quarter start
    pub quarter_start_standard_starts: Option<i64>,
    /// Transfers in at quarter start
    pub quarter_start_xfer: Option<i64>,
    /// Total enrolled now
    pub current_ter: Option<i64>,
    /// Standard starts now
    pub current_standard_starts: Option<i64>,
    /// Transfers in now
    pub current_xfer: Option<i64>,
    /// Participants who completed, once the course has run
    pub completed_standard_starts: Option<i64>,
    /// Potential registrations
    pub potentials: Option<i64>,
    /// Registrations from potentials
    pub registrations: Option<i64>,
    /// Guests promised for the guest event
    pub guests_promised: Option<i64>,
    /// Guests invited
    pub guests_invited: Option<i64>,
    /// Guests confirmed
    pub guests_confirmed: Option<i64>,
    /// Guests attended
    pub guests_attended: Option<i64>,
    /// Free-text comment
    pub comment: Option<String>,
}

/// Each row belongs to one course
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Described course
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
