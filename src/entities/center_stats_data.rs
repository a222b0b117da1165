//! Center stats data entity - Persisted scoreboard rows.
//!
//! Each submitted report stores one `promise` row per week it carries promises for, an
//! `original` row per week whose first promises were recorded, and `actual` rows up to
//! its own reporting week.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Row kind for promises
pub const KIND_PROMISE: &str = "promise";
/// Row kind for actuals
pub const KIND_ACTUAL: &str = "actual";
/// Row kind for promises as first made
pub const KIND_ORIGINAL: &str = "original";

/// Center stats data database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "center_stats_data")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Report that carried this row
    pub stats_report_id: i64,
    /// Week the values describe
    pub week_date: Date,
    /// `"promise"` or `"actual"`
    pub kind: String,
    /// Course participants
    pub cap: Option<i64>,
    /// Community programs
    pub cpc: Option<i64>,
    /// Team 1 expansion
    pub t1x: Option<i64>,
    /// Team 2 expansion
    pub t2x: Option<i64>,
    /// Game in the world (percent)
    pub gitw: Option<i64>,
    /// Landmark forum
    pub lf: Option<i64>,
    /// Training-and-development opportunity attendance (percent)
    pub tdo: Option<i64>,
    /// Program manager attending the weekend (0/1)
    pub program_manager_attending_weekend: Option<i64>,
    /// Classroom leader attending the weekend (0/1)
    pub classroom_leader_attending_weekend: Option<i64>,
}

/// Each row belongs to one stats report
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning report
    #[sea_orm(
        belongs_to = "super::stats_report::Entity",
        from = "Column::StatsReportId",
        to = "super::stats_report::Column::Id"
    )]
    StatsReport,
}

impl Related<super::stats_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatsReport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
