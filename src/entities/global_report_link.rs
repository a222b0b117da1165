//! Global report link entity - Marks a stats report as the official one for its center-week.
//!
//! There is at most one link per (global report, center); superseding a report replaces
//! the link while the old report row is retained.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Global report link database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "global_report_links")]
pub struct Model {
    /// Unique identifier for the link
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Global report of the week
    pub global_report_id: i64,
    /// Official center report
    pub stats_report_id: i64,
    /// Center of the linked report
    pub center_id: i64,
}

/// Each link belongs to one global report
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning global report
    #[sea_orm(
        belongs_to = "super::global_report::Entity",
        from = "Column::GlobalReportId",
        to = "super::global_report::Column::Id"
    )]
    GlobalReport,
}

impl Related<super::global_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GlobalReport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
