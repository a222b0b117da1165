//! Global report entity - The cross-center aggregate for one reporting week.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Global report database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "global_reports")]
pub struct Model {
    /// Unique identifier for the global report
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Reporting week shared by every linked center report
    #[sea_orm(unique)]
    pub reporting_date: Date,
}

/// One global report links many center reports
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Links to the official center reports of the week
    #[sea_orm(has_many = "super::global_report_link::Entity")]
    Links,
}

impl Related<super::global_report_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
