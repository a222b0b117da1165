//! Application entity - A team registration moving through the application lifecycle.
//!
//! Weekly lifecycle dates live in `application_data`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Application database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    /// Unique identifier for the application
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Center the applicant registered with
    pub center_id: i64,
    /// Given name
    pub first_name: Option<String>,
    /// Family name or initial
    pub last_name: Option<String>,
    /// Team 1 or team 2
    pub team_year: Option<i64>,
    /// Registration date
    pub reg_date: Option<Date>,
    /// Quarter the applicant intends to start in
    pub incoming_quarter_id: Option<i64>,
    /// Registering as a reviewer
    pub is_reviewer: Option<bool>,
}

/// One application has many weekly data rows
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Weekly snapshots
    #[sea_orm(has_many = "super::application_data::Entity")]
    WeeklyData,
}

impl Related<super::application_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeeklyData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
