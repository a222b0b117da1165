//! Application data entity - One week of lifecycle values for an application.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Application data database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "application_data")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Report that carried this row
    pub stats_report_id: i64,
    /// Application described
    pub application_id: i64,
    /// Application handed out
    pub app_out_date: Option<Date>,
    /// Application returned
    pub app_in_date: Option<Date>,
    /// Application approved
    pub appr_date: Option<Date>,
    /// Applicant withdrew
    pub wd_date: Option<Date>,
    /// Withdraw reason
    pub withdraw_code_id: Option<i64>,
    /// Team member accountable for the applicant
    pub committed_team_member_id: Option<i64>,
    /// Travel booked
    pub travel: Option<bool>,
    /// Room booked
    pub room: Option<bool>,
    /// Free-text comment
    pub comment: Option<String>,
}

/// Each row belongs to one application
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Described application
    #[sea_orm(
        belongs_to = "super::application::Entity",
        from = "Column::ApplicationId",
        to = "super::application::Column::Id"
    )]
    Application,
}

impl Related<super::application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Application.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
