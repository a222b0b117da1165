//! Team member data entity - One week of values for a team member, tied to a report.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Team member data database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_member_data")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Report that carried this row
    pub stats_report_id: i64,
    /// Team member described
    pub team_member_id: i64,
    /// Attended the quarter's opening weekend
    pub at_weekend: Option<bool>,
    /// Transferred in from another center
    pub xfer_in: Option<bool>,
    /// Transferred out to another center
    pub xfer_out: Option<bool>,
    /// Conversation to withdraw in progress
    pub ctw: Option<bool>,
    /// Withdraw reason, set when the member withdrew
    pub withdraw_code_id: Option<i64>,
    /// Travel booked for the closing weekend
    pub travel: Option<bool>,
    /// Room booked for the closing weekend
    pub room: Option<bool>,
    /// Game in the world kept this week
    pub gitw: Option<bool>,
    /// Training-and-development opportunities attended this week
    pub tdo: Option<i64>,
    /// Reviewer on the team
    pub is_reviewer: Option<bool>,
    /// Free-text comment
    pub comment: Option<String>,
}

/// Each row belongs to one team member
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Described team member
    #[sea_orm(
        belongs_to = "super::team_member::Entity",
        from = "Column::TeamMemberId",
        to = "super::team_member::Column::Id"
    )]
    TeamMember,
}

impl Related<super::team_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamMember.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
