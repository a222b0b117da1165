//! Team member entity - The stable identity of a person on a center's team.
//!
//! Weekly values (attendance, game in the world, transfers) live in `team_member_data`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Team member database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_members")]
pub struct Model {
    /// Unique identifier for the team member
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Center the team member belongs to
    pub center_id: i64,
    /// Given name
    pub first_name: Option<String>,
    /// Family name or initial
    pub last_name: Option<String>,
    /// Team 1 or team 2
    pub team_year: Option<i64>,
    /// Quarter the team member started in
    pub incoming_quarter_id: Option<i64>,
}

/// One team member has many weekly data rows
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Weekly snapshots
    #[sea_orm(has_many = "super::team_member_data::Entity")]
    WeeklyData,
}

impl Related<super::team_member_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeeklyData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
