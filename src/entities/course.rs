//! Course entity - A CAP or CPC course run by a center.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Course database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    /// Unique identifier for the course
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Center running the course
    pub center_id: i64,
    /// `"CAP"` or `"CPC"`
    pub course_type: Option<String>,
    /// Where the course is held
    pub location: Option<String>,
    /// First day of the course
    pub start_date: Option<Date>,
}

/// One course has many weekly data rows
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Weekly snapshots
    #[sea_orm(has_many = "super::course_data::Entity")]
    WeeklyData,
}

impl Related<super::course_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeeklyData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
