//! Program leader entity - A person holding a program leadership role for a center.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Program leader database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program_leaders")]
pub struct Model {
    /// Unique identifier for the program leader
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Center the leader serves
    pub center_id: i64,
    /// `"programManager"` or `"classroomLeader"`
    pub accountability: Option<String>,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Attending the quarter's closing weekend
    pub attending_weekend: Option<bool>,
}

/// `ProgramLeader` is referenced by accountability mappings through `holder_id`
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
