//! Accountability mapping entity - Who holds an accountability for a center, and until when.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Holder kind for team members
pub const HOLDER_TEAM_MEMBER: &str = "team_member";
/// Holder kind for program leaders
pub const HOLDER_PROGRAM_LEADER: &str = "program_leader";

/// Accountability mapping database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accountability_mappings")]
pub struct Model {
    /// Unique identifier for the mapping
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Center the accountability is held for
    pub center_id: i64,
    /// Accountability name (e.g., `"programManager"`, `"t1tl"`)
    pub accountability: String,
    /// `"team_member"` or `"program_leader"`
    pub holder_kind: String,
    /// Id of the holding team member or program leader
    pub holder_id: i64,
    /// First day the mapping is in effect
    pub starts_at: Date,
    /// Last day the mapping is in effect
    pub ends_at: Date,
}

/// `AccountabilityMapping` references holders polymorphically
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
