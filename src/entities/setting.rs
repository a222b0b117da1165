//! Setting entity - Named JSON settings scoped to a center and/or quarter.
//! Used for the scoreboard lock windows of a quarter.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Setting database model - stores scoped key-value configuration
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Center scope, None for all centers
    pub center_id: Option<i64>,
    /// Quarter scope, None for all quarters
    pub quarter_id: Option<i64>,
    /// Setting name (e.g., `"scoreboardLock"`)
    pub name: String,
    /// Setting value stored as JSON text
    pub value: String,
    /// When this setting was last modified
    pub updated_at: DateTimeUtc,
}

/// `Setting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
