//! Center entity - An organizational unit that submits weekly statistics.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Center database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "centers")]
pub struct Model {
    /// Unique identifier for the center
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Vancouver")
    pub name: String,
    /// Short code used in reports (e.g., "VAN")
    pub abbreviation: String,
    /// Inactive centers cannot submit
    pub is_active: bool,
}

/// `Center` relationships are navigated by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
