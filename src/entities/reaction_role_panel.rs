//! Reaction-role panel entity - A message of role buttons members toggle themselves.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reaction-role panel database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reaction_role_panels")]
pub struct Model {
    /// Unique identifier for the panel
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord guild ID owning the panel
    pub guild_id: String,
    /// Channel the panel message is posted in
    pub channel_id: String,
    /// Panel embed title
    pub title: String,
    /// Panel embed description
    pub description: Option<String>,
    /// Discord user ID of whoever ran the setup
    pub created_by: String,
    /// When the panel was configured
    pub created_at: DateTime,
}

/// Defines relationships between `ReactionRolePanel` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One panel has many roles
    #[sea_orm(has_many = "super::reaction_role::Entity")]
    Roles,
}

impl Related<super::reaction_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
