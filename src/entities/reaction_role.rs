//! Reaction role entity - One role button of a reaction-role panel.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reaction role database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reaction_roles")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning panel
    pub panel_id: i64,
    /// Button order on the panel, starting at 0
    pub position: i32,
    /// Role toggled by the button
    pub role_id: String,
    /// Emoji shown on the button, unique within the panel
    pub emoji: String,
    /// Optional button label
    pub label: Option<String>,
    /// Button style (`primary`, `secondary`, `success`, `danger`)
    pub style: String,
}

/// A role belongs to one panel
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reaction_role_panel::Entity",
        from = "Column::PanelId",
        to = "super::reaction_role_panel::Column::Id"
    )]
    Panel,
}

impl Related<super::reaction_role_panel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Panel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
