//! Ticket choice entity - One button of a ticket panel.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ticket choice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_choices")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning panel
    pub panel_id: i64,
    /// Button order on the panel, starting at 0
    pub position: i32,
    /// Button label, unique within the panel
    pub label: String,
    /// Optional emoji shown on the button
    pub emoji: Option<String>,
    /// Button style (`primary`, `secondary`, `success`, `danger`)
    pub style: String,
    /// Text posted in the ticket channel when it opens
    pub description: Option<String>,
}

/// A choice belongs to one panel
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ticket_panel::Entity",
        from = "Column::PanelId",
        to = "super::ticket_panel::Column::Id"
    )]
    Panel,
}

impl Related<super::ticket_panel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Panel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
