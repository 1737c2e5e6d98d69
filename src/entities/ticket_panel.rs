//! Ticket panel entity - One configured ticket panel of a guild.
//!
//! A panel is a message with one button per ticket choice. Pressing a button opens a
//! private ticket channel under the panel's category, visible to the staff role.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ticket panel database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_panels")]
pub struct Model {
    /// Unique identifier for the panel
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord guild ID owning the panel
    pub guild_id: String,
    /// Role that can see and answer tickets
    pub staff_role_id: String,
    /// Open tickets allowed per user
    pub max_tickets: i32,
    /// Channel receiving transcripts of closed tickets, if any
    pub transcript_channel_id: Option<String>,
    /// Category new ticket channels are created in
    pub category_id: String,
    /// Channel the panel message is posted in
    pub channel_id: String,
    /// Discord user ID of whoever ran the setup
    pub created_by: String,
    /// When the panel was configured
    pub created_at: DateTime,
}

/// Defines relationships between `TicketPanel` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One panel has many choices
    #[sea_orm(has_many = "super::ticket_choice::Entity")]
    Choices,
}

impl Related<super::ticket_choice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Choices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
