//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod reaction_role;
pub mod reaction_role_panel;
pub mod ticket_choice;
pub mod ticket_panel;

// Re-export specific types to avoid conflicts
pub use reaction_role::{
    Column as ReactionRoleColumn, Entity as ReactionRole, Model as ReactionRoleModel,
};
pub use reaction_role_panel::{
    Column as ReactionRolePanelColumn, Entity as ReactionRolePanel,
    Model as ReactionRolePanelModel,
};
pub use ticket_choice::{
    Column as TicketChoiceColumn, Entity as TicketChoice, Model as TicketChoiceModel,
};
pub use ticket_panel::{
    Column as TicketPanelColumn, Entity as TicketPanel, Model as TicketPanelModel,
};
