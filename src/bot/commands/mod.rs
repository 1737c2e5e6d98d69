//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Reaction-role panel commands
pub mod reaction_role;

/// Ticket panel commands
pub mod ticket;

// Export commands
pub use general::*;
pub use reaction_role::*;
pub use ticket::*;
