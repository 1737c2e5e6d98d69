//! Core business logic - framework-agnostic panel configuration.
//!
//! Each panel kind provides its setup wizard steps, the mapping from a finished wizard
//! to a storable panel, and the database operations on stored panels.

/// Reaction-role panels
pub mod reaction_role;
/// Ticket panels
pub mod ticket;
