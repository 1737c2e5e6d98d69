//! Database configuration module for `PanelBuddy`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::{ReactionRole, ReactionRolePanel, TicketChoice, TicketPanel};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

/// Default location of the `SQLite` database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/panel_buddy.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to
/// a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let url = get_database_url();
    if url == DEFAULT_DATABASE_URL {
        // SQLite creates the file but not its directory
        std::fs::create_dir_all("data")?;
    }
    info!("Connecting to database at {url}");
    Database::connect(&url).await.map_err(Into::into)
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Parent tables are created before the tables referencing them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, TicketPanel).await?;
    create_table(db, &schema, TicketChoice).await?;
    create_table(db, &schema, ReactionRolePanel).await?;
    create_table(db, &schema, ReactionRole).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        reaction_role::Model as ReactionRoleModel,
        reaction_role_panel::Model as ReactionRolePanelModel,
        ticket_choice::Model as TicketChoiceModel, ticket_panel::Model as TicketPanelModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<TicketPanelModel> = TicketPanel::find().limit(1).all(&db).await?;
        let _: Vec<TicketChoiceModel> = TicketChoice::find().limit(1).all(&db).await?;
        let _: Vec<ReactionRolePanelModel> = ReactionRolePanel::find().limit(1).all(&db).await?;
        let _: Vec<ReactionRoleModel> = ReactionRole::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
