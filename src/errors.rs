//! Unified error types for `PanelBuddy`.

use crate::wizard::AbortReason;
use thiserror::Error;

/// Every error the bot can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),

    #[error("Setup is missing `{key}`")]
    IncompleteSetup { key: String },

    #[error("Invalid id `{value}`")]
    InvalidId { value: String },

    #[error("Panel not found: {id}")]
    PanelNotFound { id: i64 },

    #[error("This server already has {max} panels of this kind.")]
    PanelLimitReached { max: usize },

    #[error("This command can only be used in a server")]
    GuildOnly,

    #[error("Setup aborted: {0}")]
    Wizard(#[from] AbortReason),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
