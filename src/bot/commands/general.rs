//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**PanelBuddy Help**\n\
        PanelBuddy sets up ticket and reaction-role panels through guided, step-by-step setups.\n\n\
        **Ticket Panels**\n\
        • `/ticket setup` - Walks you through staff role, ticket limits, transcripts, ticket types and channels.\n\
        • `/ticket list` - Shows this server's ticket panels.\n\
        • `/ticket remove <id>` - Deletes a ticket panel.\n\n\
        **Reaction-Role Panels**\n\
        • `/reactionrole setup` - Walks you through channel, panel text and role buttons.\n\
        • `/reactionrole list` - Shows this server's reaction-role panels.\n\
        • `/reactionrole remove <id>` - Deletes a reaction-role panel.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        Setup and removal require the **Manage Server** permission. \
        Each setup step times out after a minute without input.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
