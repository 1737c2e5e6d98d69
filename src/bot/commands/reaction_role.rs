//! Reaction-role Discord commands - `/reactionrole setup`, `list` and `remove`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{panels, wizard::DiscordWizard},
        },
        core::reaction_role::{self, ReactionRoleSink},
        errors::{Error, Result},
        wizard::{Platform, Wizard},
    };
    use poise::serenity_prelude as serenity;
    use tracing::{info, warn};

    /// Parent command for reaction-role panels.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("reactionrole_setup", "reactionrole_list", "reactionrole_remove")
    )]
    pub async fn reactionrole(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Reaction-role command. Available subcommands:\n\
            `/reactionrole setup` - Set up a new role panel\n\
            `/reactionrole list` - List this server's role panels\n\
            `/reactionrole remove` - Delete a role panel";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Sets up a new reaction-role panel step by step.
    #[poise::command(
        slash_command,
        rename = "setup",
        guild_only,
        required_permissions = "MANAGE_GUILD"
    )]
    pub async fn reactionrole_setup(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?;
        let data = ctx.data();
        let max = data.settings.reaction_roles.max_panels;

        let existing = reaction_role::count_panels(&data.database, &guild_id.to_string()).await?;
        if existing >= u64::try_from(max).unwrap_or(u64::MAX) {
            let message = format!(
                "❌ {} Remove one with `/reactionrole remove` first.",
                Error::PanelLimitReached { max }
            );
            ctx.send(poise::CreateReply::default().content(message).ephemeral(true))
                .await?;
            return Ok(());
        }

        let author_id = ctx.author().id;
        let mut wizard = Wizard::new(
            reaction_role::WIZARD_NAME,
            author_id.get(),
            guild_id.to_string(),
            reaction_role::setup_steps(&data.settings),
        );
        let mut platform = DiscordWizard::new(ctx);
        let sink = ReactionRoleSink::new(&data.database, author_id.to_string());

        match wizard.run(&mut platform, &sink).await {
            Ok(completion) => {
                let record = completion.record;
                if let Err(e) = panels::publish_reaction_role_panel(ctx.http(), &record).await {
                    warn!(panel_id = record.panel.id, "Failed to publish reaction-role panel: {e}");
                    platform
                        .notify(&format!(
                            "⚠️ The panel was saved but could not be posted in <#{}>: {e}",
                            record.panel.channel_id
                        ))
                        .await?;
                }
            }
            Err(reason) => {
                info!(guild_id = %guild_id, %reason, "Reaction-role setup ended without a panel");
            }
        }
        Ok(())
    }

    /// Lists this server's reaction-role panels.
    #[poise::command(slash_command, rename = "list", guild_only)]
    pub async fn reactionrole_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?;
        let panels =
            reaction_role::list_panels(&ctx.data().database, &guild_id.to_string()).await?;

        if panels.is_empty() {
            ctx.say("No reaction-role panels yet. Create one with `/reactionrole setup`!")
                .await?;
            return Ok(());
        }

        let fields: Vec<_> = panels
            .iter()
            .map(|record| {
                (
                    format!("Panel #{}: {}", record.panel.id, record.panel.title),
                    reaction_role::describe_panel(record),
                    false,
                )
            })
            .collect();
        let embed = serenity::CreateEmbed::default()
            .title("**Reaction-Role Panels**")
            .color(0x0058_65F2)
            .fields(fields);

        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Deletes a reaction-role panel. The posted message is left in place.
    #[poise::command(
        slash_command,
        rename = "remove",
        guild_only,
        required_permissions = "MANAGE_GUILD"
    )]
    pub async fn reactionrole_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Panel id, as shown by /reactionrole list"] id: i64,
    ) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?;

        match reaction_role::delete_panel(&ctx.data().database, &guild_id.to_string(), id).await {
            Ok(()) => {
                ctx.say(format!("✅ Reaction-role panel #{id} deleted."))
                    .await?;
            }
            Err(Error::PanelNotFound { .. }) => {
                ctx.say(format!("❌ This server has no reaction-role panel #{id}."))
                    .await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
