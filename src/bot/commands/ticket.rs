//! Ticket panel Discord commands - `/ticket setup`, `/ticket list` and `/ticket remove`.
//!
//! Setup runs the ticket setup wizard in an ephemeral message, stores the panel through
//! the core module and finally posts the panel in its channel.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{panels, wizard::DiscordWizard},
        },
        core::ticket::{self, TicketPanelSink},
        errors::{Error, Result},
        wizard::{Platform, Wizard},
    };
    use poise::serenity_prelude as serenity;
    use tracing::{info, warn};

    /// Parent command for ticket panels.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("ticket_setup", "ticket_list", "ticket_remove")
    )]
    pub async fn ticket(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Ticket panel command. Available subcommands:\n\
            `/ticket setup` - Set up a new ticket panel\n\
            `/ticket list` - List this server's ticket panels\n\
            `/ticket remove` - Delete a ticket panel";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Sets up a new ticket panel step by step.
    #[poise::command(
        slash_command,
        rename = "setup",
        guild_only,
        required_permissions = "MANAGE_GUILD"
    )]
    pub async fn ticket_setup(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?;
        let data = ctx.data();
        let max = data.settings.tickets.max_panels;

        let existing = ticket::count_panels(&data.database, &guild_id.to_string()).await?;
        if existing >= u64::try_from(max).unwrap_or(u64::MAX) {
            let message = format!(
                "❌ {} Remove one with `/ticket remove` first.",
                Error::PanelLimitReached { max }
            );
            ctx.send(poise::CreateReply::default().content(message).ephemeral(true))
                .await?;
            return Ok(());
        }

        let author_id = ctx.author().id;
        let mut wizard = Wizard::new(
            ticket::WIZARD_NAME,
            author_id.get(),
            guild_id.to_string(),
            ticket::setup_steps(&data.settings),
        );
        let mut platform = DiscordWizard::new(ctx);
        let sink = TicketPanelSink::new(&data.database, author_id.to_string());

        match wizard.run(&mut platform, &sink).await {
            Ok(completion) => {
                let record = completion.record;
                if let Err(e) = panels::publish_ticket_panel(ctx.http(), &record).await {
                    warn!(panel_id = record.panel.id, "Failed to publish ticket panel: {e}");
                    platform
                        .notify(&format!(
                            "⚠️ The panel was saved but could not be posted in <#{}>: {e}",
                            record.panel.channel_id
                        ))
                        .await?;
                }
            }
            Err(reason) => info!(guild_id = %guild_id, %reason, "Ticket setup ended without a panel"),
        }
        Ok(())
    }

    /// Lists this server's ticket panels.
    #[poise::command(slash_command, rename = "list", guild_only)]
    pub async fn ticket_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?;
        let panels = ticket::list_panels(&ctx.data().database, &guild_id.to_string()).await?;

        if panels.is_empty() {
            ctx.say("No ticket panels yet. Create one with `/ticket setup`!")
                .await?;
            return Ok(());
        }

        let fields: Vec<_> = panels
            .iter()
            .map(|record| {
                (
                    format!("Panel #{}", record.panel.id),
                    ticket::describe_panel(record),
                    false,
                )
            })
            .collect();
        let embed = serenity::CreateEmbed::default()
            .title("**Ticket Panels**")
            .color(0x0058_65F2)
            .fields(fields);

        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Deletes a ticket panel. The posted message is left in place.
    #[poise::command(
        slash_command,
        rename = "remove",
        guild_only,
        required_permissions = "MANAGE_GUILD"
    )]
    pub async fn ticket_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Panel id, as shown by /ticket list"] id: i64,
    ) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?;

        match ticket::delete_panel(&ctx.data().database, &guild_id.to_string(), id).await {
            Ok(()) => {
                ctx.say(format!("✅ Ticket panel #{id} deleted.")).await?;
            }
            Err(Error::PanelNotFound { .. }) => {
                ctx.say(format!("❌ This server has no ticket panel #{id}."))
                    .await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
