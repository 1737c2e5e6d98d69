//! Published panels and their buttons.
//!
//! Panels are posted once a setup wizard stores them. Their buttons carry the panel id
//! and the button position in the custom id, so the handlers here only need the
//! database to find out what a click means.

use crate::{
    bot::BotData,
    core::{
        reaction_role::{self, ReactionRolePanelRecord},
        ticket::{self, TicketPanelRecord},
    },
    entities::ticket_choice,
    errors::{Error, Result},
    wizard::validate::is_valid_emoji,
};
use poise::serenity_prelude as serenity;
use tracing::{info, instrument, warn};

const TICKET_PREFIX: &str = "ticket:open:";
const TICKET_CLOSE_ID: &str = "ticket:close";
const ROLE_PREFIX: &str = "rr:";
const PANEL_COLOUR: u32 = 0x0058_65F2;
/// Messages included in a transcript.
const TRANSCRIPT_LIMIT: u8 = 100;

/// A click on a published panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
    /// Open a ticket from this panel's choice
    OpenTicket {
        /// Panel id
        panel_id: i64,
        /// Choice position
        position: i32,
    },
    /// Close the ticket channel the button sits in
    CloseTicket,
    /// Toggle the role behind this panel's button
    ToggleRole {
        /// Panel id
        panel_id: i64,
        /// Role position
        position: i32,
    },
}

fn parse_pair(rest: &str) -> Option<(i64, i32)> {
    let (panel, position) = rest.split_once(':')?;
    Some((panel.parse().ok()?, position.parse().ok()?))
}

impl PanelAction {
    /// Parses a button custom id; `None` for ids that are not panel buttons.
    #[must_use]
    pub fn parse(custom_id: &str) -> Option<Self> {
        if custom_id == TICKET_CLOSE_ID {
            return Some(Self::CloseTicket);
        }
        if let Some(rest) = custom_id.strip_prefix(TICKET_PREFIX) {
            let (panel_id, position) = parse_pair(rest)?;
            return Some(Self::OpenTicket { panel_id, position });
        }
        let (panel_id, position) = parse_pair(custom_id.strip_prefix(ROLE_PREFIX)?)?;
        Some(Self::ToggleRole { panel_id, position })
    }

    /// The custom id carried by the button.
    #[must_use]
    pub fn custom_id(&self) -> String {
        match self {
            Self::OpenTicket { panel_id, position } => format!("{TICKET_PREFIX}{panel_id}:{position}"),
            Self::CloseTicket => TICKET_CLOSE_ID.to_string(),
            Self::ToggleRole { panel_id, position } => format!("{ROLE_PREFIX}{panel_id}:{position}"),
        }
    }
}

/// Converts a stored Discord id.
pub fn parse_id(value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| Error::InvalidId {
            value: value.to_string(),
        })
}

fn style_of(token: &str) -> serenity::ButtonStyle {
    match token {
        "secondary" => serenity::ButtonStyle::Secondary,
        "success" => serenity::ButtonStyle::Success,
        "danger" => serenity::ButtonStyle::Danger,
        _ => serenity::ButtonStyle::Primary,
    }
}

fn with_emoji(button: serenity::CreateButton, emoji: Option<&str>) -> serenity::CreateButton {
    match emoji
        .filter(|e| is_valid_emoji(e))
        .and_then(|e| serenity::ReactionType::try_from(e).ok())
    {
        Some(reaction) => button.emoji(reaction),
        None => button,
    }
}

fn rows(buttons: Vec<serenity::CreateButton>) -> Vec<serenity::CreateActionRow> {
    let mut rows = Vec::new();
    let mut iter = buttons.into_iter().peekable();
    while iter.peek().is_some() {
        rows.push(serenity::CreateActionRow::Buttons(iter.by_ref().take(5).collect()));
    }
    rows
}

/// Posts a ticket panel in its channel.
#[instrument(skip(http, record), fields(panel_id = record.panel.id))]
pub async fn publish_ticket_panel(
    http: &serenity::Http,
    record: &TicketPanelRecord,
) -> Result<serenity::Message> {
    let channel = serenity::ChannelId::new(parse_id(&record.panel.channel_id)?);
    let buttons = record
        .choices
        .iter()
        .map(|choice| {
            let action = PanelAction::OpenTicket {
                panel_id: record.panel.id,
                position: choice.position,
            };
            with_emoji(
                serenity::CreateButton::new(action.custom_id())
                    .label(&choice.label)
                    .style(style_of(&choice.style)),
                choice.emoji.as_deref(),
            )
        })
        .collect();

    let embed = serenity::CreateEmbed::new()
        .title("🎫 Support tickets")
        .description("Press a button below to open a private ticket with the staff team.")
        .color(PANEL_COLOUR);
    let message = channel
        .send_message(http, serenity::CreateMessage::new().embed(embed).components(rows(buttons)))
        .await?;
    info!("Ticket panel published");
    Ok(message)
}

/// Posts a reaction-role panel in its channel.
#[instrument(skip(http, record), fields(panel_id = record.panel.id))]
pub async fn publish_reaction_role_panel(
    http: &serenity::Http,
    record: &ReactionRolePanelRecord,
) -> Result<serenity::Message> {
    let channel = serenity::ChannelId::new(parse_id(&record.panel.channel_id)?);
    let buttons = record
        .roles
        .iter()
        .map(|role| {
            let action = PanelAction::ToggleRole {
                panel_id: record.panel.id,
                position: role.position,
            };
            let mut button = serenity::CreateButton::new(action.custom_id())
                .style(style_of(&role.style));
            if let Some(label) = &role.label {
                button = button.label(label);
            }
            with_emoji(button, Some(&role.emoji))
        })
        .collect();

    let mut embed = serenity::CreateEmbed::new()
        .title(&record.panel.title)
        .color(PANEL_COLOUR);
    if let Some(description) = &record.panel.description {
        embed = embed.description(description);
    }
    let message = channel
        .send_message(http, serenity::CreateMessage::new().embed(embed).components(rows(buttons)))
        .await?;
    info!("Reaction-role panel published");
    Ok(message)
}

async fn reply_ephemeral(
    http: &serenity::Http,
    interaction: &serenity::ComponentInteraction,
    text: impl Into<String>,
) -> Result<()> {
    let message = serenity::CreateInteractionResponseMessage::new()
        .content(text)
        .ephemeral(true);
    interaction
        .create_response(http, serenity::CreateInteractionResponse::Message(message))
        .await?;
    Ok(())
}

/// Handles clicks on published panels. Other interactions are ignored.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(action) = PanelAction::parse(&interaction.data.custom_id) else {
        return Ok(());
    };
    match action {
        PanelAction::OpenTicket { panel_id, position } => {
            open_ticket(ctx, interaction, data, panel_id, position).await
        }
        PanelAction::CloseTicket => close_ticket(ctx, interaction, data).await,
        PanelAction::ToggleRole { panel_id, position } => {
            toggle_role(ctx, interaction, data, panel_id, position).await
        }
    }
}

fn channel_name(user: &serenity::User) -> String {
    let name: String = user
        .name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(80)
        .collect();
    if name.is_empty() {
        format!("ticket-{}", user.id)
    } else {
        format!("ticket-{name}")
    }
}

#[instrument(skip(ctx, interaction, data), fields(user_id = %interaction.user.id))]
async fn open_ticket(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
    panel_id: i64,
    position: i32,
) -> Result<()> {
    let http: &serenity::Http = &ctx.http;
    let Some(guild_id) = interaction.guild_id else {
        return Err(Error::GuildOnly);
    };
    let record = match ticket::get_panel(&data.database, panel_id).await? {
        Some(record) if record.panel.guild_id == guild_id.to_string() => record,
        _ => return reply_ephemeral(http, interaction, "❌ This ticket panel no longer exists.").await,
    };
    let Some(choice) = record.choices.iter().find(|c| c.position == position) else {
        return reply_ephemeral(http, interaction, "❌ This ticket option no longer exists.").await;
    };

    interaction.defer_ephemeral(http).await?;

    let (content, result) = match create_ticket(http, interaction, guild_id, &record, choice).await {
        Ok(content) => (content, Ok(())),
        Err(e) => (failure_line("open your ticket", &e), Err(e)),
    };
    interaction
        .edit_response(http, serenity::EditInteractionResponse::new().content(content))
        .await?;
    result
}

/// User-facing line for a panel action that failed after the interaction was answered.
fn failure_line(action: &str, error: &Error) -> String {
    format!("❌ Could not {action}: {error}")
}

/// Creates the private ticket channel and returns the line to show the clicker.
async fn create_ticket(
    http: &serenity::Http,
    interaction: &serenity::ComponentInteraction,
    guild_id: serenity::GuildId,
    record: &TicketPanelRecord,
    choice: &ticket_choice::Model,
) -> Result<String> {
    let user = &interaction.user;
    let open = guild_id
        .channels(http)
        .await?
        .values()
        .filter_map(|c| c.topic.as_deref().and_then(ticket::parse_ticket_topic))
        .filter(|&(panel, owner)| panel == record.panel.id && owner == user.id.get())
        .count();
    if i64::try_from(open).unwrap_or(i64::MAX) >= i64::from(record.panel.max_tickets) {
        return Ok(format!(
            "❌ You already have {open} open ticket(s). Close one before opening another."
        ));
    }

    let staff_role = serenity::RoleId::new(parse_id(&record.panel.staff_role_id)?);
    let category = serenity::ChannelId::new(parse_id(&record.panel.category_id)?);
    let visible = serenity::Permissions::VIEW_CHANNEL
        | serenity::Permissions::SEND_MESSAGES
        | serenity::Permissions::READ_MESSAGE_HISTORY
        | serenity::Permissions::ATTACH_FILES;
    let overwrites = vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::VIEW_CHANNEL,
            kind: serenity::PermissionOverwriteType::Role(guild_id.everyone_role()),
        },
        serenity::PermissionOverwrite {
            allow: visible,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(user.id),
        },
        serenity::PermissionOverwrite {
            allow: visible,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Role(staff_role),
        },
    ];

    let channel = guild_id
        .create_channel(
            http,
            serenity::CreateChannel::new(channel_name(user))
                .kind(serenity::ChannelType::Text)
                .category(category)
                .topic(ticket::ticket_topic(record.panel.id, user.id.get()))
                .permissions(overwrites),
        )
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title(format!("🎫 {}", choice.label))
        .description(
            choice
                .description
                .clone()
                .unwrap_or_else(|| "Describe your request and a staff member will be with you shortly.".to_string()),
        )
        .color(PANEL_COLOUR);
    let close = serenity::CreateButton::new(PanelAction::CloseTicket.custom_id())
        .label("Close ticket")
        .style(serenity::ButtonStyle::Danger);
    channel
        .send_message(
            http,
            serenity::CreateMessage::new()
                .content(format!("<@{}> <@&{staff_role}>", user.id))
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(vec![close])]),
        )
        .await?;

    info!(panel_id = record.panel.id, channel_id = %channel.id, "Ticket opened");
    Ok(format!("✅ Your ticket is open: <#{}>", channel.id))
}

async fn build_transcript(
    http: &serenity::Http,
    channel: serenity::ChannelId,
) -> Result<String> {
    let mut messages = channel
        .messages(http, serenity::GetMessages::new().limit(TRANSCRIPT_LIMIT))
        .await?;
    messages.reverse();

    let transcript = messages
        .iter()
        .map(|m| format!("[{}] {}: {}", m.timestamp, m.author.name, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(transcript)
}

#[instrument(skip(ctx, interaction, data), fields(channel_id = %interaction.channel_id))]
async fn close_ticket(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let http: &serenity::Http = &ctx.http;
    let channel_id = interaction.channel_id;
    let topic = channel_id
        .to_channel(http)
        .await?
        .guild()
        .and_then(|channel| channel.topic);
    let Some((panel_id, owner)) = topic.as_deref().and_then(ticket::parse_ticket_topic) else {
        return reply_ephemeral(http, interaction, "❌ This is not a ticket channel.").await;
    };

    reply_ephemeral(http, interaction, "🔒 Closing this ticket…").await?;

    let transcript_channel = ticket::get_panel(&data.database, panel_id)
        .await?
        .and_then(|record| record.panel.transcript_channel_id);
    if let Some(target) = transcript_channel {
        if let Err(e) = post_transcript(http, channel_id, &target, owner, &interaction.user).await {
            warn!(panel_id, "Failed to post ticket transcript: {e}");
        }
    }

    channel_id.delete(http).await?;
    info!(panel_id, "Ticket closed");
    Ok(())
}

async fn post_transcript(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    target: &str,
    owner: u64,
    closed_by: &serenity::User,
) -> Result<()> {
    let transcript = build_transcript(http, channel_id).await?;
    let target = serenity::ChannelId::new(parse_id(target)?);
    let file = serenity::CreateAttachment::bytes(
        transcript.into_bytes(),
        format!("transcript-{channel_id}.txt"),
    );
    target
        .send_message(
            http,
            serenity::CreateMessage::new()
                .content(format!(
                    "📝 Transcript of a ticket opened by <@{owner}>, closed by <@{}>.",
                    closed_by.id
                ))
                .add_file(file),
        )
        .await?;
    Ok(())
}

#[instrument(skip(ctx, interaction, data), fields(user_id = %interaction.user.id))]
async fn toggle_role(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
    panel_id: i64,
    position: i32,
) -> Result<()> {
    let http: &serenity::Http = &ctx.http;
    let Some(member) = interaction.member.as_ref() else {
        return Err(Error::GuildOnly);
    };
    let role = reaction_role::get_panel(&data.database, panel_id)
        .await?
        .filter(|record| record.panel.guild_id == member.guild_id.to_string())
        .and_then(|record| record.role_at(position).map(|r| r.role_id.clone()));
    let Some(role) = role else {
        return reply_ephemeral(http, interaction, "❌ This role button no longer exists.").await;
    };
    match apply_role_toggle(http, member, &role).await {
        Ok(line) => reply_ephemeral(http, interaction, line).await,
        Err(e) => {
            reply_ephemeral(http, interaction, failure_line("update your roles", &e)).await?;
            Err(e)
        }
    }
}

async fn apply_role_toggle(
    http: &serenity::Http,
    member: &serenity::Member,
    role: &str,
) -> Result<String> {
    let role_id = serenity::RoleId::new(parse_id(role)?);
    if member.roles.contains(&role_id) {
        member.remove_role(http, role_id).await?;
        Ok(format!("Removed <@&{role_id}>."))
    } else {
        member.add_role(http, role_id).await?;
        Ok(format!("Added <@&{role_id}>."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_action_custom_ids() {
        for action in [
            PanelAction::OpenTicket {
                panel_id: 3,
                position: 1,
            },
            PanelAction::CloseTicket,
            PanelAction::ToggleRole {
                panel_id: 9,
                position: 0,
            },
        ] {
            assert_eq!(PanelAction::parse(&action.custom_id()), Some(action));
        }
    }

    #[test]
    fn test_foreign_custom_ids_are_ignored() {
        assert_eq!(PanelAction::parse("123:wizard:continue"), None);
        assert_eq!(PanelAction::parse("ticket:open:x:1"), None);
        assert_eq!(PanelAction::parse("rr:1"), None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("123456789012345678").ok(), Some(123_456_789_012_345_678));
        assert!(matches!(parse_id("0"), Err(Error::InvalidId { .. })));
        assert!(parse_id("abc").is_err());
    }

    #[test]
    fn test_style_of_falls_back_to_primary() {
        assert_eq!(style_of("danger"), serenity::ButtonStyle::Danger);
        assert_eq!(style_of("unknown"), serenity::ButtonStyle::Primary);
    }

    #[test]
    fn test_failure_line_names_action_and_cause() {
        let error = parse_id("not-an-id").unwrap_err();
        let line = failure_line("open your ticket", &error);
        assert!(line.starts_with("❌ Could not open your ticket: "));
        assert!(line.ends_with(&error.to_string()));
    }
}
