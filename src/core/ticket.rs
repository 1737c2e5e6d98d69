//! Ticket panel business logic - setup wizard definition and panel persistence.
//!
//! A ticket panel is written in one database transaction (panel row plus its choice
//! rows) once the setup wizard completes. Nothing is written while the wizard runs.

use crate::{
    config::settings::Settings,
    entities::{TicketChoice, TicketPanel, ticket_choice, ticket_panel},
    errors::{Error, Result},
    wizard::{
        ButtonStyleToken, ChannelKind, Collected, ConfigSink, EntryKey, Form, FormField,
        InputKind, NumericFallback, OptionSource, Rule, StepDefinition, Value,
    },
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Name shown in every prompt of the ticket setup wizard.
pub const WIZARD_NAME: &str = "Ticket setup";

/// Step keys of the ticket setup wizard.
pub mod keys {
    /// Staff role
    pub const STAFF_ROLE: &str = "staff_role";
    /// Open tickets per user
    pub const MAX_TICKETS: &str = "max_tickets";
    /// Transcript channel
    pub const TRANSCRIPT_CHANNEL: &str = "transcript_channel";
    /// Ticket choices
    pub const CHOICES: &str = "choices";
    /// Ticket category
    pub const CATEGORY: &str = "category";
    /// Panel channel
    pub const CHANNEL: &str = "channel";
}

/// Builds the ticket setup steps.
#[must_use]
pub fn setup_steps(settings: &Settings) -> Vec<StepDefinition> {
    let idle = settings.wizard.idle_timeout();
    let tickets = &settings.tickets;
    let on_invalid = if tickets.strict_numbers {
        NumericFallback::Reject
    } else {
        NumericFallback::KeepPrevious
    };

    vec![
        StepDefinition::new(keys::STAFF_ROLE, InputKind::Choice(OptionSource::Roles))
            .titled("Staff role", "Choose the role that can see and answer tickets.")
            .required(),
        StepDefinition::new(
            keys::MAX_TICKETS,
            InputKind::StructuredText(Form::new(
                "Open tickets per user",
                vec![
                    FormField::new("value", "Open tickets per user")
                        .placeholder(format!("1-{}", tickets.max_tickets_limit))
                        .max_length(3),
                ],
            )),
        )
        .titled(
            "Open tickets per user",
            "How many tickets may one member have open at the same time?",
        )
        .default_value(Value::Number(tickets.default_max_tickets))
        .rule(Rule::Integer {
            field: "value".to_string(),
            min: 1,
            max: tickets.max_tickets_limit,
            on_invalid,
        }),
        StepDefinition::new(
            keys::TRANSCRIPT_CHANNEL,
            InputKind::Choice(OptionSource::Channels(ChannelKind::Text)),
        )
        .titled(
            "Transcript channel",
            "Where should transcripts of closed tickets be posted? Skip to disable transcripts.",
        ),
        StepDefinition::new(
            keys::CHOICES,
            InputKind::ListBuilder {
                picker: None,
                entry_form: Form::new(
                    "Ticket choice",
                    vec![
                        FormField::new("label", "Label").max_length(80),
                        FormField::new("emoji", "Emoji").optional().max_length(64),
                        FormField::new("style", "Style")
                            .optional()
                            .placeholder("primary, secondary, success or danger")
                            .max_length(16),
                        FormField::new("description", "Opening message")
                            .optional()
                            .long()
                            .max_length(1000),
                    ],
                ),
            },
        )
        .titled(
            "Ticket choices",
            "Add one button per kind of ticket (e.g. Billing, Support).",
        )
        .required()
        .rule(Rule::MaxItems(tickets.max_choices))
        .rule(Rule::MinItems(1))
        .rule(Rule::Unique(EntryKey::Label)),
        StepDefinition::new(
            keys::CATEGORY,
            InputKind::Choice(OptionSource::Channels(ChannelKind::Category)),
        )
        .titled("Ticket category", "Ticket channels will be created in this category.")
        .required(),
        StepDefinition::new(
            keys::CHANNEL,
            InputKind::Choice(OptionSource::Channels(ChannelKind::Text)),
        )
        .titled("Panel channel", "The ticket panel will be posted in this channel.")
        .required(),
    ]
    .into_iter()
    .map(|step| step.idle_timeout(idle))
    .collect()
}

/// A ticket choice about to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTicketChoice {
    /// Button label
    pub label: String,
    /// Optional button emoji
    pub emoji: Option<String>,
    /// Button style
    pub style: ButtonStyleToken,
    /// Opening message
    pub description: Option<String>,
}

/// A ticket panel about to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTicketPanel {
    /// Owning guild
    pub guild_id: String,
    /// Staff role
    pub staff_role_id: String,
    /// Open tickets per user
    pub max_tickets: i32,
    /// Transcript channel, if transcripts are enabled
    pub transcript_channel_id: Option<String>,
    /// Ticket category
    pub category_id: String,
    /// Panel channel
    pub channel_id: String,
    /// Who ran the setup
    pub created_by: String,
    /// Choices in button order
    pub choices: Vec<NewTicketChoice>,
}

fn required_choice(collected: &Collected, key: &str) -> Result<String> {
    collected
        .choice(key)
        .map(str::to_string)
        .ok_or_else(|| Error::IncompleteSetup {
            key: key.to_string(),
        })
}

impl NewTicketPanel {
    /// Maps a completed ticket setup wizard to a storable panel.
    pub fn from_collected(guild_id: &str, created_by: &str, collected: &Collected) -> Result<Self> {
        let max_tickets = collected
            .number(keys::MAX_TICKETS)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| Error::IncompleteSetup {
                key: keys::MAX_TICKETS.to_string(),
            })?;

        let choices: Vec<NewTicketChoice> = collected
            .list(keys::CHOICES)
            .iter()
            .map(|entry| NewTicketChoice {
                label: entry.label.clone(),
                emoji: entry.emoji.clone(),
                style: entry.style.unwrap_or(ButtonStyleToken::Primary),
                description: entry.description.clone(),
            })
            .collect();
        if choices.is_empty() {
            return Err(Error::IncompleteSetup {
                key: keys::CHOICES.to_string(),
            });
        }

        Ok(Self {
            guild_id: guild_id.to_string(),
            staff_role_id: required_choice(collected, keys::STAFF_ROLE)?,
            max_tickets,
            transcript_channel_id: collected.choice(keys::TRANSCRIPT_CHANNEL).map(str::to_string),
            category_id: required_choice(collected, keys::CATEGORY)?,
            channel_id: required_choice(collected, keys::CHANNEL)?,
            created_by: created_by.to_string(),
            choices,
        })
    }
}

/// A stored panel with its choices in button order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketPanelRecord {
    /// Panel row
    pub panel: ticket_panel::Model,
    /// Choice rows, ordered by position
    pub choices: Vec<ticket_choice::Model>,
}

impl TicketPanelRecord {
    fn new(panel: ticket_panel::Model, mut choices: Vec<ticket_choice::Model>) -> Self {
        choices.sort_by_key(|c| c.position);
        Self { panel, choices }
    }
}

/// Counts the ticket panels of a guild.
pub async fn count_panels(db: &DatabaseConnection, guild_id: &str) -> Result<u64> {
    TicketPanel::find()
        .filter(ticket_panel::Column::GuildId.eq(guild_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Appends a ticket panel and its choices in one transaction.
pub async fn append_panel(db: &DatabaseConnection, new: NewTicketPanel) -> Result<TicketPanelRecord> {
    let txn = db.begin().await?;

    let panel = ticket_panel::ActiveModel {
        guild_id: Set(new.guild_id),
        staff_role_id: Set(new.staff_role_id),
        max_tickets: Set(new.max_tickets),
        transcript_channel_id: Set(new.transcript_channel_id),
        category_id: Set(new.category_id),
        channel_id: Set(new.channel_id),
        created_by: Set(new.created_by),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut choices = Vec::with_capacity(new.choices.len());
    for (position, choice) in (0_i32..).zip(new.choices) {
        let model = ticket_choice::ActiveModel {
            panel_id: Set(panel.id),
            position: Set(position),
            label: Set(choice.label),
            emoji: Set(choice.emoji),
            style: Set(choice.style.as_str().to_string()),
            description: Set(choice.description),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        choices.push(model);
    }

    txn.commit().await?;
    info!(panel_id = panel.id, guild_id = %panel.guild_id, "Ticket panel stored");
    Ok(TicketPanelRecord::new(panel, choices))
}

/// Lists the ticket panels of a guild, oldest first.
pub async fn list_panels(db: &DatabaseConnection, guild_id: &str) -> Result<Vec<TicketPanelRecord>> {
    let rows = TicketPanel::find()
        .filter(ticket_panel::Column::GuildId.eq(guild_id))
        .order_by_asc(ticket_panel::Column::Id)
        .find_with_related(TicketChoice)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(panel, choices)| TicketPanelRecord::new(panel, choices))
        .collect())
}

/// Finds a panel by id.
pub async fn get_panel(db: &DatabaseConnection, panel_id: i64) -> Result<Option<TicketPanelRecord>> {
    let Some(panel) = TicketPanel::find_by_id(panel_id).one(db).await? else {
        return Ok(None);
    };
    let choices = TicketChoice::find()
        .filter(ticket_choice::Column::PanelId.eq(panel_id))
        .all(db)
        .await?;
    Ok(Some(TicketPanelRecord::new(panel, choices)))
}

/// Deletes a guild's panel and its choices.
pub async fn delete_panel(db: &DatabaseConnection, guild_id: &str, panel_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    TicketPanel::find_by_id(panel_id)
        .filter(ticket_panel::Column::GuildId.eq(guild_id))
        .one(&txn)
        .await?
        .ok_or(Error::PanelNotFound { id: panel_id })?;

    TicketChoice::delete_many()
        .filter(ticket_choice::Column::PanelId.eq(panel_id))
        .exec(&txn)
        .await?;
    TicketPanel::delete_by_id(panel_id).exec(&txn).await?;

    txn.commit().await?;
    info!(panel_id, guild_id, "Ticket panel deleted");
    Ok(())
}

/// Channel topic marking a ticket channel opened by `user_id` from `panel_id`.
#[must_use]
pub fn ticket_topic(panel_id: i64, user_id: u64) -> String {
    format!("ticket:{panel_id}:{user_id}")
}

/// Reads `(panel_id, user_id)` back from a ticket channel topic.
#[must_use]
pub fn parse_ticket_topic(topic: &str) -> Option<(i64, u64)> {
    let rest = topic.strip_prefix("ticket:")?;
    let (panel, user) = rest.split_once(':')?;
    Some((panel.parse().ok()?, user.parse().ok()?))
}

/// Completion summary of a stored panel.
#[must_use]
pub fn describe_panel(record: &TicketPanelRecord) -> String {
    let panel = &record.panel;
    let transcripts = panel
        .transcript_channel_id
        .as_ref()
        .map_or_else(|| "disabled".to_string(), |id| format!("<#{id}>"));
    let choices = record
        .choices
        .iter()
        .map(|c| match &c.emoji {
            Some(emoji) => format!("{emoji} {}", c.label),
            None => c.label.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "**Panel #{}**\n\
        **Staff role:** <@&{}>\n\
        **Open tickets per user:** {}\n\
        **Transcripts:** {transcripts}\n\
        **Category:** <#{}>\n\
        **Panel channel:** <#{}>\n\
        **Choices:** {choices}",
        panel.id, panel.staff_role_id, panel.max_tickets, panel.category_id, panel.channel_id,
    )
}

/// Stores completed ticket setups.
pub struct TicketPanelSink<'a> {
    db: &'a DatabaseConnection,
    created_by: String,
}

impl<'a> TicketPanelSink<'a> {
    /// Creates a sink recording `created_by` as the author of the panel.
    pub fn new(db: &'a DatabaseConnection, created_by: impl Into<String>) -> Self {
        Self {
            db,
            created_by: created_by.into(),
        }
    }
}

impl ConfigSink for TicketPanelSink<'_> {
    type Record = TicketPanelRecord;

    async fn append(&self, owner_id: &str, collected: &Collected) -> Result<TicketPanelRecord> {
        let new = NewTicketPanel::from_collected(owner_id, &self.created_by, collected)?;
        append_panel(self.db, new).await
    }

    fn summarize(&self, record: &TicketPanelRecord) -> String {
        format!("✅ Ticket panel saved.\n\n{}", describe_panel(record))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use crate::wizard::ListEntry;

    fn completed_setup() -> Collected {
        let mut collected = Collected::new();
        collected.insert(keys::STAFF_ROLE, Value::Choice("100".to_string()));
        collected.insert(keys::MAX_TICKETS, Value::Number(3));
        collected.insert(keys::TRANSCRIPT_CHANNEL, Value::Empty);
        collected.insert(
            keys::CHOICES,
            Value::List(vec![
                ListEntry {
                    value: None,
                    label: "Billing".to_string(),
                    emoji: Some("💳".to_string()),
                    style: Some(ButtonStyleToken::Success),
                    description: None,
                },
                ListEntry {
                    value: None,
                    label: "Support".to_string(),
                    emoji: None,
                    style: None,
                    description: Some("Describe your problem.".to_string()),
                },
            ]),
        );
        collected.insert(keys::CATEGORY, Value::Choice("200".to_string()));
        collected.insert(keys::CHANNEL, Value::Choice("300".to_string()));
        collected
    }

    #[test]
    fn test_setup_steps_follow_settings() {
        let mut settings = Settings::default();
        settings.tickets.max_choices = 7;
        settings.tickets.strict_numbers = true;
        settings.wizard.idle_timeout_secs = 30;

        let steps = setup_steps(&settings);
        let order: Vec<_> = steps.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            order,
            [
                keys::STAFF_ROLE,
                keys::MAX_TICKETS,
                keys::TRANSCRIPT_CHANNEL,
                keys::CHOICES,
                keys::CATEGORY,
                keys::CHANNEL
            ]
        );
        assert!(steps.iter().all(|s| s.idle_timeout.as_secs() == 30));
        assert_eq!(steps[3].max_items(), Some(7));
        assert!(steps[1].rules.iter().any(|r| matches!(
            r,
            Rule::Integer {
                on_invalid: NumericFallback::Reject,
                ..
            }
        )));
        assert_eq!(steps[1].default, Some(Value::Number(2)));
        assert!(!steps[2].required);
    }

    #[test]
    fn test_from_collected() {
        let new = NewTicketPanel::from_collected("1", "42", &completed_setup()).unwrap();
        assert_eq!(new.staff_role_id, "100");
        assert_eq!(new.max_tickets, 3);
        assert_eq!(new.transcript_channel_id, None);
        assert_eq!(new.choices.len(), 2);
        assert_eq!(new.choices[1].style, ButtonStyleToken::Primary);
    }

    #[test]
    fn test_from_collected_requires_every_step() {
        let mut collected = completed_setup();
        collected.insert(keys::CATEGORY, Value::Empty);
        assert!(matches!(
            NewTicketPanel::from_collected("1", "42", &collected),
            Err(Error::IncompleteSetup { key }) if key == keys::CATEGORY
        ));
    }

    #[tokio::test]
    async fn test_append_and_list_panels() -> Result<()> {
        let db = setup_test_db().await?;
        let new = NewTicketPanel::from_collected("1", "42", &completed_setup())?;

        let record = append_panel(&db, new.clone()).await?;
        assert_eq!(record.choices.len(), 2);
        assert_eq!(record.choices[0].label, "Billing");
        assert_eq!(record.choices[0].style, "success");

        append_panel(&db, new).await?;
        assert_eq!(count_panels(&db, "1").await?, 2);
        assert_eq!(count_panels(&db, "other").await?, 0);

        let panels = list_panels(&db, "1").await?;
        assert_eq!(panels.len(), 2);
        let positions: Vec<_> = panels[1].choices.iter().map(|c| c.position).collect();
        assert_eq!(positions, [0, 1]);

        let fetched = get_panel(&db, record.panel.id).await?.unwrap();
        assert_eq!(fetched, record);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_panel() -> Result<()> {
        let db = setup_test_db().await?;
        let new = NewTicketPanel::from_collected("1", "42", &completed_setup())?;
        let record = append_panel(&db, new).await?;

        // Another guild cannot delete it
        assert!(matches!(
            delete_panel(&db, "2", record.panel.id).await,
            Err(Error::PanelNotFound { .. })
        ));

        delete_panel(&db, "1", record.panel.id).await?;
        assert!(get_panel(&db, record.panel.id).await?.is_none());
        let orphans = TicketChoice::find()
            .filter(ticket_choice::Column::PanelId.eq(record.panel.id))
            .count(&db)
            .await?;
        assert_eq!(orphans, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_sink_appends_once() -> Result<()> {
        let db = setup_test_db().await?;
        let sink = TicketPanelSink::new(&db, "42");

        let record = sink.append("1", &completed_setup()).await?;
        assert_eq!(record.panel.created_by, "42");
        let summary = sink.summarize(&record);
        assert!(summary.contains("<@&100>"));
        assert!(summary.contains("**Transcripts:** disabled"));
        assert!(summary.contains("💳 Billing, Support"));
        assert_eq!(count_panels(&db, "1").await?, 1);

        // Incomplete setups never reach the database
        assert!(sink.append("1", &Collected::new()).await.is_err());
        assert_eq!(count_panels(&db, "1").await?, 1);
        Ok(())
    }

    #[test]
    fn test_ticket_topic_round_trip() {
        let topic = ticket_topic(5, 1234);
        assert_eq!(parse_ticket_topic(&topic), Some((5, 1234)));
        assert_eq!(parse_ticket_topic("general chat"), None);
        assert_eq!(parse_ticket_topic("ticket:x:1"), None);
    }
}
