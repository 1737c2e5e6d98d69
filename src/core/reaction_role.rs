//! Reaction-role panel business logic.

use crate::{
    config::settings::Settings,
    entities::{ReactionRole, ReactionRolePanel, reaction_role, reaction_role_panel},
    errors::{Error, Result},
    wizard::{
        ButtonStyleToken, ChannelKind, Collected, ConfigSink, EntryKey, Form, FormField,
        InputKind, OptionSource, Rule, StepDefinition,
    },
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Name shown in every prompt of the reaction-role setup wizard.
pub const WIZARD_NAME: &str = "Reaction-role setup";

/// Step keys of the reaction-role setup wizard.
pub mod keys {
    /// Panel channel
    pub const CHANNEL: &str = "channel";
    /// Panel title and description
    pub const MESSAGE: &str = "message";
    /// Role buttons
    pub const ROLES: &str = "roles";
}

/// Builds the reaction-role setup steps.
#[must_use]
pub fn setup_steps(settings: &Settings) -> Vec<StepDefinition> {
    let idle = settings.wizard.idle_timeout();

    vec![
        StepDefinition::new(
            keys::CHANNEL,
            InputKind::Choice(OptionSource::Channels(ChannelKind::Text)),
        )
        .titled("Panel channel", "The role panel will be posted in this channel.")
        .required(),
        StepDefinition::new(
            keys::MESSAGE,
            InputKind::StructuredText(Form::new(
                "Panel message",
                vec![
                    FormField::new("title", "Title").max_length(256),
                    FormField::new("description", "Description")
                        .optional()
                        .long()
                        .max_length(2000),
                ],
            )),
        )
        .titled("Panel message", "Set the title and text members will see on the panel.")
        .required(),
        StepDefinition::new(
            keys::ROLES,
            InputKind::ListBuilder {
                picker: Some(OptionSource::Roles),
                entry_form: Form::new(
                    "Role button",
                    vec![
                        FormField::new("emoji", "Emoji").max_length(64),
                        FormField::new("label", "Label").optional().max_length(80),
                        FormField::new("style", "Style")
                            .optional()
                            .placeholder("primary, secondary, success or danger")
                            .max_length(16),
                    ],
                ),
            },
        )
        .titled(
            "Roles",
            "Pick a role, then give its button an emoji. Each role and emoji can be used once.",
        )
        .required()
        .rule(Rule::MaxItems(settings.reaction_roles.max_roles))
        .rule(Rule::MinItems(1))
        .rule(Rule::Unique(EntryKey::Value))
        .rule(Rule::Unique(EntryKey::Emoji)),
    ]
    .into_iter()
    .map(|step| step.idle_timeout(idle))
    .collect()
}

/// A role button about to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReactionRole {
    /// Role toggled by the button
    pub role_id: String,
    /// Button emoji
    pub emoji: String,
    /// Optional button label
    pub label: Option<String>,
    /// Button style
    pub style: ButtonStyleToken,
}

/// A reaction-role panel about to be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReactionRolePanel {
    /// Owning guild
    pub guild_id: String,
    /// Panel channel
    pub channel_id: String,
    /// Embed title
    pub title: String,
    /// Embed description
    pub description: Option<String>,
    /// Who ran the setup
    pub created_by: String,
    /// Role buttons in order
    pub roles: Vec<NewReactionRole>,
}

fn incomplete(key: &str) -> Error {
    Error::IncompleteSetup {
        key: key.to_string(),
    }
}

impl NewReactionRolePanel {
    /// Maps a completed reaction-role wizard to a storable panel.
    pub fn from_collected(guild_id: &str, created_by: &str, collected: &Collected) -> Result<Self> {
        let channel_id = collected
            .choice(keys::CHANNEL)
            .ok_or_else(|| incomplete(keys::CHANNEL))?;
        let title = collected
            .text(keys::MESSAGE, "title")
            .ok_or_else(|| incomplete(keys::MESSAGE))?;

        let roles = collected
            .list(keys::ROLES)
            .iter()
            .map(|entry| {
                Ok(NewReactionRole {
                    role_id: entry.value.clone().ok_or_else(|| incomplete(keys::ROLES))?,
                    emoji: entry.emoji.clone().ok_or_else(|| incomplete(keys::ROLES))?,
                    label: Some(entry.label.clone()).filter(|l| !l.is_empty()),
                    style: entry.style.unwrap_or(ButtonStyleToken::Secondary),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if roles.is_empty() {
            return Err(incomplete(keys::ROLES));
        }

        Ok(Self {
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            title: title.to_string(),
            description: collected.text(keys::MESSAGE, "description").map(str::to_string),
            created_by: created_by.to_string(),
            roles,
        })
    }
}

/// A stored panel with its roles in button order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionRolePanelRecord {
    /// Panel row
    pub panel: reaction_role_panel::Model,
    /// Role rows, ordered by position
    pub roles: Vec<reaction_role::Model>,
}

impl ReactionRolePanelRecord {
    fn new(panel: reaction_role_panel::Model, mut roles: Vec<reaction_role::Model>) -> Self {
        roles.sort_by_key(|r| r.position);
        Self { panel, roles }
    }

    /// The role behind the button at `position`.
    #[must_use]
    pub fn role_at(&self, position: i32) -> Option<&reaction_role::Model> {
        self.roles.iter().find(|r| r.position == position)
    }
}

/// Counts the reaction-role panels of a guild.
pub async fn count_panels(db: &DatabaseConnection, guild_id: &str) -> Result<u64> {
    ReactionRolePanel::find()
        .filter(reaction_role_panel::Column::GuildId.eq(guild_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Appends a reaction-role panel and its roles in one transaction.
pub async fn append_panel(
    db: &DatabaseConnection,
    new: NewReactionRolePanel,
) -> Result<ReactionRolePanelRecord> {
    let txn = db.begin().await?;

    let panel = reaction_role_panel::ActiveModel {
        guild_id: Set(new.guild_id),
        channel_id: Set(new.channel_id),
        title: Set(new.title),
        description: Set(new.description),
        created_by: Set(new.created_by),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut roles = Vec::with_capacity(new.roles.len());
    for (position, role) in (0_i32..).zip(new.roles) {
        roles.push(
            reaction_role::ActiveModel {
                panel_id: Set(panel.id),
                position: Set(position),
                role_id: Set(role.role_id),
                emoji: Set(role.emoji),
                label: Set(role.label),
                style: Set(role.style.as_str().to_string()),
                ..Default::default()
            }
            .insert(&txn)
            .await?,
        );
    }

    txn.commit().await?;
    info!(panel_id = panel.id, guild_id = %panel.guild_id, "Reaction-role panel stored");
    Ok(ReactionRolePanelRecord::new(panel, roles))
}

/// Lists the reaction-role panels of a guild, oldest first.
pub async fn list_panels(
    db: &DatabaseConnection,
    guild_id: &str,
) -> Result<Vec<ReactionRolePanelRecord>> {
    let rows = ReactionRolePanel::find()
        .filter(reaction_role_panel::Column::GuildId.eq(guild_id))
        .order_by_asc(reaction_role_panel::Column::Id)
        .find_with_related(ReactionRole)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(panel, roles)| ReactionRolePanelRecord::new(panel, roles))
        .collect())
}

/// Finds a panel by id.
pub async fn get_panel(
    db: &DatabaseConnection,
    panel_id: i64,
) -> Result<Option<ReactionRolePanelRecord>> {
    let Some(panel) = ReactionRolePanel::find_by_id(panel_id).one(db).await? else {
        return Ok(None);
    };
    let roles = ReactionRole::find()
        .filter(reaction_role::Column::PanelId.eq(panel_id))
        .all(db)
        .await?;
    Ok(Some(ReactionRolePanelRecord::new(panel, roles)))
}

/// Deletes a guild's panel and its roles.
pub async fn delete_panel(db: &DatabaseConnection, guild_id: &str, panel_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    ReactionRolePanel::find_by_id(panel_id)
        .filter(reaction_role_panel::Column::GuildId.eq(guild_id))
        .one(&txn)
        .await?
        .ok_or(Error::PanelNotFound { id: panel_id })?;

    ReactionRole::delete_many()
        .filter(reaction_role::Column::PanelId.eq(panel_id))
        .exec(&txn)
        .await?;
    ReactionRolePanel::delete_by_id(panel_id).exec(&txn).await?;

    txn.commit().await?;
    info!(panel_id, guild_id, "Reaction-role panel deleted");
    Ok(())
}

/// Completion summary of a stored panel.
#[must_use]
pub fn describe_panel(record: &ReactionRolePanelRecord) -> String {
    let roles = record
        .roles
        .iter()
        .map(|r| format!("{} <@&{}>", r.emoji, r.role_id))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "**Panel #{}** in <#{}>\n**Title:** {}\n**Roles:**\n{roles}",
        record.panel.id, record.panel.channel_id, record.panel.title,
    )
}

/// Stores completed reaction-role setups.
pub struct ReactionRoleSink<'a> {
    db: &'a DatabaseConnection,
    created_by: String,
}

impl<'a> ReactionRoleSink<'a> {
    /// Creates a sink recording `created_by` as the author of the panel.
    pub fn new(db: &'a DatabaseConnection, created_by: impl Into<String>) -> Self {
        Self {
            db,
            created_by: created_by.into(),
        }
    }
}

impl ConfigSink for ReactionRoleSink<'_> {
    type Record = ReactionRolePanelRecord;

    async fn append(&self, owner_id: &str, collected: &Collected) -> Result<ReactionRolePanelRecord> {
        let new = NewReactionRolePanel::from_collected(owner_id, &self.created_by, collected)?;
        append_panel(self.db, new).await
    }

    fn summarize(&self, record: &ReactionRolePanelRecord) -> String {
        format!("✅ Reaction-role panel saved.\n\n{}", describe_panel(record))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use crate::wizard::{Input, ListEntry, Value, Verdict};
    use std::collections::BTreeMap;

    fn role_entry(role: &str, emoji: &str) -> ListEntry {
        ListEntry {
            value: Some(role.to_string()),
            label: String::new(),
            emoji: Some(emoji.to_string()),
            style: None,
            description: None,
        }
    }

    fn completed_setup() -> Collected {
        let mut collected = Collected::new();
        collected.insert(keys::CHANNEL, Value::Choice("10".to_string()));
        collected.insert(
            keys::MESSAGE,
            Value::Fields(BTreeMap::from([
                ("title".to_string(), "Pick your roles".to_string()),
                ("description".to_string(), "  ".to_string()),
            ])),
        );
        collected.insert(
            keys::ROLES,
            Value::List(vec![role_entry("1", "🔴"), role_entry("2", "🔵")]),
        );
        collected
    }

    #[test]
    fn test_roles_step_rejects_duplicate_role_and_emoji() {
        let steps = setup_steps(&Settings::default());
        let roles = &steps[2];
        let draft = Value::List(vec![role_entry("1", "🔴")]);
        let add = |role: &str, emoji: &str| Input::AddEntry {
            value: Some(role.to_string()),
            fields: BTreeMap::from([("emoji".to_string(), emoji.to_string())]),
        };

        let same_role = roles.validate(&add("1", "🟢"), Some(&draft), &Collected::new());
        assert!(matches!(same_role, Verdict::Rejected(_)));
        let same_emoji = roles.validate(&add("3", "🔴"), Some(&draft), &Collected::new());
        assert!(matches!(same_emoji, Verdict::Rejected(_)));
        let fresh = roles.validate(&add("3", "🟢"), Some(&draft), &Collected::new());
        assert!(matches!(fresh, Verdict::Accepted(Value::List(ref e)) if e.len() == 2));
    }

    #[test]
    fn test_from_collected() {
        let new = NewReactionRolePanel::from_collected("g", "u", &completed_setup()).unwrap();
        assert_eq!(new.title, "Pick your roles");
        // Blank description counts as none
        assert_eq!(new.description, None);
        assert_eq!(new.roles.len(), 2);
        assert_eq!(new.roles[0].label, None);
        assert_eq!(new.roles[0].style, ButtonStyleToken::Secondary);
    }

    #[tokio::test]
    async fn test_append_list_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let sink = ReactionRoleSink::new(&db, "u");

        let record = sink.append("g", &completed_setup()).await?;
        assert_eq!(record.role_at(1).unwrap().role_id, "2");
        assert!(sink.summarize(&record).contains("🔵 <@&2>"));
        assert_eq!(count_panels(&db, "g").await?, 1);

        let panels = list_panels(&db, "g").await?;
        assert_eq!(panels, vec![record.clone()]);

        assert!(matches!(
            delete_panel(&db, "other", record.panel.id).await,
            Err(Error::PanelNotFound { .. })
        ));
        delete_panel(&db, "g", record.panel.id).await?;
        assert!(get_panel(&db, record.panel.id).await?.is_none());
        assert_eq!(ReactionRole::find().count(&db).await?, 0);
        Ok(())
    }
}
