//! Discord rendering of setup wizards.
//!
//! [`DiscordWizard`] implements the wizard [`Platform`] on top of one ephemeral reply:
//! prompts become an embed plus components, form controls open modals, and every
//! transition answers the interaction that caused it with an in-place message update.

use crate::{
    bot::BotData,
    errors::{Error, Result},
    wizard::{
        ButtonStyleToken, ChannelKind, Control, Form, Input, OptionSource, Platform, Prompt,
        Signal,
        render::{ADD_ID, CONTINUE_ID, FORM_ID, REMOVE_ID, SELECT_ID},
    },
};
use poise::serenity_prelude as serenity;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Discord renders at most this many buttons per row.
const BUTTONS_PER_ROW: usize = 5;
/// Select menus list at most this many options.
const MAX_OPTIONS: usize = 25;
/// Embed colour shared by all wizard prompts.
const WIZARD_COLOUR: u32 = 0x0058_65F2;

/// An interaction that still expects a response.
enum Pending {
    Component(serenity::ComponentInteraction),
    Modal(serenity::ModalInteraction),
}

impl Pending {
    async fn respond(
        &self,
        http: &serenity::Http,
        response: serenity::CreateInteractionResponse,
    ) -> Result<()> {
        match self {
            Self::Component(i) => i.create_response(http, response).await?,
            Self::Modal(i) => i.create_response(http, response).await?,
        }
        Ok(())
    }
}

/// What a component interaction asks the wizard to do.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    /// Forward this input
    Input(Input),
    /// Show `form`; the submission becomes an `AddEntry` (when `add` is set) or `Submit`
    OpenForm {
        form: Form,
        picked: Option<String>,
        add: bool,
    },
    /// Nothing to forward
    Ignore,
}

/// Wizard platform backed by a poise slash-command invocation.
pub struct DiscordWizard<'a> {
    ctx: poise::Context<'a, BotData, Error>,
    prefix: String,
    handle: Option<poise::ReplyHandle<'a>>,
    message_id: Option<serenity::MessageId>,
    current: Option<Prompt>,
    pending: Option<Pending>,
    foreign: Option<serenity::ComponentInteraction>,
    carried: Option<serenity::ComponentInteraction>,
}

impl<'a> DiscordWizard<'a> {
    /// Creates a platform answering through `ctx`.
    pub fn new(ctx: poise::Context<'a, BotData, Error>) -> Self {
        Self {
            ctx,
            prefix: ctx.id().to_string(),
            handle: None,
            message_id: None,
            current: None,
            pending: None,
            foreign: None,
            carried: None,
        }
    }

    fn http(&self) -> &serenity::Http {
        self.ctx.http()
    }

    /// Answers an interaction nobody responded to, so Discord does not report a failure.
    async fn acknowledge_stale(&mut self) {
        if let Some(pending) = self.pending.take() {
            if let Err(e) = pending
                .respond(self.http(), serenity::CreateInteractionResponse::Acknowledge)
                .await
            {
                debug!("Failed to acknowledge interaction: {e}");
            }
        }
    }

    async fn next_component(&mut self) -> Option<serenity::ComponentInteraction> {
        if let Some(carried) = self.carried.take() {
            return Some(carried);
        }
        let message_id = self.message_id?;
        serenity::ComponentInteractionCollector::new(self.ctx.serenity_context())
            .message_id(message_id)
            .next()
            .await
    }

    /// Opens `form` as a modal and waits for it. A click elsewhere on the wizard while
    /// the modal is open abandons it; that click is handled next.
    async fn await_form(
        &mut self,
        interaction: &serenity::ComponentInteraction,
        form: &Form,
    ) -> Option<BTreeMap<String, String>> {
        let modal_id = format!("{}:modal:{}", self.prefix, interaction.id);
        let modal = build_modal(&modal_id, form);
        if let Err(e) = interaction
            .create_response(self.http(), serenity::CreateInteractionResponse::Modal(modal))
            .await
        {
            warn!("Failed to open form: {e}");
            return None;
        }

        let shard = self.ctx.serenity_context();
        let user_id = interaction.user.id;
        let submitted = serenity::ModalInteractionCollector::new(shard)
            .author_id(user_id)
            .filter(move |m| m.data.custom_id == modal_id)
            .next();
        let other_click = serenity::ComponentInteractionCollector::new(shard)
            .message_id(interaction.message.id)
            .next();

        tokio::select! {
            modal = submitted => {
                let modal = modal?;
                let fields = modal_fields(&modal.data.components);
                self.pending = Some(Pending::Modal(modal));
                Some(fields)
            }
            click = other_click => {
                self.carried = click;
                None
            }
        }
    }
}

impl Platform for DiscordWizard<'_> {
    async fn render(&mut self, prompt: &Prompt) -> Result<()> {
        let embed = build_embed(prompt);
        let components = build_components(&self.prefix, prompt);
        self.current = Some(prompt.clone());

        if let Some(pending) = self.pending.take() {
            let message = serenity::CreateInteractionResponseMessage::new()
                .embed(embed)
                .components(components);
            return pending
                .respond(
                    self.http(),
                    serenity::CreateInteractionResponse::UpdateMessage(message),
                )
                .await;
        }

        let reply = poise::CreateReply::default()
            .embed(embed)
            .components(components)
            .ephemeral(true);
        if let Some(handle) = &self.handle {
            handle.edit(self.ctx, reply).await?;
        } else {
            let handle = self.ctx.send(reply).await?;
            self.message_id = Some(handle.message().await?.id);
            self.handle = Some(handle);
        }
        Ok(())
    }

    async fn notify(&mut self, text: &str) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            let message = serenity::CreateInteractionResponseMessage::new()
                .content(text)
                .ephemeral(true);
            return pending
                .respond(self.http(), serenity::CreateInteractionResponse::Message(message))
                .await;
        }
        self.ctx
            .send(poise::CreateReply::default().content(text).ephemeral(true))
            .await?;
        Ok(())
    }

    async fn next_signal(&mut self) -> Option<Signal> {
        self.acknowledge_stale().await;

        loop {
            let interaction = self.next_component().await?;
            let user_id = interaction.user.id.get();
            if user_id != self.ctx.author().id.get() {
                self.foreign = Some(interaction);
                return Some(Signal::new(user_id, Input::Continue));
            }

            let control = interaction
                .data
                .custom_id
                .strip_prefix(&self.prefix)
                .and_then(|id| id.strip_prefix(':'))
                .and_then(|id| self.current.as_ref()?.control(id))
                .cloned();
            let action = control.map_or(Action::Ignore, |c| action_for(&c, &interaction.data.kind));

            match action {
                Action::Input(input) => {
                    self.pending = Some(Pending::Component(interaction));
                    return Some(Signal::new(user_id, input));
                }
                Action::OpenForm { form, picked, add } => {
                    let Some(fields) = self.await_form(&interaction, &form).await else {
                        continue;
                    };
                    let input = if add {
                        Input::AddEntry {
                            value: picked,
                            fields,
                        }
                    } else {
                        Input::Submit(fields)
                    };
                    return Some(Signal::new(user_id, input));
                }
                Action::Ignore => {
                    debug!(custom_id = %interaction.data.custom_id, "Unhandled wizard interaction");
                    self.pending = Some(Pending::Component(interaction));
                    self.acknowledge_stale().await;
                }
            }
        }
    }

    async fn reject_foreign(&mut self, _signal: &Signal) {
        let Some(interaction) = self.foreign.take() else {
            return;
        };
        let message = serenity::CreateInteractionResponseMessage::new()
            .content(format!(
                "Only <@{}> can use this setup.",
                self.ctx.author().id
            ))
            .ephemeral(true);
        if let Err(e) = interaction
            .create_response(self.http(), serenity::CreateInteractionResponse::Message(message))
            .await
        {
            debug!("Failed to turn away foreign interaction: {e}");
        }
    }
}

/// Maps a click on `control` to a wizard action.
fn action_for(control: &Control, data: &serenity::ComponentInteractionDataKind) -> Action {
    match control {
        Control::Button {
            disabled: true, ..
        } => Action::Ignore,
        Control::Button {
            id, opens_form, ..
        } => match (opens_form, *id) {
            (Some(form), _) => Action::OpenForm {
                form: form.clone(),
                picked: None,
                add: *id == ADD_ID,
            },
            (None, CONTINUE_ID) => Action::Input(Input::Continue),
            (None, _) => Action::Ignore,
        },
        Control::Select {
            id, opens_form, ..
        } => {
            let values = selected_values(data);
            match opens_form {
                Some(form) => Action::OpenForm {
                    form: form.clone(),
                    picked: values.into_iter().next(),
                    add: *id == ADD_ID,
                },
                None => Action::Input(Input::Select(values)),
            }
        }
        Control::EntrySelect { .. } => selected_values(data)
            .first()
            .and_then(|v| v.parse().ok())
            .map_or(Action::Ignore, |index| Action::Input(Input::RemoveEntry(index))),
    }
}

fn selected_values(data: &serenity::ComponentInteractionDataKind) -> Vec<String> {
    use serenity::ComponentInteractionDataKind as Kind;
    match data {
        Kind::StringSelect { values } => values.clone(),
        Kind::RoleSelect { values } => values.iter().map(ToString::to_string).collect(),
        Kind::ChannelSelect { values } => values.iter().map(ToString::to_string).collect(),
        Kind::UserSelect { values } => values.iter().map(ToString::to_string).collect(),
        Kind::MentionableSelect { values } => values.iter().map(ToString::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Collects submitted modal inputs by custom id.
fn modal_fields(rows: &[serenity::ActionRow]) -> BTreeMap<String, String> {
    rows.iter()
        .flat_map(|row| &row.components)
        .filter_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) => Some((
                input.custom_id.clone(),
                input.value.clone().unwrap_or_default(),
            )),
            _ => None,
        })
        .collect()
}

const fn button_style(style: ButtonStyleToken) -> serenity::ButtonStyle {
    match style {
        ButtonStyleToken::Primary => serenity::ButtonStyle::Primary,
        ButtonStyleToken::Secondary => serenity::ButtonStyle::Secondary,
        ButtonStyleToken::Success => serenity::ButtonStyle::Success,
        ButtonStyleToken::Danger => serenity::ButtonStyle::Danger,
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn parse_ids<T: From<u64>>(values: &[String]) -> Vec<T> {
    values
        .iter()
        .filter_map(|v| v.parse::<u64>().ok())
        .filter(|id| *id != 0)
        .map(T::from)
        .collect()
}

fn build_embed(prompt: &Prompt) -> serenity::CreateEmbed {
    let mut description = prompt.description.clone();
    if let Some(notice) = &prompt.notice {
        description.push_str(&format!("\n\n⚠️ {notice}"));
    }

    let mut embed = serenity::CreateEmbed::new()
        .title(truncate(&prompt.title, 256))
        .description(description)
        .color(WIZARD_COLOUR)
        .fields(
            prompt
                .fields
                .iter()
                .map(|(name, value)| (truncate(name, 256), truncate(value, 1024), false)),
        );
    if let Some(footer) = &prompt.footer {
        embed = embed.footer(serenity::CreateEmbedFooter::new(footer));
    }
    embed
}

fn build_modal(custom_id: &str, form: &Form) -> serenity::CreateModal {
    let rows = form
        .fields
        .iter()
        .map(|field| {
            let style = if field.long {
                serenity::InputTextStyle::Paragraph
            } else {
                serenity::InputTextStyle::Short
            };
            let mut input = serenity::CreateInputText::new(style, truncate(&field.label, 45), &field.key)
                .required(field.required);
            if let Some(placeholder) = &field.placeholder {
                input = input.placeholder(truncate(placeholder, 100));
            }
            if let Some(max) = field.max_length {
                input = input.max_length(max);
            }
            serenity::CreateActionRow::InputText(input)
        })
        .collect();
    serenity::CreateModal::new(custom_id, truncate(&form.title, 45)).components(rows)
}

/// Groups controls into Discord rows: each select takes a row, buttons share rows.
fn layout(controls: &[Control]) -> Vec<Vec<&Control>> {
    let mut rows: Vec<Vec<&Control>> = Vec::new();
    let mut buttons: Vec<&Control> = Vec::new();
    for control in controls {
        if matches!(control, Control::Button { .. }) {
            if buttons.len() == BUTTONS_PER_ROW {
                rows.push(std::mem::take(&mut buttons));
            }
            buttons.push(control);
        } else {
            rows.push(vec![control]);
        }
    }
    if !buttons.is_empty() {
        rows.push(buttons);
    }
    rows
}

fn build_control_row(prefix: &str, row: &[&Control]) -> Option<serenity::CreateActionRow> {
    let custom_id = |id: &str| format!("{prefix}:{id}");
    match row {
        [Control::Select {
            id,
            source,
            placeholder,
            min_values,
            max_values,
            selected,
            ..
        }] => {
            let kind = match source {
                OptionSource::Static(options) => serenity::CreateSelectMenuKind::String {
                    options: options
                        .iter()
                        .take(MAX_OPTIONS)
                        .map(|o| {
                            let mut option = serenity::CreateSelectMenuOption::new(
                                truncate(&o.label, 100),
                                &o.value,
                            )
                            .default_selection(selected.contains(&o.value));
                            if let Some(description) = &o.description {
                                option = option.description(truncate(description, 100));
                            }
                            option
                        })
                        .collect(),
                },
                OptionSource::Roles => serenity::CreateSelectMenuKind::Role {
                    default_roles: Some(parse_ids(selected)),
                },
                OptionSource::Channels(kind) => serenity::CreateSelectMenuKind::Channel {
                    channel_types: Some(vec![match kind {
                        ChannelKind::Text => serenity::ChannelType::Text,
                        ChannelKind::Category => serenity::ChannelType::Category,
                    }]),
                    default_channels: Some(parse_ids(selected)),
                },
            };
            Some(serenity::CreateActionRow::SelectMenu(
                serenity::CreateSelectMenu::new(custom_id(id), kind)
                    .placeholder(truncate(placeholder, 150))
                    .min_values(*min_values)
                    .max_values(*max_values),
            ))
        }
        [Control::EntrySelect {
            id,
            placeholder,
            entries,
        }] => {
            let options = entries
                .iter()
                .take(MAX_OPTIONS)
                .enumerate()
                .map(|(index, entry)| {
                    serenity::CreateSelectMenuOption::new(truncate(entry, 100), index.to_string())
                })
                .collect();
            Some(serenity::CreateActionRow::SelectMenu(
                serenity::CreateSelectMenu::new(
                    custom_id(id),
                    serenity::CreateSelectMenuKind::String { options },
                )
                .placeholder(truncate(placeholder, 150)),
            ))
        }
        buttons => {
            let buttons: Vec<_> = buttons
                .iter()
                .filter_map(|control| match control {
                    Control::Button {
                        id,
                        label,
                        style,
                        disabled,
                        ..
                    } => Some(
                        serenity::CreateButton::new(custom_id(id))
                            .label(truncate(label, 80))
                            .style(button_style(*style))
                            .disabled(*disabled),
                    ),
                    _ => None,
                })
                .collect();
            (!buttons.is_empty()).then_some(serenity::CreateActionRow::Buttons(buttons))
        }
    }
}

fn build_components(prefix: &str, prompt: &Prompt) -> Vec<serenity::CreateActionRow> {
    layout(&prompt.controls)
        .iter()
        .filter_map(|row| build_control_row(prefix, row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::FormField;

    fn button(id: &'static str, opens_form: Option<Form>) -> Control {
        Control::Button {
            id,
            label: id.to_string(),
            style: ButtonStyleToken::Primary,
            disabled: false,
            opens_form,
        }
    }

    fn form() -> Form {
        Form::new("Entry", vec![FormField::new("label", "Label")])
    }

    #[test]
    fn test_layout_gives_selects_their_own_row() {
        let select = Control::Select {
            id: SELECT_ID,
            source: OptionSource::Roles,
            placeholder: "Pick".to_string(),
            min_values: 1,
            max_values: 1,
            selected: Vec::new(),
            opens_form: None,
        };
        let controls = vec![select, button(ADD_ID, None), button(CONTINUE_ID, None)];
        let rows = layout(&controls);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1].len(), 2);
    }

    #[test]
    fn test_layout_wraps_buttons() {
        let controls: Vec<_> = (0..7).map(|_| button(CONTINUE_ID, None)).collect();
        let rows = layout(&controls);
        assert_eq!(rows.iter().map(Vec::len).collect::<Vec<_>>(), [5, 2]);
    }

    #[test]
    fn test_role_select_maps_to_select_input() {
        let control = Control::Select {
            id: SELECT_ID,
            source: OptionSource::Roles,
            placeholder: String::new(),
            min_values: 1,
            max_values: 1,
            selected: Vec::new(),
            opens_form: None,
        };
        let data = serenity::ComponentInteractionDataKind::RoleSelect {
            values: vec![serenity::RoleId::new(42)],
        };
        assert_eq!(
            action_for(&control, &data),
            Action::Input(Input::Select(vec!["42".to_string()]))
        );
    }

    #[test]
    fn test_picker_select_opens_entry_form() {
        let control = Control::Select {
            id: ADD_ID,
            source: OptionSource::Roles,
            placeholder: String::new(),
            min_values: 1,
            max_values: 1,
            selected: Vec::new(),
            opens_form: Some(form()),
        };
        let data = serenity::ComponentInteractionDataKind::RoleSelect {
            values: vec![serenity::RoleId::new(7)],
        };
        assert_eq!(
            action_for(&control, &data),
            Action::OpenForm {
                form: form(),
                picked: Some("7".to_string()),
                add: true,
            }
        );
    }

    #[test]
    fn test_buttons_map_to_actions() {
        let data = serenity::ComponentInteractionDataKind::Button;
        assert_eq!(
            action_for(&button(CONTINUE_ID, None), &data),
            Action::Input(Input::Continue)
        );
        assert!(matches!(
            action_for(&button(FORM_ID, Some(form())), &data),
            Action::OpenForm { add: false, .. }
        ));
        let disabled = Control::Button {
            id: ADD_ID,
            label: String::new(),
            style: ButtonStyleToken::Primary,
            disabled: true,
            opens_form: Some(form()),
        };
        assert_eq!(action_for(&disabled, &data), Action::Ignore);
    }

    #[test]
    fn test_entry_select_maps_to_removal() {
        let control = Control::EntrySelect {
            id: REMOVE_ID,
            placeholder: String::new(),
            entries: vec!["A".to_string(), "B".to_string()],
        };
        let data = serenity::ComponentInteractionDataKind::StringSelect {
            values: vec!["1".to_string()],
        };
        assert_eq!(
            action_for(&control, &data),
            Action::Input(Input::RemoveEntry(1))
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
