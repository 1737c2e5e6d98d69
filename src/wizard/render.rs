//! Prompt rendering.
//!
//! [`render`] turns a step and its current draft into a platform-neutral [`Prompt`]:
//! text plus a list of abstract [`Control`]s. It is a pure function of its inputs, so
//! rendering the same state twice yields identical prompts. Platform adapters map
//! controls to concrete widgets and report interactions back by control id.

use super::step::{Form, InputKind, OptionSource, StepDefinition};
use super::value::{ButtonStyleToken, Collected, Value};

/// Id of the choice control of `Choice` / `MultiChoice` steps.
pub const SELECT_ID: &str = "wizard:select";
/// Id of the button opening a `StructuredText` form.
pub const FORM_ID: &str = "wizard:form";
/// Id of the control adding a list entry.
pub const ADD_ID: &str = "wizard:add";
/// Id of the control removing a list entry.
pub const REMOVE_ID: &str = "wizard:remove";
/// Id of the continue button.
pub const CONTINUE_ID: &str = "wizard:continue";

/// An interactive control, independent of any platform widget set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Control {
    /// Pick from an option source; when `opens_form` is set, picking opens that form
    Select {
        /// Control id
        id: &'static str,
        /// Options
        source: OptionSource,
        /// Placeholder text
        placeholder: String,
        /// Minimum number of selections
        min_values: u8,
        /// Maximum number of selections
        max_values: u8,
        /// Currently drafted selection
        selected: Vec<String>,
        /// Form shown after picking
        opens_form: Option<Form>,
    },
    /// A button; when `opens_form` is set, pressing opens that form
    Button {
        /// Control id
        id: &'static str,
        /// Label
        label: String,
        /// Style
        style: ButtonStyleToken,
        /// Greyed out
        disabled: bool,
        /// Form shown on press
        opens_form: Option<Form>,
    },
    /// Pick one of the current list entries, reported by index
    EntrySelect {
        /// Control id
        id: &'static str,
        /// Placeholder text
        placeholder: String,
        /// Entry summaries, in list order
        entries: Vec<String>,
    },
}

impl Control {
    /// The control id.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Select { id, .. } | Self::Button { id, .. } | Self::EntrySelect { id, .. } => *id,
        }
    }

    /// Form opened by this control, if any.
    #[must_use]
    pub const fn form(&self) -> Option<&Form> {
        match self {
            Self::Select { opens_form, .. } | Self::Button { opens_form, .. } => opens_form.as_ref(),
            Self::EntrySelect { .. } => None,
        }
    }
}

/// Outbound message content for one render.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Prompt {
    /// Heading
    pub title: String,
    /// Body text
    pub description: String,
    /// Named sections, in display order
    pub fields: Vec<(String, String)>,
    /// Inline notice (e.g. why continuing was refused)
    pub notice: Option<String>,
    /// Small print
    pub footer: Option<String>,
    /// Interactive controls; empty for terminal prompts
    pub controls: Vec<Control>,
}

impl Prompt {
    /// A prompt that ends the conversation: text only, no controls.
    pub fn terminal(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Whether the user can still interact with this prompt.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        !self.controls.is_empty()
    }

    /// Looks up a control by id.
    #[must_use]
    pub fn control(&self, id: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.id() == id)
    }
}

/// Where a step sits in its wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Wizard name shown in every heading
    pub wizard: &'a str,
    /// Zero-based step index
    pub position: usize,
    /// Number of steps
    pub total: usize,
}

/// Renders `step` with its current `draft`.
#[must_use]
pub fn render(
    frame: Frame<'_>,
    step: &StepDefinition,
    draft: Option<&Value>,
    collected: &Collected,
    notice: Option<&str>,
) -> Prompt {
    let drafted = draft.filter(|value| !value.is_empty());
    let mut fields = Vec::new();

    match &step.input {
        InputKind::ListBuilder { .. } => {
            let entries = match drafted {
                Some(Value::List(entries)) => entries.as_slice(),
                _ => &[],
            };
            let heading = step.max_items().map_or_else(
                || format!("Entries ({})", entries.len()),
                |max| format!("Entries ({}/{max})", entries.len()),
            );
            let body = if entries.is_empty() {
                "No entries yet.".to_string()
            } else {
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| format!("{}. {}", i + 1, entry.summary()))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            fields.push((heading, body));
        }
        InputKind::Confirm => {}
        _ => {
            let current = drafted.map_or_else(
                || "Nothing selected yet.".to_string(),
                |value| describe(step, value),
            );
            fields.push(("Current value".to_string(), current));
        }
    }

    if !step.required {
        let fallback = step
            .default
            .as_ref()
            .filter(|value| !value.is_empty())
            .map_or_else(|| "none".to_string(), |value| describe(step, value));
        fields.push((
            "Optional".to_string(),
            format!("Skip to keep the default ({fallback})."),
        ));
    }

    Prompt {
        title: format!(
            "{} · Step {}/{}: {}",
            frame.wizard,
            frame.position + 1,
            frame.total,
            step.title
        ),
        description: step.description.clone(),
        fields,
        notice: notice.map(str::to_string),
        footer: Some(format!(
            "{} · {} of {} steps done · Times out after {}s of inactivity",
            if step.required { "Required" } else { "Optional" },
            collected.len(),
            frame.total,
            step.idle_timeout.as_secs()
        )),
        controls: controls(step, drafted),
    }
}

fn controls(step: &StepDefinition, drafted: Option<&Value>) -> Vec<Control> {
    let mut controls = Vec::new();
    match &step.input {
        InputKind::Choice(source) => controls.push(Control::Select {
            id: SELECT_ID,
            source: source.clone(),
            placeholder: format!("Select {}", step.title.to_lowercase()),
            min_values: 0,
            max_values: 1,
            selected: selection(drafted),
            opens_form: None,
        }),
        InputKind::MultiChoice { source, max } => controls.push(Control::Select {
            id: SELECT_ID,
            source: source.clone(),
            placeholder: format!("Select up to {max}"),
            min_values: 0,
            max_values: *max,
            selected: selection(drafted),
            opens_form: None,
        }),
        InputKind::StructuredText(form) => controls.push(Control::Button {
            id: FORM_ID,
            label: if drafted.is_some() { "Edit" } else { "Set value" }.to_string(),
            style: ButtonStyleToken::Secondary,
            disabled: false,
            opens_form: Some(form.clone()),
        }),
        InputKind::ListBuilder { picker, entry_form } => {
            let entries = match drafted {
                Some(Value::List(entries)) => entries.as_slice(),
                _ => &[],
            };
            let full = step.max_items().is_some_and(|max| entries.len() >= max);
            match picker {
                Some(source) if !full => controls.push(Control::Select {
                    id: ADD_ID,
                    source: source.clone(),
                    placeholder: "Pick one to add".to_string(),
                    min_values: 1,
                    max_values: 1,
                    selected: Vec::new(),
                    opens_form: Some(entry_form.clone()),
                }),
                Some(_) => {}
                None => controls.push(Control::Button {
                    id: ADD_ID,
                    label: "Add entry".to_string(),
                    style: ButtonStyleToken::Success,
                    disabled: full,
                    opens_form: Some(entry_form.clone()),
                }),
            }
            if !entries.is_empty() {
                controls.push(Control::EntrySelect {
                    id: REMOVE_ID,
                    placeholder: "Remove an entry".to_string(),
                    entries: entries.iter().map(super::value::ListEntry::summary).collect(),
                });
            }
        }
        InputKind::Confirm => {}
    }

    let skipping = !step.required && drafted.is_none() && !matches!(step.input, InputKind::Confirm);
    controls.push(Control::Button {
        id: CONTINUE_ID,
        label: if skipping { "Skip" } else { "Continue" }.to_string(),
        style: ButtonStyleToken::Primary,
        disabled: false,
        opens_form: None,
    });
    controls
}

fn selection(drafted: Option<&Value>) -> Vec<String> {
    match drafted {
        Some(Value::Choice(choice)) => vec![choice.clone()],
        Some(Value::Choices(choices)) => choices.clone(),
        _ => Vec::new(),
    }
}

fn mention(source: &OptionSource, id: &str) -> String {
    match source {
        OptionSource::Roles => format!("<@&{id}>"),
        OptionSource::Channels(_) => format!("<#{id}>"),
        OptionSource::Static(options) => options
            .iter()
            .find(|o| o.value == id)
            .map_or_else(|| id.to_string(), |o| o.label.clone()),
    }
}

/// Human-readable form of a value in the context of the step that collected it.
#[must_use]
pub fn describe(step: &StepDefinition, value: &Value) -> String {
    let source = match &step.input {
        InputKind::Choice(source) | InputKind::MultiChoice { source, .. } => Some(source),
        _ => None,
    };
    match value {
        Value::Empty => "none".to_string(),
        Value::Confirmed => "confirmed".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Choice(id) => source.map_or_else(|| id.clone(), |s| mention(s, id)),
        Value::Choices(ids) => ids
            .iter()
            .map(|id| source.map_or_else(|| id.clone(), |s| mention(s, id)))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Fields(fields) => {
            let label = |key: &str| match &step.input {
                InputKind::StructuredText(form) => form
                    .fields
                    .iter()
                    .find(|f| f.key == key)
                    .map_or_else(|| key.to_string(), |f| f.label.clone()),
                _ => key.to_string(),
            };
            fields
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| format!("**{}**: {v}", label(k)))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Value::List(entries) => entries
            .iter()
            .map(super::value::ListEntry::summary)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::step::{ChannelKind, FormField};
    use crate::wizard::validate::Rule;
    use crate::wizard::value::ListEntry;

    const FRAME: Frame<'static> = Frame {
        wizard: "Ticket setup",
        position: 1,
        total: 6,
    };

    fn entry(label: &str) -> ListEntry {
        ListEntry {
            value: None,
            label: label.to_string(),
            emoji: None,
            style: None,
            description: None,
        }
    }

    fn list_step() -> StepDefinition {
        StepDefinition::new(
            "choices",
            InputKind::ListBuilder {
                picker: None,
                entry_form: Form::new("Choice", vec![FormField::new("label", "Label")]),
            },
        )
        .titled("Choices", "Add the ticket types.")
        .required()
        .rule(Rule::MaxItems(2))
    }

    #[test]
    fn test_render_is_deterministic() {
        let step = StepDefinition::new("channel", InputKind::Choice(OptionSource::Channels(ChannelKind::Text)))
            .titled("Channel", "Where should the panel go?")
            .required();
        let draft = Value::Choice("55".to_string());
        let collected = Collected::new();

        let first = render(FRAME, &step, Some(&draft), &collected, None);
        let second = render(FRAME, &step, Some(&draft), &collected, None);
        assert_eq!(first, second);
        assert_eq!(first.title, "Ticket setup · Step 2/6: Channel");
        assert_eq!(first.fields[0].1, "<#55>");
    }

    #[test]
    fn test_optional_step_offers_skip_with_default() {
        let step = StepDefinition::new(
            "max_tickets",
            InputKind::StructuredText(Form::new("Max", vec![FormField::new("value", "Max")])),
        )
        .default_value(Value::Number(2));

        let prompt = render(FRAME, &step, None, &Collected::new(), None);
        assert!(prompt.fields.iter().any(|(_, v)| v.contains("default (2)")));
        let Some(Control::Button { label, .. }) = prompt.control(CONTINUE_ID) else {
            panic!("missing continue button");
        };
        assert_eq!(label, "Skip");
        assert!(prompt.control(FORM_ID).and_then(Control::form).is_some());
    }

    #[test]
    fn test_list_controls_follow_entries() {
        let step = list_step();
        let collected = Collected::new();

        let empty = render(FRAME, &step, None, &collected, None);
        assert!(empty.control(REMOVE_ID).is_none());
        assert!(matches!(
            empty.control(ADD_ID),
            Some(Control::Button { disabled: false, .. })
        ));

        let full = Value::List(vec![entry("A"), entry("B")]);
        let prompt = render(FRAME, &step, Some(&full), &collected, Some("Limit reached"));
        assert!(matches!(
            prompt.control(ADD_ID),
            Some(Control::Button { disabled: true, .. })
        ));
        assert!(matches!(
            prompt.control(REMOVE_ID),
            Some(Control::EntrySelect { entries, .. }) if entries.len() == 2
        ));
        assert_eq!(prompt.fields[0].0, "Entries (2/2)");
        assert_eq!(prompt.notice.as_deref(), Some("Limit reached"));
    }

    #[test]
    fn test_terminal_prompt_has_no_controls() {
        let prompt = Prompt::terminal("Timed out", "No input received.");
        assert!(!prompt.is_interactive());
    }
}
