//! Static step definitions.
//!
//! A wizard is an ordered list of [`StepDefinition`]s authored once per wizard type.
//! Definitions never change while a wizard runs; the per-step draft lives in the
//! step controller and accepted values live in the orchestrator's collected map.

use super::validate::Rule;
use super::value::Value;
use std::time::Duration;

/// Idle window applied to every step unless overridden.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Kind of channel offered by a channel picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    /// Text channels
    Text,
    /// Channel categories
    Category,
}

/// A fixed option of a static choice list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Value reported when selected
    pub value: String,
    /// Label shown to the user
    pub label: String,
    /// Optional secondary text
    pub description: Option<String>,
}

impl ChoiceOption {
    /// Creates an option whose value and label differ.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
        }
    }
}

/// Where the options of a choice control come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionSource {
    /// Options listed in the definition
    Static(Vec<ChoiceOption>),
    /// The guild's roles, resolved by the platform
    Roles,
    /// The guild's channels of one kind, resolved by the platform
    Channels(ChannelKind),
}

/// One field of a structured-text form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormField {
    /// Key under which the submitted text is reported
    pub key: String,
    /// Label shown above the input
    pub label: String,
    /// Whether the platform should refuse an empty submission
    pub required: bool,
    /// Multi-line input
    pub long: bool,
    /// Placeholder text
    pub placeholder: Option<String>,
    /// Maximum accepted length
    pub max_length: Option<u16>,
}

impl FormField {
    /// Creates a required single-line field.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            required: true,
            long: false,
            placeholder: None,
            max_length: None,
        }
    }

    /// Marks the field optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Makes the field multi-line.
    #[must_use]
    pub const fn long(mut self) -> Self {
        self.long = true;
        self
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Caps the input length.
    #[must_use]
    pub const fn max_length(mut self, max_length: u16) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// A structured free-text form (a modal on Discord).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Form {
    /// Form title
    pub title: String,
    /// Fields in display order
    pub fields: Vec<FormField>,
}

impl Form {
    /// Creates a form.
    pub fn new(title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }
}

/// The control category a step collects its value with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Pick exactly one option
    Choice(OptionSource),
    /// Pick up to `max` options
    MultiChoice {
        /// Option source
        source: OptionSource,
        /// Maximum number of selections
        max: u8,
    },
    /// Fill in a form
    StructuredText(Form),
    /// Build a list of entries, each described by `entry_form`; when `picker` is set
    /// each entry starts by picking its value from that source
    ListBuilder {
        /// Source of the entry value, if entries carry one
        picker: Option<OptionSource>,
        /// Form describing one entry
        entry_form: Form,
    },
    /// Only a continue button
    Confirm,
}

/// One static step of a wizard.
#[derive(Clone, Debug)]
pub struct StepDefinition {
    /// Key of the collected value
    pub key: String,
    /// Prompt title
    pub title: String,
    /// Prompt description
    pub description: String,
    /// Whether continuing requires an accepted value
    pub required: bool,
    /// Control category
    pub input: InputKind,
    /// Value used when an optional step is continued without input
    pub default: Option<Value>,
    /// Validation rules, applied in order
    pub rules: Vec<Rule>,
    /// Inactivity bound for this step
    pub idle_timeout: Duration,
}

impl StepDefinition {
    /// Creates an optional step with no rules and the default idle timeout.
    pub fn new(key: impl Into<String>, input: InputKind) -> Self {
        let key = key.into();
        Self {
            title: key.clone(),
            key,
            description: String::new(),
            required: false,
            input,
            default: None,
            rules: Vec::new(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Sets the prompt title and description.
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.title = title.into();
        self.description = description.into();
        self
    }

    /// Marks the step required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value an optional step falls back to.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Appends a validation rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Overrides the idle timeout.
    #[must_use]
    pub const fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Largest list size allowed by a `MaxItems` rule, if any.
    #[must_use]
    pub fn max_items(&self) -> Option<usize> {
        self.rules.iter().find_map(|rule| match rule {
            Rule::MaxItems(max) => Some(*max),
            _ => None,
        })
    }

    /// Smallest list size required by a `MinItems` rule, if any.
    #[must_use]
    pub fn min_items(&self) -> Option<usize> {
        self.rules.iter().find_map(|rule| match rule {
            Rule::MinItems(min) => Some(*min),
            _ => None,
        })
    }
}
