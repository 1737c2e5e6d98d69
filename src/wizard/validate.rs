//! Step validation.
//!
//! Validation is pure: given the raw input of one signal, the step's current draft
//! and the values collected so far, a step either accepts a new draft value or
//! rejects the input with a user-readable [`Rejection`]. Nothing here touches the
//! platform or the session.

use super::collector::Input;
use super::step::{InputKind, OptionSource, StepDefinition};
use super::value::{ButtonStyleToken, Collected, ListEntry, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// What an invalid numeric input turns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NumericFallback {
    /// Silently keep the previous draft (or the step default)
    #[default]
    KeepPrevious,
    /// Reject with [`Rejection::NotANumber`]
    Reject,
}

/// Entry attribute that must be unique within a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKey {
    /// Label, compared case-insensitively
    Label,
    /// Emoji token
    Emoji,
    /// Picked value (e.g. role id)
    Value,
}

impl EntryKey {
    const fn name(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Emoji => "emoji",
            Self::Value => "value",
        }
    }
}

/// Step-specific constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Parse form field `field` as an integer within `min..=max`
    Integer {
        /// Form field holding the number
        field: String,
        /// Smallest accepted value
        min: i64,
        /// Largest accepted value
        max: i64,
        /// Behaviour on unparsable input
        on_invalid: NumericFallback,
    },
    /// No two entries share this attribute
    Unique(EntryKey),
    /// List holds at most this many entries
    MaxItems(usize),
    /// List must hold at least this many entries to continue
    MinItems(usize),
}

/// Why an input was not accepted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Nothing was selected.")]
    Empty,

    #[error("This step needs a value before you can continue.")]
    RequiredMissing,

    #[error("`{field}` cannot be empty.")]
    MissingField { field: String },

    #[error("`{field}` must be a whole number.")]
    NotANumber { field: String },

    #[error("The value must be between {min} and {max}.")]
    OutOfRange { min: i64, max: i64 },

    #[error("An entry with {key} `{value}` already exists.")]
    Duplicate { key: &'static str, value: String },

    #[error("Limit reached: at most {max} entries are allowed.")]
    LimitReached { max: usize },

    #[error("Add at least {min} entries before continuing.")]
    BelowMinimum { min: usize },

    #[error("At most {max} options can be selected.")]
    TooManySelections { max: u8 },

    #[error("`{token}` is not a button style. Use primary, secondary, success or danger.")]
    InvalidStyle { token: String },

    #[error("`{token}` is not a valid emoji.")]
    InvalidEmoji { token: String },

    #[error("`{value}` is not one of the offered options.")]
    UnknownOption { value: String },

    #[error("There is no entry #{}.", .index.saturating_add(1))]
    UnknownEntry { index: usize },
}

/// Result of validating one signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// New draft value
    Accepted(Value),
    /// Input refused; the draft stays as it was
    Rejected(Rejection),
    /// Signal kind has no meaning for this step
    Ignored,
}

impl From<Result<Value, Rejection>> for Verdict {
    fn from(result: Result<Value, Rejection>) -> Self {
        match result {
            Ok(value) => Self::Accepted(value),
            Err(rejection) => Self::Rejected(rejection),
        }
    }
}

/// Parses a style token, accepting the usual colour synonyms.
///
/// An empty token means "not supplied" and yields `Ok(None)`.
pub fn parse_style(token: &str) -> Result<Option<ButtonStyleToken>, Rejection> {
    let normalized = token.trim().to_lowercase();
    let style = match normalized.as_str() {
        "" => return Ok(None),
        "primary" | "blurple" | "blue" => ButtonStyleToken::Primary,
        "secondary" | "grey" | "gray" => ButtonStyleToken::Secondary,
        "success" | "green" => ButtonStyleToken::Success,
        "danger" | "red" => ButtonStyleToken::Danger,
        _ => {
            return Err(Rejection::InvalidStyle {
                token: token.trim().to_string(),
            });
        }
    };
    Ok(Some(style))
}

/// Whether `token` is a custom emoji (`<:name:id>`, `<a:name:id>`) or a Unicode emoji sequence.
#[must_use]
pub fn is_valid_emoji(token: &str) -> bool {
    let token = token.trim();
    if token.starts_with('<') {
        return is_custom_emoji(token);
    }
    is_unicode_emoji(token)
}

fn is_custom_emoji(token: &str) -> bool {
    let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
        return false;
    };
    let parts: Vec<&str> = inner.split(':').collect();
    let [animated, name, id] = parts.as_slice() else {
        return false;
    };
    (animated.is_empty() || *animated == "a")
        && (2..=32).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && (15..=21).contains(&id.len())
        && id.chars().all(|c| c.is_ascii_digit())
}

const ZWJ: char = '\u{200D}';
const VS16: char = '\u{FE0F}';
const KEYCAP: char = '\u{20E3}';
const TAG_END: char = '\u{E007F}';

/// Longest zero-width-joiner chain in use (families, couples with skin tones).
const MAX_ZWJ_ELEMENTS: usize = 4;

const fn is_pictograph(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1F1E5
            | 0x1F200..=0x1F3FA
            | 0x1F400..=0x1FAFF
            | 0x2600..=0x27BF
            | 0x231A..=0x231B
            | 0x2328
            | 0x23CF
            | 0x23E9..=0x23F3
            | 0x23F8..=0x23FA
            | 0x2194..=0x2199
            | 0x21A9..=0x21AA
            | 0x2934..=0x2935
            | 0x25AA..=0x25AB
            | 0x25B6
            | 0x25C0
            | 0x25FB..=0x25FE
            | 0x2B05..=0x2B07
            | 0x2B1B..=0x2B1C
            | 0x2B50
            | 0x2B55
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0x00A9
            | 0x00AE
            | 0x203C
            | 0x2049
            | 0x2122
            | 0x2139
            | 0x24C2
    )
}

const fn is_regional_indicator(c: char) -> bool {
    matches!(c as u32, 0x1F1E6..=0x1F1FF)
}

const fn is_skin_tone(c: char) -> bool {
    matches!(c as u32, 0x1F3FB..=0x1F3FF)
}

const fn is_tag(c: char) -> bool {
    matches!(c as u32, 0xE0020..=0xE007E)
}

const fn is_keycap_base(c: char) -> bool {
    c.is_ascii_digit() || c == '#' || c == '*'
}

/// Exactly one emoji: a keycap, a flag, or a ZWJ chain of pictographs.
fn is_unicode_emoji(token: &str) -> bool {
    let chars: Vec<char> = token.chars().collect();
    match chars.as_slice() {
        [] => false,
        [a, b] if is_regional_indicator(*a) && is_regional_indicator(*b) => true,
        [key, KEYCAP] | [key, VS16, KEYCAP] => is_keycap_base(*key),
        _ => {
            let elements: Vec<&[char]> = chars.split(|&c| c == ZWJ).collect();
            elements.len() <= MAX_ZWJ_ELEMENTS && elements.iter().all(|e| is_emoji_element(e))
        }
    }
}

/// One pictograph with an optional presentation selector, skin tone and tag run.
fn is_emoji_element(element: &[char]) -> bool {
    let Some((&base, mut rest)) = element.split_first() else {
        return false;
    };
    if !is_pictograph(base) {
        return false;
    }
    if let [VS16, tail @ ..] = rest {
        rest = tail;
    }
    if let [tone, tail @ ..] = rest {
        if is_skin_tone(*tone) {
            rest = tail;
        }
    }
    if let [VS16, tail @ ..] = rest {
        rest = tail;
    }
    match rest {
        [] => true,
        [tags @ .., TAG_END] => !tags.is_empty() && tags.iter().all(|&c| is_tag(c)),
        _ => false,
    }
}

fn trimmed(fields: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), v.trim().to_string()))
        .collect()
}

fn field<'a>(fields: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    fields.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

impl StepDefinition {
    /// Validates a value-producing input against this step.
    ///
    /// `Continue` is not a value-producing input; use [`StepDefinition::confirm`] for it.
    #[must_use]
    pub fn validate(&self, input: &Input, draft: Option<&Value>, _collected: &Collected) -> Verdict {
        match (&self.input, input) {
            (InputKind::Choice(source), Input::Select(values)) => {
                self.select_one(source, values).into()
            }
            (InputKind::MultiChoice { source, max }, Input::Select(values)) => {
                self.select_many(source, *max, values).into()
            }
            (InputKind::StructuredText(form), Input::Submit(fields)) => {
                let fields = trimmed(fields);
                if let Some(missing) = form
                    .fields
                    .iter()
                    .find(|f| f.required && field(&fields, &f.key).is_none())
                {
                    return Verdict::Rejected(Rejection::MissingField {
                        field: missing.label.clone(),
                    });
                }
                self.submit(fields, draft).into()
            }
            (InputKind::ListBuilder { picker, entry_form }, Input::AddEntry { value, fields }) => {
                if let Some(max) = self.max_items() {
                    if current_entries(draft).len() >= max {
                        return Verdict::Rejected(Rejection::LimitReached { max });
                    }
                }
                let fields = trimmed(fields);
                if let Some(missing) = entry_form
                    .fields
                    .iter()
                    .find(|f| f.required && field(&fields, &f.key).is_none())
                {
                    return Verdict::Rejected(Rejection::MissingField {
                        field: missing.label.clone(),
                    });
                }
                self.add_entry(picker.as_ref(), value.as_deref(), &fields, draft)
                    .into()
            }
            (InputKind::ListBuilder { .. }, Input::RemoveEntry(index)) => {
                let mut entries = current_entries(draft);
                if *index >= entries.len() {
                    return Verdict::Rejected(Rejection::UnknownEntry { index: *index });
                }
                entries.remove(*index);
                Verdict::Accepted(Value::List(entries))
            }
            _ => Verdict::Ignored,
        }
    }

    /// Continue-time gate: turns the draft into the value to advance with.
    ///
    /// Required steps without a value yield [`Rejection::RequiredMissing`]; lists below a
    /// `MinItems` bound yield [`Rejection::BelowMinimum`]; optional steps without a value
    /// advance with their default (or [`Value::Empty`]).
    pub fn confirm(&self, draft: Option<&Value>) -> Result<Value, Rejection> {
        if matches!(self.input, InputKind::Confirm) {
            return Ok(Value::Confirmed);
        }

        match draft.filter(|value| !value.is_empty()) {
            Some(Value::List(entries)) => match self.min_items() {
                Some(min) if entries.len() < min => Err(Rejection::BelowMinimum { min }),
                _ => Ok(Value::List(entries.clone())),
            },
            Some(value) => Ok(value.clone()),
            None if self.required => Err(Rejection::RequiredMissing),
            None => Ok(self.default.clone().unwrap_or(Value::Empty)),
        }
    }

    fn select_one(&self, source: &OptionSource, values: &[String]) -> Result<Value, Rejection> {
        let Some(first) = values.first() else {
            return if self.required {
                Err(Rejection::Empty)
            } else {
                Ok(Value::Empty)
            };
        };
        check_offered(source, first)?;
        Ok(Value::Choice(first.clone()))
    }

    fn select_many(
        &self,
        source: &OptionSource,
        max: u8,
        values: &[String],
    ) -> Result<Value, Rejection> {
        if values.is_empty() {
            return if self.required {
                Err(Rejection::Empty)
            } else {
                Ok(Value::Empty)
            };
        }
        let mut unique: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            check_offered(source, value)?;
            if !unique.contains(value) {
                unique.push(value.clone());
            }
        }
        if unique.len() > usize::from(max) {
            return Err(Rejection::TooManySelections { max });
        }
        Ok(Value::Choices(unique))
    }

    fn submit(
        &self,
        fields: BTreeMap<String, String>,
        draft: Option<&Value>,
    ) -> Result<Value, Rejection> {
        let integer = self.rules.iter().find_map(|rule| match rule {
            Rule::Integer {
                field,
                min,
                max,
                on_invalid,
            } => Some((field, *min, *max, *on_invalid)),
            _ => None,
        });

        let Some((key, min, max, on_invalid)) = integer else {
            return Ok(Value::Fields(fields));
        };

        let raw = fields.get(key).map_or("", String::as_str);
        match raw.parse::<i64>() {
            Ok(n) if (min..=max).contains(&n) => Ok(Value::Number(n)),
            Ok(_) => Err(Rejection::OutOfRange { min, max }),
            Err(_) => {
                let previous = draft.cloned().or_else(|| self.default.clone());
                match (on_invalid, previous) {
                    (NumericFallback::KeepPrevious, Some(previous)) => Ok(previous),
                    _ => Err(Rejection::NotANumber { field: key.clone() }),
                }
            }
        }
    }

    fn add_entry(
        &self,
        picker: Option<&OptionSource>,
        value: Option<&str>,
        fields: &BTreeMap<String, String>,
        draft: Option<&Value>,
    ) -> Result<Value, Rejection> {
        let mut entries = current_entries(draft);

        let value = match (picker, value.map(str::trim).filter(|v| !v.is_empty())) {
            (Some(source), Some(value)) => {
                check_offered(source, value)?;
                Some(value.to_string())
            }
            (Some(_), None) => return Err(Rejection::Empty),
            (None, _) => None,
        };

        let emoji = match field(fields, "emoji") {
            Some(token) if !is_valid_emoji(token) => {
                return Err(Rejection::InvalidEmoji {
                    token: token.to_string(),
                });
            }
            other => other.map(str::to_string),
        };

        let entry = ListEntry {
            value,
            label: field(fields, "label").unwrap_or_default().to_string(),
            emoji,
            style: parse_style(field(fields, "style").unwrap_or_default())?,
            description: field(fields, "description").map(str::to_string),
        };

        for rule in &self.rules {
            if let Rule::Unique(key) = rule {
                if let Some(value) = duplicate_of(&entries, &entry, *key) {
                    return Err(Rejection::Duplicate {
                        key: key.name(),
                        value,
                    });
                }
            }
        }

        entries.push(entry);
        Ok(Value::List(entries))
    }
}

fn current_entries(draft: Option<&Value>) -> Vec<ListEntry> {
    match draft {
        Some(Value::List(entries)) => entries.clone(),
        _ => Vec::new(),
    }
}

fn check_offered(source: &OptionSource, value: &str) -> Result<(), Rejection> {
    match source {
        OptionSource::Static(options) if !options.iter().any(|o| o.value == value) => {
            Err(Rejection::UnknownOption {
                value: value.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Returns the clashing attribute when `entry` duplicates an existing entry on `key`.
fn duplicate_of(entries: &[ListEntry], entry: &ListEntry, key: EntryKey) -> Option<String> {
    let clash = |existing: &ListEntry| match key {
        EntryKey::Label => {
            !entry.label.is_empty() && existing.label.to_lowercase() == entry.label.to_lowercase()
        }
        EntryKey::Emoji => entry.emoji.is_some() && existing.emoji == entry.emoji,
        EntryKey::Value => entry.value.is_some() && existing.value == entry.value,
    };
    entries.iter().any(clash).then(|| match key {
        EntryKey::Label => entry.label.clone(),
        EntryKey::Emoji => entry.emoji.clone().unwrap_or_default(),
        EntryKey::Value => entry.value.clone().unwrap_or_default(),
    })
}
