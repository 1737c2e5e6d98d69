//! Values collected by wizard steps.
//!
//! A step produces exactly one [`Value`]. Accepted values are accumulated in a
//! [`Collected`] map keyed by the step key, which is what a finished wizard hands
//! to its configuration sink.

use std::collections::BTreeMap;
use std::fmt;

/// Button style accepted for list entries (ticket choices, reaction roles).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonStyleToken {
    /// Blurple
    Primary,
    /// Grey
    Secondary,
    /// Green
    Success,
    /// Red
    Danger,
}

impl ButtonStyleToken {
    /// Canonical lowercase name, as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Success => "success",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for ButtonStyleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item of a list-building step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    /// Value picked from the step's picker (e.g. a role id), if the step has one
    pub value: Option<String>,
    /// Human-readable label, possibly empty when the form makes it optional
    pub label: String,
    /// Emoji token, already validated against the emoji grammar
    pub emoji: Option<String>,
    /// Button style, already normalised from its synonym
    pub style: Option<ButtonStyleToken>,
    /// Free-form description
    pub description: Option<String>,
}

impl ListEntry {
    /// Short one-line summary used by prompts and completion summaries.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(emoji) = &self.emoji {
            parts.push(emoji.clone());
        }
        if !self.label.is_empty() {
            parts.push(self.label.clone());
        }
        if let Some(value) = &self.value {
            parts.push(format!("<@&{value}>"));
        }
        if parts.is_empty() {
            "(unnamed)".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// A value accepted by a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Optional step skipped with no default
    Empty,
    /// Single selection (an id or a static option value)
    Choice(String),
    /// Multiple selections, in selection order
    Choices(Vec<String>),
    /// Parsed integer
    Number(i64),
    /// Submitted form fields, keyed by field key
    Fields(BTreeMap<String, String>),
    /// Entries of a list-building step
    List(Vec<ListEntry>),
    /// Confirmation step passed
    Confirmed,
}

impl Value {
    /// Whether this value counts as "nothing collected" for a required step.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Choice(choice) => choice.is_empty(),
            Self::Choices(choices) => choices.is_empty(),
            Self::Fields(fields) => fields.values().all(|v| v.trim().is_empty()),
            Self::List(entries) => entries.is_empty(),
            Self::Number(_) | Self::Confirmed => false,
        }
    }
}

/// The collected map: step key to accepted value, in key order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collected(BTreeMap<String, Value>);

impl Collected {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the accepted value of a step.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Raw access to a step's value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of stored step values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no step has been completed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Single choice stored under `key`.
    #[must_use]
    pub fn choice(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::Choice(choice)) => Some(choice.as_str()),
            _ => None,
        }
    }

    /// Integer stored under `key`.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(Value::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// List entries stored under `key`, empty when absent.
    #[must_use]
    pub fn list(&self, key: &str) -> &[ListEntry] {
        match self.0.get(key) {
            Some(Value::List(entries)) => entries,
            _ => &[],
        }
    }

    /// Form fields stored under `key`.
    #[must_use]
    pub fn fields(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        match self.0.get(key) {
            Some(Value::Fields(fields)) => Some(fields),
            _ => None,
        }
    }

    /// One trimmed, non-empty form field of the step stored under `key`.
    #[must_use]
    pub fn text(&self, key: &str, field: &str) -> Option<&str> {
        self.fields(key)
            .and_then(|fields| fields.get(field))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_emptiness() {
        assert!(Value::Empty.is_empty());
        assert!(Value::Choices(Vec::new()).is_empty());
        assert!(Value::Fields(BTreeMap::from([("a".to_string(), "  ".to_string())])).is_empty());
        assert!(!Value::Number(0).is_empty());
        assert!(!Value::Choice("123".to_string()).is_empty());
    }

    #[test]
    fn test_collected_typed_getters() {
        let mut collected = Collected::new();
        collected.insert("role", Value::Choice("42".to_string()));
        collected.insert("max", Value::Number(3));
        collected.insert(
            "message",
            Value::Fields(BTreeMap::from([("title".to_string(), " Roles ".to_string())])),
        );

        assert_eq!(collected.choice("role"), Some("42"));
        assert_eq!(collected.number("max"), Some(3));
        assert_eq!(collected.number("role"), None);
        assert_eq!(collected.text("message", "title"), Some("Roles"));
        assert_eq!(collected.text("message", "description"), None);
        assert!(collected.list("missing").is_empty());
        assert_eq!(collected.len(), 3);
    }

    #[test]
    fn test_entry_summary() {
        let entry = ListEntry {
            value: Some("99".to_string()),
            label: "Member".to_string(),
            emoji: Some("✅".to_string()),
            style: None,
            description: None,
        };
        assert_eq!(entry.summary(), "✅ Member <@&99>");
    }
}
