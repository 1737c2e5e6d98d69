//! Shared test utilities for `PanelBuddy`.
//!
//! This module provides an in-memory test database, a scripted [`Platform`] that
//! replays queued signals, an in-memory [`ConfigSink`] and a few small step
//! definitions used across the wizard tests.

#![allow(clippy::unwrap_used)]

use crate::{
    errors::{Error, Result},
    wizard::{
        Collected, ConfigSink, EntryKey, Form, FormField, Input, InputKind, NumericFallback,
        OptionSource, Platform, Prompt, Rule, Signal, StepDefinition, Value,
    },
};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// User id that starts every scripted wizard.
pub const INVOKER: u64 = 1001;

/// Sending half of a [`ScriptedPlatform`].
#[derive(Clone)]
pub struct Script(mpsc::UnboundedSender<Signal>);

impl Script {
    /// Queues a signal; ignored once the platform is gone.
    pub fn send(&self, signal: Signal) {
        let _ = self.0.send(signal);
    }
}

/// A platform that records everything the wizard shows and replays queued signals.
///
/// Dropping every [`Script`] closes the platform.
pub struct ScriptedPlatform {
    rx: mpsc::UnboundedReceiver<Signal>,
    /// Every prompt rendered, in order
    pub renders: Vec<Prompt>,
    /// Every ephemeral notice
    pub notices: Vec<String>,
    /// Signals turned away because they came from another user
    pub foreign: usize,
    /// Collectors currently armed
    pub armed: usize,
    /// Most collectors ever armed at once
    pub max_armed: usize,
    /// Collectors armed in total
    pub collectors_armed: usize,
    /// Make every render fail
    pub fail_renders: bool,
}

impl ScriptedPlatform {
    /// Creates a platform and the script feeding it.
    pub fn new() -> (Self, Script) {
        let (tx, rx) = mpsc::unbounded_channel();
        let platform = Self {
            rx,
            renders: Vec::new(),
            notices: Vec::new(),
            foreign: 0,
            armed: 0,
            max_armed: 0,
            collectors_armed: 0,
            fail_renders: false,
        };
        (platform, Script(tx))
    }

    /// Signals queued but never consumed.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Platform for ScriptedPlatform {
    async fn render(&mut self, prompt: &Prompt) -> Result<()> {
        if self.fail_renders {
            return Err(Error::Io(std::io::Error::other("message deleted")));
        }
        self.renders.push(prompt.clone());
        Ok(())
    }

    async fn notify(&mut self, text: &str) -> Result<()> {
        self.notices.push(text.to_string());
        Ok(())
    }

    async fn next_signal(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }

    async fn reject_foreign(&mut self, _signal: &Signal) {
        self.foreign += 1;
    }

    fn collector_armed(&mut self) {
        self.armed += 1;
        self.collectors_armed += 1;
        self.max_armed = self.max_armed.max(self.armed);
    }

    fn collector_stopped(&mut self) {
        self.armed -= 1;
    }
}

/// Sink that keeps appended configurations in memory.
#[derive(Default)]
pub struct MemorySink {
    fail: bool,
    appended: Mutex<Vec<Collected>>,
    attempts: AtomicUsize,
}

impl MemorySink {
    /// A sink whose every append fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Configurations stored so far.
    pub fn appended(&self) -> Vec<Collected> {
        self.appended.lock().unwrap().clone()
    }

    /// Number of append calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ConfigSink for MemorySink {
    type Record = usize;

    async fn append(&self, _owner_id: &str, collected: &Collected) -> Result<usize> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Config {
                message: "storage unavailable".to_string(),
            });
        }
        let mut appended = self.appended.lock().unwrap();
        appended.push(collected.clone());
        Ok(appended.len())
    }

    fn summarize(&self, record: &usize) -> String {
        format!("Stored entry #{record}")
    }
}

/// Required single role choice under `role`.
pub fn role_step() -> StepDefinition {
    StepDefinition::new("role", InputKind::Choice(OptionSource::Roles))
        .titled("Role", "Pick a role.")
        .required()
}

/// Optional integer step under `max_tickets` accepting 1-10, default 2.
pub fn number_step(on_invalid: NumericFallback) -> StepDefinition {
    StepDefinition::new(
        "max_tickets",
        InputKind::StructuredText(Form::new(
            "Max tickets",
            vec![FormField::new("value", "Max tickets")],
        )),
    )
    .titled("Max tickets", "Open tickets per user.")
    .default_value(Value::Number(2))
    .rule(Rule::Integer {
        field: "value".to_string(),
        min: 1,
        max: 10,
        on_invalid,
    })
}

/// Required list under `choices` with unique labels and at most `max` entries.
pub fn list_step(max: usize) -> StepDefinition {
    StepDefinition::new(
        "choices",
        InputKind::ListBuilder {
            picker: None,
            entry_form: Form::new(
                "Choice",
                vec![
                    FormField::new("label", "Label"),
                    FormField::new("emoji", "Emoji").optional(),
                    FormField::new("style", "Style").optional(),
                ],
            ),
        },
    )
    .titled("Choices", "Add some choices.")
    .required()
    .rule(Rule::MaxItems(max))
    .rule(Rule::Unique(EntryKey::Label))
}

/// The invoker selecting `value`.
pub fn select(value: &str) -> Signal {
    Signal::new(INVOKER, Input::Select(vec![value.to_string()]))
}

/// The invoker adding a list entry labelled `label`.
pub fn add_entry(label: &str) -> Signal {
    Signal::new(
        INVOKER,
        Input::AddEntry {
            value: None,
            fields: BTreeMap::from([("label".to_string(), label.to_string())]),
        },
    )
}
