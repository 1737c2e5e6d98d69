//! Wizard orchestrator.
//!
//! Runs step controllers in a fixed order, threads the collected map forward and
//! hands the finished map to a [`ConfigSink`] exactly once.

use super::collector::Platform;
use super::controller::{StepController, StepOutcome};
use super::render::{Frame, Prompt};
use super::step::StepDefinition;
use super::value::Collected;
use crate::errors::Result;
use std::future::Future;
use thiserror::Error;
use tracing::{error, info, warn};

/// Why a wizard stopped without completing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AbortReason {
    #[error("no input received in time")]
    Timeout,

    #[error("the interaction was closed")]
    Closed,

    #[error("the wizard message could not be shown: {0}")]
    Render(String),

    #[error("the configuration could not be saved: {0}")]
    Sink(String),

    #[error("this wizard has already finished")]
    Finished,
}

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardState {
    /// Steps still running
    Active,
    /// Configuration persisted
    Completed,
    /// Stopped by a render or sink failure, or a closed platform
    Aborted,
    /// Stopped by an idle timeout
    TimedOut,
}

/// In-memory state of one wizard invocation. Never persisted.
#[derive(Debug)]
pub struct WizardSession {
    /// The only user allowed to advance the wizard
    pub invoker_id: u64,
    /// Owner of the resulting configuration (a guild id)
    pub owner_id: String,
    /// Step definitions, fixed for the session
    pub steps: Vec<StepDefinition>,
    /// Index of the active step; only moves forward
    pub cursor: usize,
    /// Values of finished steps
    pub collected: Collected,
    /// Lifecycle state
    pub state: WizardState,
}

/// Destination of a finished wizard.
pub trait ConfigSink: Sync {
    /// What the sink stores.
    type Record: Send;

    /// Appends one configuration entry for `owner_id`. Not idempotent.
    fn append(
        &self,
        owner_id: &str,
        collected: &Collected,
    ) -> impl Future<Output = Result<Self::Record>> + Send;

    /// Summary shown to the user once the record is stored.
    fn summarize(&self, record: &Self::Record) -> String;
}

/// A completed wizard.
#[derive(Debug)]
pub struct Completion<R> {
    /// All collected values
    pub collected: Collected,
    /// What the sink stored
    pub record: R,
}

/// A multi-step guided setup.
#[derive(Debug)]
pub struct Wizard {
    name: String,
    session: WizardSession,
}

impl Wizard {
    /// Creates a wizard for one invocation.
    pub fn new(
        name: impl Into<String>,
        invoker_id: u64,
        owner_id: impl Into<String>,
        steps: Vec<StepDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            session: WizardSession {
                invoker_id,
                owner_id: owner_id.into(),
                steps,
                cursor: 0,
                collected: Collected::new(),
                state: WizardState::Active,
            },
        }
    }

    /// Session state, for inspection.
    #[must_use]
    pub const fn session(&self) -> &WizardSession {
        &self.session
    }

    /// Runs every step, then persists the collected map through `sink`.
    ///
    /// On abort the wizard message is replaced by a terminal notice without controls.
    /// A finished wizard cannot be run again.
    pub async fn run<P, S>(
        &mut self,
        platform: &mut P,
        sink: &S,
    ) -> std::result::Result<Completion<S::Record>, AbortReason>
    where
        P: Platform,
        S: ConfigSink,
    {
        if self.session.state != WizardState::Active {
            return Err(AbortReason::Finished);
        }

        let total = self.session.steps.len();
        while self.session.cursor < total {
            let step = &self.session.steps[self.session.cursor];
            let frame = Frame {
                wizard: &self.name,
                position: self.session.cursor,
                total,
            };
            let mut controller = StepController::new(step, frame, self.session.invoker_id);
            let outcome = controller.run(platform, &self.session.collected).await;
            match outcome {
                StepOutcome::Advance(value) => {
                    let key = step.key.clone();
                    self.session.collected.insert(key, value);
                    self.session.cursor += 1;
                }
                StepOutcome::Abort(reason) => {
                    return Err(self.abort(platform, reason).await);
                }
            }
        }

        match sink
            .append(&self.session.owner_id, &self.session.collected)
            .await
        {
            Ok(record) => {
                self.session.state = WizardState::Completed;
                info!(wizard = %self.name, owner_id = %self.session.owner_id, "wizard completed");
                let summary = sink.summarize(&record);
                if let Err(e) = platform
                    .render(&Prompt::terminal(format!("{} complete", self.name), summary))
                    .await
                {
                    warn!(wizard = %self.name, "Failed to render completion summary: {e}");
                }
                Ok(Completion {
                    collected: self.session.collected.clone(),
                    record,
                })
            }
            Err(e) => {
                error!(
                    wizard = %self.name,
                    owner_id = %self.session.owner_id,
                    "Failed to store configuration: {e}"
                );
                Err(self.abort(platform, AbortReason::Sink(e.to_string())).await)
            }
        }
    }

    async fn abort<P: Platform>(&mut self, platform: &mut P, reason: AbortReason) -> AbortReason {
        self.session.state = if reason == AbortReason::Timeout {
            WizardState::TimedOut
        } else {
            WizardState::Aborted
        };
        info!(wizard = %self.name, cursor = self.session.cursor, %reason, "wizard stopped");

        let (title, text) = match &reason {
            AbortReason::Timeout => (
                format!("{} timed out", self.name),
                "No input was received in time. Run the command again to start over.".to_string(),
            ),
            AbortReason::Sink(message) => (
                format!("{} failed", self.name),
                format!("❌ The configuration could not be saved: {message}"),
            ),
            _ => (format!("{} stopped", self.name), format!("The setup stopped: {reason}.")),
        };

        // Nothing more can be shown if the platform is already unreachable
        if !matches!(reason, AbortReason::Render(_)) {
            if let Err(e) = platform.render(&Prompt::terminal(title, text)).await {
                warn!(wizard = %self.name, "Failed to render abort notice: {e}");
            }
        }
        reason
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{
        INVOKER, MemorySink, ScriptedPlatform, add_entry, init_test_tracing, list_step, number_step,
        role_step, select,
    };
    use crate::wizard::collector::{Input, Signal};
    use crate::wizard::validate::NumericFallback;
    use crate::wizard::value::Value;

    fn continue_signal() -> Signal {
        Signal::new(INVOKER, Input::Continue)
    }

    fn scenario_steps() -> Vec<StepDefinition> {
        vec![
            role_step(),
            number_step(NumericFallback::KeepPrevious),
            list_step(5),
        ]
    }

    #[tokio::test]
    async fn test_full_run_with_default_and_list_limit() {
        init_test_tracing();
        let (mut platform, script) = ScriptedPlatform::new();
        script.send(select("R"));
        script.send(continue_signal());
        script.send(continue_signal());
        for label in ["A", "B", "C", "D", "E", "F"] {
            script.send(add_entry(label));
        }
        script.send(continue_signal());

        let sink = MemorySink::default();
        let mut wizard = Wizard::new("Setup", INVOKER, "guild", scenario_steps());
        let completion = wizard.run(&mut platform, &sink).await.unwrap();

        assert_eq!(wizard.session().state, WizardState::Completed);
        assert_eq!(completion.collected.choice("role"), Some("R"));
        assert_eq!(completion.collected.number("max_tickets"), Some(2));
        let labels: Vec<_> = completion
            .collected
            .list("choices")
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(labels, ["A", "B", "C", "D", "E"]);

        assert_eq!(platform.notices.len(), 1);
        assert!(platform.notices[0].contains("Limit reached"));
        assert_eq!(sink.appended().len(), 1);
        assert!(!platform.renders.last().unwrap().is_interactive());
        assert!(platform.max_armed <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_without_selection_keeps_cursor() {
        let (mut platform, script) = ScriptedPlatform::new();
        script.send(continue_signal());

        let sink = MemorySink::default();
        let mut wizard = Wizard::new("Setup", INVOKER, "guild", scenario_steps());
        let result = wizard.run(&mut platform, &sink).await;

        assert_eq!(result.unwrap_err(), AbortReason::Timeout);
        assert_eq!(wizard.session().cursor, 0);
        assert!(platform.renders[1].notice.is_some());
        drop(script);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_terminal() {
        let (mut platform, script) = ScriptedPlatform::new();
        let sink = MemorySink::default();
        let mut wizard = Wizard::new("Setup", INVOKER, "guild", scenario_steps());

        assert_eq!(
            wizard.run(&mut platform, &sink).await.unwrap_err(),
            AbortReason::Timeout
        );
        assert_eq!(wizard.session().state, WizardState::TimedOut);
        let last = platform.renders.last().unwrap();
        assert!(!last.is_interactive());
        assert!(last.title.contains("timed out"));

        // Later signals are never consumed
        script.send(select("R"));
        let renders = platform.renders.len();
        assert_eq!(
            wizard.run(&mut platform, &sink).await.unwrap_err(),
            AbortReason::Finished
        );
        assert_eq!(wizard.session().state, WizardState::TimedOut);
        assert_eq!(platform.renders.len(), renders);
        assert_eq!(platform.pending(), 1);
        assert!(sink.appended().is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_is_terminal() {
        let (mut platform, script) = ScriptedPlatform::new();
        script.send(select("R"));
        script.send(continue_signal());

        let sink = MemorySink::failing();
        let mut wizard = Wizard::new("Setup", INVOKER, "guild", vec![role_step()]);
        let result = wizard.run(&mut platform, &sink).await;

        assert!(matches!(result, Err(AbortReason::Sink(_))));
        assert_eq!(wizard.session().state, WizardState::Aborted);
        let last = platform.renders.last().unwrap();
        assert!(last.title.contains("failed"));
        assert!(!last.is_interactive());
        assert_eq!(sink.attempts(), 1);
    }

    #[tokio::test]
    async fn test_one_render_per_transition() {
        let (mut platform, script) = ScriptedPlatform::new();
        script.send(select("R"));
        script.send(continue_signal());
        script.send(continue_signal());
        script.send(add_entry("A"));
        script.send(continue_signal());

        let sink = MemorySink::default();
        let mut wizard = Wizard::new("Setup", INVOKER, "guild", scenario_steps());
        wizard.run(&mut platform, &sink).await.unwrap();

        // 3 step entries + 2 accepted inputs + 1 summary
        assert_eq!(platform.renders.len(), 6);
        assert_eq!(platform.collectors_armed, 3);
        assert_eq!(platform.max_armed, 1);
        assert_eq!(
            wizard.session().collected.get("max_tickets"),
            Some(&Value::Number(2))
        );
    }
}
