//! Step controller.
//!
//! Drives one step through `Rendering -> AwaitingInput -> {Validating -> AwaitingInput |
//! Advancing | Aborting}`. The controller owns the step's draft value; the collected map
//! is only read.

use super::collector::{Collector, CollectorEvent, Input, Platform};
use super::orchestrator::AbortReason;
use super::render::{Frame, render};
use super::step::StepDefinition;
use super::validate::Verdict;
use super::value::{Collected, Value};
use tracing::{debug, warn};

/// Phase of a running step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Building and showing the prompt
    Rendering,
    /// Collector armed, waiting for the invoker
    AwaitingInput,
    /// Checking a value-producing signal
    Validating,
    /// Step finished with a value
    Advancing,
    /// Wizard is being abandoned
    Aborting,
}

/// How a step ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Store this value and move to the next step
    Advance(Value),
    /// Stop the wizard
    Abort(AbortReason),
}

/// Runs a single step.
pub struct StepController<'s> {
    step: &'s StepDefinition,
    frame: Frame<'s>,
    invoker_id: u64,
    draft: Option<Value>,
    phase: Phase,
}

impl<'s> StepController<'s> {
    /// Creates a controller for `step`, positioned by `frame`.
    #[must_use]
    pub const fn new(step: &'s StepDefinition, frame: Frame<'s>, invoker_id: u64) -> Self {
        Self {
            step,
            frame,
            invoker_id,
            draft: None,
            phase: Phase::Rendering,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Current draft value.
    #[must_use]
    pub const fn draft(&self) -> Option<&Value> {
        self.draft.as_ref()
    }

    fn enter(&mut self, phase: Phase) {
        debug!(step = %self.step.key, from = ?self.phase, to = ?phase, "step phase");
        self.phase = phase;
    }

    /// Renders the step, then collects signals until the step advances or aborts.
    pub async fn run<P: Platform>(&mut self, platform: &mut P, collected: &Collected) -> StepOutcome {
        self.enter(Phase::Rendering);
        let prompt = render(self.frame, self.step, None, collected, None);
        if let Err(e) = platform.render(&prompt).await {
            warn!(step = %self.step.key, "Failed to render step: {e}");
            self.enter(Phase::Aborting);
            return StepOutcome::Abort(AbortReason::Render(e.to_string()));
        }

        let mut collector = Collector::arm(platform, self.invoker_id, self.step.idle_timeout);
        self.enter(Phase::AwaitingInput);

        loop {
            let input = match collector.next().await {
                CollectorEvent::Signal(input) => input,
                CollectorEvent::TimedOut => {
                    self.enter(Phase::Aborting);
                    return StepOutcome::Abort(AbortReason::Timeout);
                }
                CollectorEvent::Closed => {
                    self.enter(Phase::Aborting);
                    return StepOutcome::Abort(AbortReason::Closed);
                }
            };

            if input == Input::Continue {
                match self.step.confirm(self.draft.as_ref()) {
                    Ok(value) => {
                        self.enter(Phase::Advancing);
                        return StepOutcome::Advance(value);
                    }
                    Err(rejection) => {
                        debug!(step = %self.step.key, %rejection, "continue refused");
                        let notice = rejection.to_string();
                        self.rerender(&mut collector, collected, Some(&notice)).await;
                    }
                }
                continue;
            }

            self.enter(Phase::Validating);
            match self.step.validate(&input, self.draft.as_ref(), collected) {
                Verdict::Accepted(value) => {
                    self.draft = Some(value);
                    self.rerender(&mut collector, collected, None).await;
                }
                Verdict::Rejected(rejection) => {
                    debug!(step = %self.step.key, %rejection, "input rejected");
                    if let Err(e) = collector.platform().notify(&rejection.to_string()).await {
                        warn!(step = %self.step.key, "Failed to send rejection notice: {e}");
                    }
                }
                Verdict::Ignored => {
                    debug!(step = %self.step.key, ?input, "input ignored");
                }
            }
            self.enter(Phase::AwaitingInput);
        }
    }

    async fn rerender<P: Platform>(
        &self,
        collector: &mut Collector<'_, P>,
        collected: &Collected,
        notice: Option<&str>,
    ) {
        let prompt = render(self.frame, self.step, self.draft.as_ref(), collected, notice);
        if let Err(e) = collector.platform().render(&prompt).await {
            warn!(step = %self.step.key, "Failed to re-render step: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{INVOKER, ScriptedPlatform, add_entry, list_step, role_step, select};
    use crate::wizard::collector::Signal;

    const FRAME: Frame<'static> = Frame {
        wizard: "Test",
        position: 0,
        total: 1,
    };

    #[tokio::test(start_paused = true)]
    async fn test_continue_without_required_value_stays() {
        let (mut platform, script) = ScriptedPlatform::new();
        let step = role_step();
        script.send(Signal::new(INVOKER, Input::Continue));

        let mut controller = StepController::new(&step, FRAME, INVOKER);
        let outcome = controller.run(&mut platform, &Collected::new()).await;

        // Nothing else arrives, so the step eventually times out
        assert_eq!(outcome, StepOutcome::Abort(AbortReason::Timeout));
        assert_eq!(platform.renders.len(), 2);
        assert!(platform.renders[1].notice.is_some());
        assert!(controller.draft().is_none());
        drop(script);
    }

    #[tokio::test]
    async fn test_last_selection_wins() {
        let (mut platform, script) = ScriptedPlatform::new();
        let step = role_step();
        script.send(select("1"));
        script.send(select("2"));
        script.send(Signal::new(INVOKER, Input::Continue));

        let mut controller = StepController::new(&step, FRAME, INVOKER);
        let outcome = controller.run(&mut platform, &Collected::new()).await;

        assert_eq!(outcome, StepOutcome::Advance(Value::Choice("2".to_string())));
        assert_eq!(controller.phase(), Phase::Advancing);
        assert_eq!(platform.renders.len(), 3);
    }

    #[tokio::test]
    async fn test_rejection_notifies_without_touching_draft() {
        let (mut platform, script) = ScriptedPlatform::new();
        let step = list_step(5);
        script.send(add_entry("Billing"));
        script.send(add_entry("Billing"));
        script.send(Signal::new(INVOKER, Input::Continue));

        let mut controller = StepController::new(&step, FRAME, INVOKER);
        let outcome = controller.run(&mut platform, &Collected::new()).await;

        let StepOutcome::Advance(Value::List(entries)) = outcome else {
            panic!("step did not advance");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "Billing");
        assert_eq!(platform.notices.len(), 1);
        assert!(platform.notices[0].contains("already exists"));
    }

    #[tokio::test]
    async fn test_failed_first_render_aborts() {
        let (mut platform, script) = ScriptedPlatform::new();
        platform.fail_renders = true;
        let step = role_step();
        script.send(select("1"));

        let mut controller = StepController::new(&step, FRAME, INVOKER);
        let outcome = controller.run(&mut platform, &Collected::new()).await;

        assert!(matches!(outcome, StepOutcome::Abort(AbortReason::Render(_))));
        assert_eq!(platform.max_armed, 0);
    }
}
