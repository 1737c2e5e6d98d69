//! Input collection.
//!
//! [`Platform`] is the seam to the hosting chat platform: it renders prompts and
//! produces interaction signals. A [`Collector`] is the bounded-lifetime listener
//! armed on top of it for one step. It only lets through signals from the invoking
//! user and gives up once the idle window passes without one.

use super::render::Prompt;
use crate::errors::Result;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::trace;

/// Raw user input carried by a signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Continue / confirm button
    Continue,
    /// Selection from a choice control (ids or option values)
    Select(Vec<String>),
    /// Submitted form, keyed by field key
    Submit(BTreeMap<String, String>),
    /// New list entry: the picked value (if the step has a picker) and its form fields
    AddEntry {
        /// Picked value
        value: Option<String>,
        /// Submitted entry form
        fields: BTreeMap<String, String>,
    },
    /// Remove the list entry at this index
    RemoveEntry(usize),
}

/// One interaction from some user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
    /// Platform id of the interacting user
    pub user_id: u64,
    /// What they did
    pub input: Input,
}

impl Signal {
    /// Creates a signal.
    #[must_use]
    pub const fn new(user_id: u64, input: Input) -> Self {
        Self { user_id, input }
    }
}

/// The hosting chat platform, as seen by the wizard.
///
/// Implementations must keep rendering in one place: the first `render` creates the
/// wizard message, later ones edit it in place.
pub trait Platform: Send {
    /// Shows `prompt`, replacing whatever the wizard showed before.
    fn render(&mut self, prompt: &Prompt) -> impl Future<Output = Result<()>> + Send;

    /// Shows `text` to the invoking user only, without touching the wizard message.
    fn notify(&mut self, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Waits for the next interaction on the wizard message. `None` means the
    /// platform will never deliver another one.
    fn next_signal(&mut self) -> impl Future<Output = Option<Signal>> + Send;

    /// Called for signals from users other than the invoker.
    fn reject_foreign(&mut self, signal: &Signal) -> impl Future<Output = ()> + Send {
        let _ = signal;
        async {}
    }

    /// A collector started listening.
    fn collector_armed(&mut self) {}

    /// A collector stopped listening.
    fn collector_stopped(&mut self) {}
}

/// What a collector produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectorEvent {
    /// Input from the invoker
    Signal(Input),
    /// The idle window passed without input from the invoker
    TimedOut,
    /// The platform stopped delivering signals
    Closed,
}

/// Listener for one step, filtered to one user and bounded by an idle window.
///
/// The collector holds the platform mutably for its whole lifetime, so a session can
/// never have two collectors armed at once. Dropping it stops it.
pub struct Collector<'a, P: Platform> {
    platform: &'a mut P,
    invoker_id: u64,
    idle: Duration,
    deadline: Instant,
}

impl<'a, P: Platform> Collector<'a, P> {
    /// Arms a collector; the idle window starts now.
    pub fn arm(platform: &'a mut P, invoker_id: u64, idle: Duration) -> Self {
        platform.collector_armed();
        trace!(invoker_id, ?idle, "collector armed");
        Self {
            platform,
            invoker_id,
            idle,
            deadline: Instant::now() + idle,
        }
    }

    /// Waits for the next signal from the invoker.
    ///
    /// Signals from other users are handed to [`Platform::reject_foreign`] and do not
    /// extend the idle window. Each accepted signal restarts it.
    pub async fn next(&mut self) -> CollectorEvent {
        loop {
            match timeout_at(self.deadline, self.platform.next_signal()).await {
                Err(_) => return CollectorEvent::TimedOut,
                Ok(None) => return CollectorEvent::Closed,
                Ok(Some(signal)) if signal.user_id != self.invoker_id => {
                    trace!(user_id = signal.user_id, "ignoring signal from another user");
                    self.platform.reject_foreign(&signal).await;
                }
                Ok(Some(signal)) => {
                    self.deadline = Instant::now() + self.idle;
                    return CollectorEvent::Signal(signal.input);
                }
            }
        }
    }

    /// The platform behind this collector, for re-rendering while it stays armed.
    pub fn platform(&mut self) -> &mut P {
        self.platform
    }
}

impl<P: Platform> Drop for Collector<'_, P> {
    fn drop(&mut self) {
        self.platform.collector_stopped();
        trace!(invoker_id = self.invoker_id, "collector stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{INVOKER, ScriptedPlatform};

    #[tokio::test(start_paused = true)]
    async fn test_foreign_signals_are_filtered() {
        let (mut platform, script) = ScriptedPlatform::new();
        script.send(Signal::new(7, Input::Continue));
        script.send(Signal::new(INVOKER, Input::Select(vec!["1".into()])));

        let mut collector = Collector::arm(&mut platform, INVOKER, Duration::from_secs(60));
        assert_eq!(
            collector.next().await,
            CollectorEvent::Signal(Input::Select(vec!["1".into()]))
        );
        drop(collector);
        assert_eq!(platform.foreign, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_fires() {
        let (mut platform, script) = ScriptedPlatform::new();
        let mut collector = Collector::arm(&mut platform, INVOKER, Duration::from_secs(60));
        assert_eq!(collector.next().await, CollectorEvent::TimedOut);
        drop(collector);
        drop(script);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_signals_do_not_extend_idle_window() {
        let (mut platform, script) = ScriptedPlatform::new();
        let started = Instant::now();
        let mut collector = Collector::arm(&mut platform, INVOKER, Duration::from_secs(60));

        let sender = script.clone();
        tokio::spawn(async move {
            for _ in 0..5 {
                tokio::time::sleep(Duration::from_secs(20)).await;
                sender.send(Signal::new(7, Input::Continue));
            }
        });

        assert_eq!(collector.next().await, CollectorEvent::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(61));
    }

    #[tokio::test]
    async fn test_closed_platform() {
        let (mut platform, script) = ScriptedPlatform::new();
        drop(script);
        let mut collector = Collector::arm(&mut platform, INVOKER, Duration::from_secs(60));
        assert_eq!(collector.next().await, CollectorEvent::Closed);
    }

    #[tokio::test]
    async fn test_arm_and_drop_are_tracked() {
        let (mut platform, _script) = ScriptedPlatform::new();
        {
            let _collector = Collector::arm(&mut platform, INVOKER, Duration::from_secs(1));
        }
        assert_eq!(platform.armed, 0);
        assert_eq!(platform.max_armed, 1);
    }
}
