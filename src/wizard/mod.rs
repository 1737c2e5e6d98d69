//! Multi-step setup wizard engine.
//!
//! A wizard is a fixed sequence of steps, each collecting one named value from the
//! invoking user through interactive controls. The engine is platform-neutral: the
//! hosting chat platform is reached only through [`Platform`], and the finished
//! configuration leaves through a [`ConfigSink`].

/// Interaction signals and the per-step input collector
pub mod collector;
/// Generic per-step state machine
pub mod controller;
/// Step sequencing and final persistence
pub mod orchestrator;
/// Platform-neutral prompt rendering
pub mod render;
/// Static step definitions
pub mod step;
/// Step validators
pub mod validate;
/// Collected values
pub mod value;

pub use collector::{Collector, CollectorEvent, Input, Platform, Signal};
pub use controller::{Phase, StepController, StepOutcome};
pub use orchestrator::{AbortReason, Completion, ConfigSink, Wizard, WizardSession, WizardState};
pub use render::{Control, Frame, Prompt, render};
pub use step::{ChannelKind, ChoiceOption, Form, FormField, InputKind, OptionSource, StepDefinition};
pub use validate::{EntryKey, NumericFallback, Rejection, Rule, Verdict};
pub use value::{ButtonStyleToken, Collected, ListEntry, Value};
