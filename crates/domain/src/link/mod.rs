//! Link: a reactive binding from a signal source to an action.
//!
//! Each value-changed notification of the source is evaluated against the
//! link's interrupt trigger and its invoke trigger. The two evaluations are
//! independent; a single value may satisfy both, one, or neither.

mod trigger;

pub use trigger::{Predicate, Trigger};

use serde::Serialize;

use crate::id::{ActionId, LinkId, SignalId};
use crate::value::{Args, Value};

/// How a link reacts to new values.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    invoke_when: Trigger,
    interrupt_when: Option<Trigger>,
    pass_value: bool,
    action_parameters: Args,
    interrupt_parameters: Args,
}

impl Default for LinkConfig {
    /// Truthy values invoke, falsy values interrupt.
    fn default() -> Self {
        LinkConfig::builder().build()
    }
}

impl LinkConfig {
    #[must_use]
    pub fn builder() -> LinkConfigBuilder {
        LinkConfigBuilder::default()
    }

    #[must_use]
    pub fn invoke_when(&self) -> &Trigger {
        &self.invoke_when
    }

    #[must_use]
    pub fn interrupt_when(&self) -> Option<&Trigger> {
        self.interrupt_when.as_ref()
    }

    #[must_use]
    pub fn pass_value(&self) -> bool {
        self.pass_value
    }

    /// Decide what a new `value` does to the target action.
    #[must_use]
    pub fn evaluate(&self, value: &Value) -> LinkDecision {
        let interrupt = self
            .interrupt_when
            .as_ref()
            .filter(|trigger| trigger.matches(value))
            .map(|_| self.interrupt_parameters.clone());

        let invoke = self.invoke_when.matches(value).then(|| {
            if self.pass_value {
                self.action_parameters.clone().prepend(value.clone())
            } else {
                self.action_parameters.clone()
            }
        });

        LinkDecision { invoke, interrupt }
    }
}

/// Outcome of evaluating one value against a [`LinkConfig`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkDecision {
    /// Arguments to invoke the target with, if the invoke trigger matched.
    pub invoke: Option<Args>,
    /// Arguments to interrupt the target with, if the interrupt trigger matched.
    pub interrupt: Option<Args>,
}

/// Step-by-step builder for [`LinkConfig`].
///
/// When neither trigger is set the link uses the boolean default: truthy
/// values invoke, falsy values interrupt. Setting only one of them leaves the
/// other at "truthy invokes" / "never interrupts".
#[derive(Debug, Default)]
pub struct LinkConfigBuilder {
    trigger_value: Option<Trigger>,
    trigger_interrupt_value: Option<Trigger>,
    pass_value: bool,
    action_parameters: Args,
    interrupt_parameters: Args,
}

impl LinkConfigBuilder {
    #[must_use]
    pub fn trigger_value(mut self, trigger: Trigger) -> Self {
        self.trigger_value = Some(trigger);
        self
    }

    #[must_use]
    pub fn trigger_interrupt_value(mut self, trigger: Trigger) -> Self {
        self.trigger_interrupt_value = Some(trigger);
        self
    }

    /// Pass the new value as the leading positional argument.
    #[must_use]
    pub fn pass_value(mut self, pass: bool) -> Self {
        self.pass_value = pass;
        self
    }

    #[must_use]
    pub fn action_parameters(mut self, args: Args) -> Self {
        self.action_parameters = args;
        self
    }

    #[must_use]
    pub fn interrupt_parameters(mut self, args: Args) -> Self {
        self.interrupt_parameters = args;
        self
    }

    #[must_use]
    pub fn build(self) -> LinkConfig {
        let (invoke_when, interrupt_when) =
            match (self.trigger_value, self.trigger_interrupt_value) {
                (None, None) => (Trigger::Truthy, Some(Trigger::Falsy)),
                (invoke, interrupt) => (invoke.unwrap_or(Trigger::Truthy), interrupt),
            };
        LinkConfig {
            invoke_when,
            interrupt_when,
            pass_value: self.pass_value,
            action_parameters: self.action_parameters,
            interrupt_parameters: self.interrupt_parameters,
        }
    }
}

/// A registered link.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub source: SignalId,
    pub target: ActionId,
    pub config: LinkConfig,
}

/// Serialisable summary of a [`Link`].
#[derive(Debug, Clone, Serialize)]
pub struct LinkInfo {
    pub id: LinkId,
    pub source: SignalId,
    pub target: ActionId,
    pub invoke_when: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_when: Option<String>,
    pub pass_value: bool,
}

impl From<&Link> for LinkInfo {
    fn from(link: &Link) -> Self {
        Self {
            id: link.id,
            source: link.source.clone(),
            target: link.target.clone(),
            invoke_when: link.config.invoke_when.to_string(),
            interrupt_when: link.config.interrupt_when.as_ref().map(ToString::to_string),
            pass_value: link.config.pass_value,
        }
    }
}
