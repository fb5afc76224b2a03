//! Dashboard catalog: the actions exposed as controls.
//!
//! The catalog only records *which* actions a dashboard shows and how they
//! are labelled and grouped; rendering is the dashboard's business.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use relayhub_domain::action::ActionInfo;
use relayhub_domain::id::ActionId;

use crate::registry::Registry;

/// How an action appears on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOptions {
    /// Control label. Defaults to the action's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Group (card, tab) the control belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl DashboardOptions {
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// One control as served to dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct Control {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub action: ActionInfo,
}

/// Catalog of dashboard controls.
pub struct Dashboard {
    registry: Arc<Registry>,
    entries: RwLock<Vec<(ActionId, DashboardOptions)>>,
}

impl Dashboard {
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            entries: RwLock::default(),
        }
    }

    /// Show `action` on the dashboard. Adding an action twice replaces its
    /// options.
    pub fn add(&self, action: ActionId, options: DashboardOptions) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|(id, _)| *id == action) {
            Some(entry) => entry.1 = options,
            None => entries.push((action, options)),
        }
    }

    /// Controls in the order they were added, with current action metadata.
    #[must_use]
    pub fn controls(&self) -> Vec<Control> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|(id, options)| {
                let action = self.registry.get(id)?.info();
                Some(Control {
                    label: options.label.clone().unwrap_or_else(|| action.name.clone()),
                    group: options.group.clone(),
                    action,
                })
            })
            .collect()
    }
}
