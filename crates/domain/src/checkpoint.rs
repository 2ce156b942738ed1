//! Checkpoints (what a watcher last observed for one external service)
//! and the change detection that compares fresh remote items against them.
//!
//! Detection is a pure function of the *previous* checkpoint and the set of
//! fetched items: it never mutates the previous value and returns the next
//! checkpoint alongside the detected changes. The first observation of a
//! service only seeds state (baseline suppression).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// One item fetched from a remote service (an invoice, an email, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Remote identifier, unique within the service.
    pub id: String,
    /// Remote status, compared verbatim.
    pub status: String,
    /// When the remote side created or last touched the item.
    pub timestamp: Timestamp,
    /// Everything else the client returned, forwarded into trigger data.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// How one fetched item relates to the previous checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemClass {
    /// Never seen, and a baseline already exists.
    New,
    /// Seen before with another status.
    Changed { previous: String },
    /// Same status as recorded, or seen during the baseline pass.
    Unchanged,
}

/// A fetched item that must produce a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedChange {
    pub item: RemoteItem,
    pub class: ItemClass,
}

/// Checkpoint mapping remote item id to its last observed status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheckpoint {
    /// Set after every completed scan; `None` means no baseline yet.
    #[serde(default)]
    pub last_checked: Option<Timestamp>,
    /// Never shrinks while the service exists.
    #[serde(default)]
    pub statuses: BTreeMap<String, String>,
}

impl StatusCheckpoint {
    /// Whether a previous scan has completed.
    #[must_use]
    pub fn has_baseline(&self) -> bool {
        self.last_checked.is_some()
    }

    /// Classify a single item against this checkpoint.
    #[must_use]
    pub fn classify(&self, item: &RemoteItem) -> ItemClass {
        match self.statuses.get(&item.id) {
            Some(previous) if *previous == item.status => ItemClass::Unchanged,
            Some(previous) => ItemClass::Changed {
                previous: previous.clone(),
            },
            None if self.has_baseline() => ItemClass::New,
            None => ItemClass::Unchanged,
        }
    }

    /// Compare `items` against this checkpoint.
    ///
    /// Returns the next checkpoint (every item's current status recorded,
    /// `last_checked` set to `checked_at`) and the changes that must fire.
    #[must_use]
    pub fn observe(
        &self,
        items: &[RemoteItem],
        checked_at: Timestamp,
    ) -> (Self, Vec<DetectedChange>) {
        let mut next = self.clone();
        let mut changes = Vec::new();

        for item in items {
            let class = self.classify(item);
            if class != ItemClass::Unchanged {
                changes.push(DetectedChange {
                    item: item.clone(),
                    class,
                });
            }
            next.statuses.insert(item.id.clone(), item.status.clone());
        }

        next.last_checked = Some(checked_at);
        (next, changes)
    }
}

/// Checkpoint holding only the time of the last completed scan.
///
/// Each scan fires for items dated inside `[last_checked, checked_at)`, so
/// consecutive windows neither overlap nor leave gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampCheckpoint {
    #[serde(default)]
    pub last_checked: Option<Timestamp>,
}

impl TimestampCheckpoint {
    #[must_use]
    pub fn has_baseline(&self) -> bool {
        self.last_checked.is_some()
    }

    /// Select the items that fall inside this scan's window.
    #[must_use]
    pub fn observe(
        &self,
        items: &[RemoteItem],
        checked_at: Timestamp,
    ) -> (Self, Vec<DetectedChange>) {
        let changes = match self.last_checked {
            None => Vec::new(),
            Some(since) => items
                .iter()
                .filter(|item| item.timestamp >= since && item.timestamp < checked_at)
                .map(|item| DetectedChange {
                    item: item.clone(),
                    class: ItemClass::New,
                })
                .collect(),
        };

        (
            Self {
                last_checked: Some(checked_at),
            },
            changes,
        )
    }
}
