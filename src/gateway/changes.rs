// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row-level change, in the shape of a database webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: SmolStr,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(rename = "record", default)]
    pub new: Option<Value>,
    #[serde(rename = "old_record", default)]
    pub old: Option<Value>,
}

impl ChangeEvent {
    pub fn insert(table: &str, new: Value) -> Self {
        Self {
            table: SmolStr::new(table),
            kind: ChangeKind::Insert,
            new: Some(new),
            old: None,
        }
    }

    pub fn update(table: &str, new: Value, old: Option<Value>) -> Self {
        Self {
            table: SmolStr::new(table),
            kind: ChangeKind::Update,
            new: Some(new),
            old,
        }
    }

    pub fn delete(table: &str, old: Value) -> Self {
        Self {
            table: SmolStr::new(table),
            kind: ChangeKind::Delete,
            new: None,
            old: Some(old),
        }
    }
}

/// Fan-out of change events to per-table subscribers.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Returns the number of subscriptions the event reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        tracing::debug!(table = %event.table, kind = ?event.kind, "change event");
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, table: &str) -> TableSubscription {
        TableSubscription {
            table: SmolStr::new(table),
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Debug)]
pub struct TableSubscription {
    table: SmolStr,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl TableSubscription {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Next event for this table; `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.table == self.table => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(table = %self.table, skipped, "change subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
