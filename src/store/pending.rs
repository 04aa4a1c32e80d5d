// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::Value;

use super::local::{LocalStorage, StoreError};
use crate::model::Marker;

/// Storage key holding the JSON array of markers that are not yet confirmed by the backend.
pub const UNSYNCED_MARKERS_KEY: &str = "unsyncedMarkers";

/// Durable copy of the pending marker writes.
///
/// Durability is best-effort: a crash mid-write leaves either the old or the new array on disk
/// (atomic rename), and re-queuing converges to the same state either way.
#[derive(Debug, Clone)]
pub struct PendingQueue {
    storage: LocalStorage,
}

impl PendingQueue {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Restores the unsynced markers. Never fails: unreadable, malformed or non-list data is
    /// treated as an empty queue, and single undecodable entries are skipped.
    pub fn load(&self) -> Vec<Marker> {
        let raw = match self.storage.get_item(UNSYNCED_MARKERS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(%err, "cannot read pending marker queue; starting empty");
                return Vec::new();
            }
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                tracing::warn!("pending marker queue is not a list; starting empty");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(%err, "pending marker queue is malformed; starting empty");
                return Vec::new();
            }
        };

        let mut markers = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Marker>(entry) {
                Ok(marker) => markers.push(marker),
                Err(err) => tracing::warn!(%err, "skipping undecodable pending marker"),
            }
        }
        tracing::debug!(count = markers.len(), "restored pending markers");
        markers
    }

    pub fn try_persist(&self, markers: &[Marker]) -> Result<(), StoreError> {
        self.storage.set_json(UNSYNCED_MARKERS_KEY, markers)
    }

    /// Writes the full pending set. Failures are logged; the in-memory queue stays authoritative.
    pub fn persist(&self, markers: &[Marker]) {
        if let Err(err) = self.try_persist(markers) {
            tracing::warn!(%err, count = markers.len(), "failed to persist pending markers");
        }
    }
}
