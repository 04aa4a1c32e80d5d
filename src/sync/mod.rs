// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Offline-first marker synchronization.
//!
//! Edits land in the pending set first (persisted through [`PendingQueue`]) and are flushed to
//! the backend as one batch whenever the pending set is non-empty, no flush is running or
//! scheduled, and the device is online. Confirmed rows move into the authoritative cache;
//! failed batches stay pending and are retried after a fixed delay.
//!
//! Pending entries shadow cache entries with the same id until they are confirmed.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::alerts::{Alerts, NewAlert};
use crate::connectivity::Connectivity;
use crate::debounce::Debouncer;
use crate::error::ServiceError;
use crate::gateway::wire::MarkerRow;
use crate::gateway::{ChangeEvent, ChangeHub, ChangeKind, MarkerGateway, MARKERS_TABLE};
use crate::model::{Bounds, Marker};
use crate::store::PendingQueue;

pub const SAVE_ALERT_ID: &str = "marker-save";
pub const SAVE_ERROR_ALERT_ID: &str = "marker-save-error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Fixed delay before a failed (or partially confirmed) batch is sent again.
    pub retry_delay: Duration,
    pub fetch_limit: usize,
    pub view_limit: usize,
    pub view_debounce: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(15),
            fetch_limit: 2000,
            view_limit: 100,
            view_debounce: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Clean,
    PendingLocal,
    Syncing,
}

#[derive(Debug, Clone)]
struct PendingEntry {
    marker: Marker,
    /// Bumped on every `save_draft`, so a flush can tell whether it sent the latest edit.
    rev: u64,
}

#[derive(Debug, Default)]
enum FlushSlot {
    #[default]
    Idle,
    InFlight {
        revs: HashMap<Uuid, u64>,
    },
    RetryScheduled(JoinHandle<()>),
}

#[derive(Debug, Default)]
struct SyncState {
    markers: BTreeMap<Uuid, Marker>,
    pending: BTreeMap<Uuid, PendingEntry>,
    next_rev: u64,
    slot: FlushSlot,
}

impl SyncState {
    fn pending_markers(&self) -> Vec<Marker> {
        self.pending.values().map(|entry| entry.marker.clone()).collect()
    }

    fn is_sent(&self, id: &Uuid, revs: &HashMap<Uuid, u64>) -> bool {
        match (self.pending.get(id), revs.get(id)) {
            (Some(entry), Some(rev)) => entry.rev == *rev,
            _ => false,
        }
    }
}

struct SyncInner {
    gateway: Arc<dyn MarkerGateway>,
    queue: PendingQueue,
    alerts: Alerts,
    connectivity: Connectivity,
    settings: SyncSettings,
    state: Mutex<SyncState>,
    revision: watch::Sender<u64>,
    view_debouncer: Debouncer,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for SyncInner {
    fn drop(&mut self) {
        self.view_debouncer.cancel();
        if let Ok(tasks) = self.tasks.get_mut() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
        if let Ok(state) = self.state.get_mut() {
            if let FlushSlot::RetryScheduled(timer) = &state.slot {
                timer.abort();
            }
        }
    }
}

/// The marker sync engine. Cheap to clone; all clones share one state.
///
/// Must be created inside a Tokio runtime: flushes, retries and listeners run as tasks.
#[derive(Clone)]
pub struct MarkerSync {
    inner: Arc<SyncInner>,
}

impl std::fmt::Debug for MarkerSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerSync")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl MarkerSync {
    /// Restores the pending set from `queue` and starts flushing it if possible.
    pub fn new(
        gateway: Arc<dyn MarkerGateway>,
        queue: PendingQueue,
        alerts: Alerts,
        connectivity: Connectivity,
        settings: SyncSettings,
    ) -> Self {
        let mut state = SyncState::default();
        for marker in queue.load() {
            state.next_rev += 1;
            let rev = state.next_rev;
            state.pending.insert(marker.id, PendingEntry { marker, rev });
        }
        let restored = state.pending.len();

        let (revision, _) = watch::channel(0);
        let engine = Self {
            inner: Arc::new(SyncInner {
                gateway,
                queue,
                alerts,
                view_debouncer: Debouncer::new(settings.view_debounce),
                connectivity,
                settings,
                state: Mutex::new(state),
                revision,
                tasks: Mutex::new(Vec::new()),
            }),
        };

        if restored > 0 {
            tracing::info!(count = restored, "restored unsynced markers");
        }
        engine.refresh_save_alert(restored > 0);
        engine.watch_connectivity();
        engine.maybe_flush();
        engine
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.inner.settings
    }

    /// Applies live row changes for the `markers` table to the cache.
    pub fn listen(&self, changes: &ChangeHub) {
        let mut feed = changes.subscribe(MARKERS_TABLE);
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            while let Some(event) = feed.recv().await {
                let Some(engine) = Self::upgrade(&weak) else {
                    break;
                };
                engine.apply_change(event);
            }
        });
        self.register_task(task);
    }

    /// Records a local edit. Last write wins per id; the queue is persisted right away.
    pub fn save_draft(&self, marker: Marker) {
        let id = marker.id;
        {
            let mut state = self.lock();
            state.next_rev += 1;
            let rev = state.next_rev;
            state.pending.insert(id, PendingEntry { marker, rev });
            self.inner.queue.persist(&state.pending_markers());
        }
        tracing::debug!(%id, "marker queued");
        self.refresh_save_alert(true);
        self.bump();
        self.maybe_flush();
    }

    /// Deletes on the backend right away; on success the marker leaves both the cache and the
    /// pending set.
    pub async fn remove(&self, id: Uuid) -> Result<(), ServiceError> {
        if let Err(err) = self.inner.gateway.delete_marker(id).await {
            tracing::error!(%err, %id, "failed to delete marker");
            self.inner.alerts.error(NewAlert::titled("Failed to delete marker"), &err);
            return Err(ServiceError::DeleteFailed(err));
        }

        let (purged, has_pending) = {
            let mut state = self.lock();
            state.markers.remove(&id);
            if let FlushSlot::InFlight { revs } = &mut state.slot {
                revs.remove(&id);
            }
            let purged = state.pending.remove(&id).is_some();
            if purged {
                self.inner.queue.persist(&state.pending_markers());
            }
            (purged, !state.pending.is_empty())
        };
        tracing::info!(%id, purged, "marker deleted");
        if purged {
            self.refresh_save_alert(has_pending);
            if !has_pending {
                self.inner.alerts.delete(SAVE_ERROR_ALERT_ID);
            }
        }
        self.bump();
        Ok(())
    }

    /// Editing copy: the pending entry as-is, else a copy of the cached marker, else an empty
    /// marker carrying `id`.
    pub fn draft(&self, id: Uuid) -> Marker {
        let state = self.lock();
        if let Some(entry) = state.pending.get(&id) {
            return entry.marker.clone();
        }
        state.markers.get(&id).cloned().unwrap_or_else(|| Marker::skeleton(id))
    }

    pub async fn load_all(&self) -> Result<usize, ServiceError> {
        let limit = self.inner.settings.fetch_limit;
        match self.inner.gateway.fetch_markers(limit).await {
            Ok(markers) => {
                let count = markers.len();
                self.merge_into_cache(markers);
                tracing::info!(count, "markers loaded");
                Ok(count)
            }
            Err(err) => {
                tracing::error!(%err, "failed to fetch markers");
                self.inner.alerts.error(NewAlert::titled("Failed to fetch markers"), &err);
                Err(ServiceError::FetchFailed(err))
            }
        }
    }

    /// Debounced [`MarkerSync::load_view_now`]; only the last call within the window runs.
    pub fn load_view(&self, bounds: Bounds) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.view_debouncer.call(async move {
            if let Some(engine) = Self::upgrade(&weak) {
                let _ = engine.load_view_now(bounds).await;
            }
        });
    }

    /// Loads the markers inside `bounds`. Failures are logged only.
    pub async fn load_view_now(&self, bounds: Bounds) -> Result<usize, ServiceError> {
        let limit = self.inner.settings.view_limit;
        match self.inner.gateway.fetch_markers_in_view(bounds, limit).await {
            Ok(markers) => {
                let count = markers.len();
                self.merge_into_cache(markers);
                tracing::debug!(count, "markers in view loaded");
                Ok(count)
            }
            Err(err) => {
                tracing::error!(%err, "failed to fetch markers in view");
                Err(ServiceError::FetchFailed(err))
            }
        }
    }

    /// Last confirmed state of a marker; pending edits are not included.
    pub fn get(&self, id: Uuid) -> Option<Marker> {
        self.lock().markers.get(&id).cloned()
    }

    pub fn all(&self) -> Vec<Marker> {
        self.lock().markers.values().cloned().collect()
    }

    /// Cache plus pending set, with pending entries shadowing cached markers of the same id.
    /// Markers created offline appear here before they are confirmed.
    pub fn all_with_pending(&self) -> Vec<Marker> {
        let state = self.lock();
        let mut merged = state.markers.clone();
        for (id, entry) in &state.pending {
            merged.insert(*id, entry.marker.clone());
        }
        merged.into_values().collect()
    }

    pub fn all_unsynced(&self) -> Vec<Marker> {
        self.lock().pending_markers()
    }

    pub fn is_unsynced(&self, id: Uuid) -> bool {
        self.lock().pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn status(&self, id: Uuid) -> SyncStatus {
        let state = self.lock();
        if !state.pending.contains_key(&id) {
            return SyncStatus::Clean;
        }
        match &state.slot {
            FlushSlot::InFlight { revs } if state.is_sent(&id, revs) => SyncStatus::Syncing,
            _ => SyncStatus::PendingLocal,
        }
    }

    /// Revision counter bumped whenever the cache or the pending set changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.inner.state.lock().expect("marker sync lock poisoned")
    }

    fn upgrade(weak: &Weak<SyncInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn register_task(&self, task: JoinHandle<()>) {
        self.inner.tasks.lock().expect("marker sync tasks lock poisoned").push(task);
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    fn merge_into_cache(&self, markers: Vec<Marker>) {
        {
            let mut state = self.lock();
            for marker in markers {
                state.markers.insert(marker.id, marker);
            }
        }
        self.bump();
    }

    fn watch_connectivity(&self) {
        let mut online = self.inner.connectivity.subscribe();
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            while online.changed().await.is_ok() {
                let is_online = *online.borrow_and_update();
                let Some(engine) = Self::upgrade(&weak) else {
                    break;
                };
                if is_online {
                    engine.maybe_flush();
                }
            }
        });
        self.register_task(task);
    }

    fn refresh_save_alert(&self, has_pending: bool) {
        if has_pending {
            self.inner.alerts.info(
                NewAlert::titled("Saving")
                    .with_id(SAVE_ALERT_ID)
                    .with_msg("Your entries will be saved in a moment.")
                    .persistent(),
            );
        } else {
            self.inner.alerts.delete(SAVE_ALERT_ID);
        }
    }

    /// Starts a flush if pending is non-empty, the slot is idle and the device is online.
    fn maybe_flush(&self) {
        if !self.inner.connectivity.is_online() {
            return;
        }
        let batch = {
            let mut state = self.lock();
            if state.pending.is_empty() || !matches!(state.slot, FlushSlot::Idle) {
                return;
            }
            let revs = state.pending.iter().map(|(id, entry)| (*id, entry.rev)).collect();
            state.slot = FlushSlot::InFlight { revs };
            state.pending_markers()
        };
        self.bump();

        let engine = self.clone();
        tokio::spawn(async move { engine.flush(batch).await });
    }

    async fn flush(&self, batch: Vec<Marker>) {
        let count = batch.len();
        tracing::debug!(count, "flushing pending markers");

        match self.inner.gateway.upsert_markers(&batch).await {
            Ok(rows) => self.complete_flush(rows),
            Err(err) => {
                tracing::warn!(%err, count, "marker flush failed; retry scheduled");
                self.inner.alerts.error(
                    NewAlert::titled("Saving failed")
                        .with_id(SAVE_ERROR_ALERT_ID)
                        .with_msg("Something went wrong while saving. We will try again shortly.")
                        .persistent(),
                    &err,
                );
                {
                    let mut state = self.lock();
                    state.slot = FlushSlot::RetryScheduled(self.spawn_retry());
                }
                self.bump();
            }
        }
    }

    fn complete_flush(&self, rows: Vec<Marker>) {
        let (confirmed, unconfirmed, has_pending) = {
            let mut state = self.lock();
            let revs = match std::mem::take(&mut state.slot) {
                FlushSlot::InFlight { revs } => revs,
                other => {
                    state.slot = other;
                    HashMap::new()
                }
            };

            let mut confirmed = 0;
            for row in rows {
                if !revs.contains_key(&row.id) {
                    continue;
                }
                if state.is_sent(&row.id, &revs) {
                    state.pending.remove(&row.id);
                    confirmed += 1;
                }
                state.markers.insert(row.id, row);
            }

            let unconfirmed = revs.keys().filter(|id| state.is_sent(id, &revs)).count();
            if unconfirmed > 0 {
                state.slot = FlushSlot::RetryScheduled(self.spawn_retry());
            }
            self.inner.queue.persist(&state.pending_markers());
            (confirmed, unconfirmed, !state.pending.is_empty())
        };

        tracing::info!(confirmed, unconfirmed, "marker flush finished");
        self.inner.alerts.delete(SAVE_ERROR_ALERT_ID);
        self.refresh_save_alert(has_pending);
        self.bump();
        self.maybe_flush();
    }

    fn spawn_retry(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.settings.retry_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(engine) = Self::upgrade(&weak) {
                engine.retry_elapsed();
            }
        })
    }

    fn retry_elapsed(&self) {
        let nothing_pending = {
            let mut state = self.lock();
            if matches!(state.slot, FlushSlot::RetryScheduled(_)) {
                state.slot = FlushSlot::Idle;
            }
            state.pending.is_empty()
        };
        tracing::debug!("marker retry timer elapsed");
        if nothing_pending {
            // Nothing left to retry, so no flush will clear the failure banner.
            self.inner.alerts.delete(SAVE_ERROR_ALERT_ID);
        }
        self.maybe_flush();
    }

    fn apply_change(&self, event: ChangeEvent) {
        match event.kind {
            ChangeKind::Insert | ChangeKind::Update => {
                let Some(record) = event.new else {
                    return;
                };
                let marker = serde_json::from_value::<MarkerRow>(record)
                    .map_err(|err| err.to_string())
                    .and_then(|row| row.into_marker().map_err(|err| err.to_string()));
                match marker {
                    Ok(marker) => self.merge_into_cache(vec![marker]),
                    Err(err) => tracing::warn!(%err, "ignoring undecodable marker change"),
                }
            }
            ChangeKind::Delete => {
                let id = event
                    .old
                    .as_ref()
                    .and_then(|old| old.get("id"))
                    .and_then(|id| id.as_str())
                    .and_then(|id| Uuid::parse_str(id).ok());
                let Some(id) = id else {
                    tracing::warn!("ignoring marker delete without id");
                    return;
                };
                let removed = self.lock().markers.remove(&id).is_some();
                if removed {
                    self.bump();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
