// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::{MarkerSync, SyncSettings, SyncStatus, SAVE_ALERT_ID, SAVE_ERROR_ALERT_ID};
use crate::alerts::{AlertLevel, Alerts};
use crate::connectivity::Connectivity;
use crate::error::ServiceError;
use crate::gateway::wire::format_timestamp;
use crate::gateway::{ChangeEvent, ChangeHub, MemoryBackend, MARKERS_TABLE};
use crate::model::fixtures::{marker, TempDir};
use crate::model::{Bounds, LngLat, MarkerState};
use crate::store::{LocalStorage, PendingQueue};

struct SyncTestCtx {
    _tmp: TempDir,
    storage: LocalStorage,
    alerts: Alerts,
    connectivity: Connectivity,
    changes: ChangeHub,
    backend: Arc<MemoryBackend>,
}

impl SyncTestCtx {
    fn new(online: bool) -> Self {
        let tmp = TempDir::new("sync");
        let storage = LocalStorage::new(tmp.path().join("data"));
        let alerts = Alerts::new();
        let connectivity = Connectivity::new(alerts.clone(), online);
        let changes = ChangeHub::new();
        let backend = Arc::new(MemoryBackend::new(changes.clone()));
        Self {
            _tmp: tmp,
            storage,
            alerts,
            connectivity,
            changes,
            backend,
        }
    }

    fn queue(&self) -> PendingQueue {
        PendingQueue::new(self.storage.clone())
    }

    fn engine(&self) -> MarkerSync {
        let engine = MarkerSync::new(
            self.backend.clone(),
            self.queue(),
            self.alerts.clone(),
            self.connectivity.clone(),
            SyncSettings::default(),
        );
        engine.listen(&self.changes);
        engine
    }
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn offline_save_stays_pending_until_back_online() {
    let ctx = SyncTestCtx::new(false);
    let engine = ctx.engine();
    let well = marker("well", 8.5, 47.3);

    engine.save_draft(well.clone());
    settle().await;

    assert!(engine.is_unsynced(well.id));
    assert_eq!(engine.status(well.id), SyncStatus::PendingLocal);
    assert_eq!(ctx.queue().load(), vec![well.clone()]);
    assert_eq!(ctx.backend.marker_upserts(), 0);
    assert!(ctx.alerts.has(SAVE_ALERT_ID));

    ctx.connectivity.set_online(true);
    settle().await;

    assert!(!engine.is_unsynced(well.id));
    assert_eq!(engine.status(well.id), SyncStatus::Clean);
    assert_eq!(engine.get(well.id).map(|m| m.name), Some("well".to_owned()));
    assert!(ctx.queue().load().is_empty());
    assert_eq!(ctx.backend.marker_upserts(), 1);
    assert!(!ctx.alerts.has(SAVE_ALERT_ID));
}

#[tokio::test(start_paused = true)]
async fn confirmed_rows_carry_backend_timestamps() {
    let ctx = SyncTestCtx::new(true);
    let engine = ctx.engine();
    let well = marker("well", 8.5, 47.3);

    engine.save_draft(well.clone());
    settle().await;

    let stored = engine.get(well.id).unwrap();
    assert_ne!(stored.updated_at, well.updated_at);
    assert_eq!(Some(stored), ctx.backend.stored_marker(well.id));
}

#[tokio::test(start_paused = true)]
async fn failed_flush_retries_once_after_fixed_delay() {
    let ctx = SyncTestCtx::new(true);
    let engine = ctx.engine();
    ctx.backend.set_fail_writes(true);
    let well = marker("well", 8.5, 47.3);

    engine.save_draft(well.clone());
    settle().await;

    assert_eq!(ctx.backend.marker_upserts(), 1);
    assert!(engine.is_unsynced(well.id));
    assert_eq!(ctx.queue().load(), vec![well.clone()]);
    let alert = ctx.alerts.get(SAVE_ERROR_ALERT_ID).unwrap();
    assert_eq!(alert.level, AlertLevel::Error);
    assert!(!alert.can_close);
    assert!(alert.details.is_some());

    // More edits while the retry is scheduled do not start another flush.
    engine.save_draft(marker("gate", 8.6, 47.4));
    tokio::time::advance(Duration::from_secs(14)).await;
    settle().await;
    assert_eq!(ctx.backend.marker_upserts(), 1);

    ctx.backend.set_fail_writes(false);
    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;

    assert_eq!(ctx.backend.marker_upserts(), 2);
    assert_eq!(engine.pending_count(), 0);
    assert!(!ctx.alerts.has(SAVE_ERROR_ALERT_ID));
    assert!(!ctx.alerts.has(SAVE_ALERT_ID));
}

#[tokio::test(start_paused = true)]
async fn retry_keeps_failing_without_backoff() {
    let ctx = SyncTestCtx::new(true);
    let engine = ctx.engine();
    ctx.backend.set_fail_writes(true);
    engine.save_draft(marker("well", 8.5, 47.3));
    settle().await;

    for attempt in 2..=4 {
        tokio::time::advance(Duration::from_secs(15)).await;
        settle().await;
        assert_eq!(ctx.backend.marker_upserts(), attempt);
    }
    assert_eq!(engine.pending_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn edit_during_flight_stays_pending_and_is_sent_next() {
    let ctx = SyncTestCtx::new(true);
    let engine = ctx.engine();
    ctx.backend.set_write_delay(Duration::from_secs(5));
    let mut well = marker("well", 8.5, 47.3);

    engine.save_draft(well.clone());
    settle().await;
    assert_eq!(engine.status(well.id), SyncStatus::Syncing);

    well.name = "well v2".to_owned();
    engine.save_draft(well.clone());
    assert_eq!(engine.status(well.id), SyncStatus::PendingLocal);

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    assert!(engine.is_unsynced(well.id));
    assert_eq!(engine.draft(well.id).name, "well v2");
    assert_eq!(engine.get(well.id).map(|m| m.name), Some("well".to_owned()));
    assert_eq!(ctx.backend.marker_upserts(), 2);

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    assert!(!engine.is_unsynced(well.id));
    assert_eq!(ctx.backend.stored_marker(well.id).unwrap().name, "well v2");
}

#[tokio::test(start_paused = true)]
async fn entries_missing_from_the_response_wait_for_the_retry() {
    let ctx = SyncTestCtx::new(false);
    let engine = ctx.engine();
    let well = marker("well", 8.5, 47.3);
    let gate = marker("gate", 8.6, 47.4);
    ctx.backend.withhold_echo(gate.id);

    engine.save_draft(well.clone());
    engine.save_draft(gate.clone());
    ctx.connectivity.set_online(true);
    settle().await;

    assert_eq!(ctx.backend.marker_upserts(), 1);
    assert!(!engine.is_unsynced(well.id));
    assert!(engine.is_unsynced(gate.id));
    assert!(!ctx.alerts.has(SAVE_ERROR_ALERT_ID));

    tokio::time::advance(Duration::from_secs(15)).await;
    settle().await;
    assert_eq!(ctx.backend.marker_upserts(), 2);
}

#[tokio::test(start_paused = true)]
async fn restart_restores_queue_and_flushes() {
    let ctx = SyncTestCtx::new(true);
    let well = marker("well", 8.5, 47.3);
    ctx.queue().persist(&[well.clone()]);

    let engine = ctx.engine();
    assert!(engine.is_unsynced(well.id));
    settle().await;

    assert!(!engine.is_unsynced(well.id));
    assert!(ctx.queue().load().is_empty());
    assert!(ctx.backend.stored_marker(well.id).is_some());
}

#[tokio::test(start_paused = true)]
async fn draft_prefers_pending_then_cache_then_skeleton() {
    let ctx = SyncTestCtx::new(false);
    let cached = marker("cached", 1.0, 1.0);
    ctx.backend.seed_markers(&[cached.clone()]);
    let engine = ctx.engine();
    engine.load_all().await.unwrap();

    let mut copy = engine.draft(cached.id);
    copy.name = "edited".to_owned();
    assert_eq!(engine.get(cached.id).unwrap().name, "cached");

    engine.save_draft(copy.clone());
    assert_eq!(engine.draft(cached.id), copy);

    let unknown = uuid::Uuid::new_v4();
    let skeleton = engine.draft(unknown);
    assert_eq!(skeleton.id, unknown);
    assert!(skeleton.name.is_empty());
    assert_eq!(skeleton.state, MarkerState::New);
}

#[tokio::test(start_paused = true)]
async fn remove_evicts_cache_and_purges_pending() {
    let ctx = SyncTestCtx::new(false);
    let cached = marker("cached", 1.0, 1.0);
    ctx.backend.seed_markers(&[cached.clone()]);
    let engine = ctx.engine();
    engine.load_all().await.unwrap();

    let mut edited = cached.clone();
    edited.state = MarkerState::Done;
    engine.save_draft(edited);

    engine.remove(cached.id).await.unwrap();
    settle().await;

    assert!(engine.get(cached.id).is_none());
    assert!(!engine.is_unsynced(cached.id));
    assert!(ctx.queue().load().is_empty());
    assert!(!ctx.alerts.has(SAVE_ALERT_ID));
    assert_eq!(ctx.backend.marker_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_remove_keeps_marker_and_alerts() {
    let ctx = SyncTestCtx::new(true);
    let cached = marker("cached", 1.0, 1.0);
    ctx.backend.seed_markers(&[cached.clone()]);
    let engine = ctx.engine();
    engine.load_all().await.unwrap();
    ctx.backend.set_fail_writes(true);

    let err = engine.remove(cached.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::DeleteFailed(_)));
    assert!(engine.get(cached.id).is_some());
    assert!(ctx.alerts.all().iter().any(|alert| alert.level == AlertLevel::Error));
}

#[tokio::test(start_paused = true)]
async fn removing_the_last_failed_entry_clears_the_error_banner() {
    let ctx = SyncTestCtx::new(true);
    let engine = ctx.engine();
    ctx.backend.set_fail_writes(true);
    let well = marker("well", 8.5, 47.3);

    engine.save_draft(well.clone());
    settle().await;
    assert!(ctx.alerts.has(SAVE_ERROR_ALERT_ID));

    ctx.backend.set_fail_writes(false);
    engine.remove(well.id).await.unwrap();
    settle().await;

    assert_eq!(engine.pending_count(), 0);
    assert!(!ctx.alerts.has(SAVE_ALERT_ID));
    assert!(!ctx.alerts.has(SAVE_ERROR_ALERT_ID));

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(ctx.backend.marker_upserts(), 1);
    assert!(!ctx.alerts.has(SAVE_ERROR_ALERT_ID));
}

#[tokio::test(start_paused = true)]
async fn removing_one_of_several_failed_entries_keeps_the_error_banner() {
    let ctx = SyncTestCtx::new(true);
    let engine = ctx.engine();
    ctx.backend.set_fail_writes(true);
    let well = marker("well", 8.5, 47.3);
    let gate = marker("gate", 8.6, 47.4);

    engine.save_draft(well.clone());
    engine.save_draft(gate.clone());
    settle().await;

    ctx.backend.set_fail_writes(false);
    engine.remove(well.id).await.unwrap();
    assert!(ctx.alerts.has(SAVE_ERROR_ALERT_ID));

    tokio::time::advance(Duration::from_secs(15)).await;
    settle().await;
    assert!(!engine.is_unsynced(gate.id));
    assert!(!ctx.alerts.has(SAVE_ERROR_ALERT_ID));
}

#[tokio::test(start_paused = true)]
async fn listing_with_pending_shadows_the_cache() {
    let ctx = SyncTestCtx::new(false);
    let cached = marker("cached", 1.0, 1.0);
    ctx.backend.seed_markers(&[cached.clone()]);
    let engine = ctx.engine();
    engine.load_all().await.unwrap();

    let mut edited = cached.clone();
    edited.state = MarkerState::Done;
    let fresh = marker("fresh", 2.0, 2.0);
    engine.save_draft(edited);
    engine.save_draft(fresh.clone());

    let listed = engine.all_with_pending();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed.iter().find(|m| m.id == cached.id).unwrap().state, MarkerState::Done);
    assert!(listed.iter().any(|m| m.id == fresh.id));
    assert_eq!(engine.all().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_load_all_alerts_and_keeps_cache() {
    let ctx = SyncTestCtx::new(true);
    let cached = marker("cached", 1.0, 1.0);
    ctx.backend.seed_markers(&[cached.clone()]);
    let engine = ctx.engine();
    assert_eq!(engine.load_all().await.unwrap(), 1);

    ctx.backend.set_reachable(false);
    let err = engine.load_all().await.unwrap_err();
    assert!(matches!(err, ServiceError::FetchFailed(_)));
    assert_eq!(engine.all().len(), 1);
    assert!(ctx.alerts.all().iter().any(|alert| alert.title == "Failed to fetch markers"));
}

#[tokio::test(start_paused = true)]
async fn view_loads_are_debounced() {
    let ctx = SyncTestCtx::new(true);
    ctx.backend.seed_markers(&[marker("in", 8.5, 47.5), marker("out", 20.0, 10.0)]);
    let engine = ctx.engine();

    let far = Bounds::new(LngLat::new(19.0, 9.0), LngLat::new(21.0, 11.0));
    let near = Bounds::new(LngLat::new(8.0, 47.0), LngLat::new(9.0, 48.0));
    engine.load_view(far);
    settle().await;
    engine.load_view(near);
    settle().await;

    tokio::time::advance(Duration::from_millis(999)).await;
    settle().await;
    assert!(engine.all().is_empty());

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    let names = engine.all().into_iter().map(|m| m.name).collect::<Vec<_>>();
    assert_eq!(names, vec!["in".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn failed_view_load_does_not_alert() {
    let ctx = SyncTestCtx::new(true);
    let engine = ctx.engine();
    ctx.backend.set_reachable(false);

    let bounds = Bounds::new(LngLat::new(8.0, 47.0), LngLat::new(9.0, 48.0));
    assert!(engine.load_view_now(bounds).await.is_err());
    assert!(ctx.alerts.all().is_empty());
}

#[tokio::test(start_paused = true)]
async fn live_changes_update_the_cache() {
    let ctx = SyncTestCtx::new(true);
    let engine = ctx.engine();
    let remote = marker("remote", 3.0, 4.0);
    let row = json!({
        "id": remote.id,
        "name": remote.name,
        "description": remote.description,
        "state": "marked",
        "location": {"type": "Point", "coordinates": [3.0, 4.0]},
        "created_at": format_timestamp(remote.created_at),
        "updated_at": format_timestamp(remote.updated_at),
    });

    ctx.changes.publish(ChangeEvent::insert(MARKERS_TABLE, row.clone()));
    settle().await;
    assert_eq!(engine.get(remote.id).unwrap().state, MarkerState::Marked);

    ctx.changes.publish(ChangeEvent::insert(MARKERS_TABLE, json!({"id": "garbage"})));
    ctx.changes.publish(ChangeEvent::delete(MARKERS_TABLE, json!({"id": remote.id})));
    settle().await;
    assert!(engine.get(remote.id).is_none());
}

#[tokio::test(start_paused = true)]
async fn subscribers_are_notified_of_local_edits() {
    let ctx = SyncTestCtx::new(false);
    let engine = ctx.engine();
    let mut rx = engine.subscribe();
    rx.mark_unchanged();

    engine.save_draft(marker("well", 8.5, 47.3));
    assert!(rx.has_changed().unwrap());
}
