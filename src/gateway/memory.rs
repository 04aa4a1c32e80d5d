// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-process backend used by `--demo` and by tests.
//!
//! Rows are kept in their wire shape and go through the same codec as the REST client, and
//! every write is published on the [`ChangeHub`] like a realtime feed would. Reachability,
//! write failures and write latency can be injected.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::wire::{
    encode_location, format_timestamp, parse_point, DrawingRow, DrawingUpsertRow, MarkerRow,
    MarkerUpsertRow,
};
use super::{
    ChangeEvent, ChangeHub, DrawingGateway, GatewayError, HealthCheck, MarkerGateway, TagGateway,
    DRAWINGS_TABLE, MARKERS_TABLE, TAGS_TABLE,
};
use crate::model::{Bounds, Drawing, LngLat, Marker};

#[derive(Debug, Default)]
struct MemoryState {
    markers: BTreeMap<Uuid, MarkerRow>,
    drawings: BTreeMap<Uuid, DrawingRow>,
    tags: BTreeSet<String>,
    withheld: BTreeSet<Uuid>,
}

#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    changes: ChangeHub,
    reachable: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: Mutex<Duration>,
    marker_upserts: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(changes: ChangeHub) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            changes,
            reachable: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            write_delay: Mutex::new(Duration::ZERO),
            marker_upserts: AtomicUsize::new(0),
        }
    }

    pub fn changes(&self) -> &ChangeHub {
        &self.changes
    }

    /// An unreachable backend fails every call, health checks included.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Writes fail with a server error while reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().expect("memory backend lock poisoned") = delay;
    }

    /// Marker upserts for `id` are stored but left out of the response.
    pub fn withhold_echo(&self, id: Uuid) {
        self.lock().withheld.insert(id);
    }

    /// Number of `upsert_markers` calls received, failed ones included.
    pub fn marker_upserts(&self) -> usize {
        self.marker_upserts.load(Ordering::SeqCst)
    }

    pub fn seed_markers(&self, markers: &[Marker]) {
        let mut state = self.lock();
        for marker in markers {
            state.markers.insert(marker.id, marker_row(marker));
        }
    }

    pub fn seed_drawings(&self, drawings: &[Drawing]) {
        let mut state = self.lock();
        for drawing in drawings {
            state.tags.extend(drawing.tags.iter().cloned());
            state.drawings.insert(drawing.id, drawing_row(drawing));
        }
    }

    pub fn seed_tags<I, S>(&self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().tags.extend(tags.into_iter().map(Into::into));
    }

    pub fn stored_marker(&self, id: Uuid) -> Option<Marker> {
        let row = self.lock().markers.get(&id).cloned()?;
        row.into_marker().ok()
    }

    pub fn marker_count(&self) -> usize {
        self.lock().markers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory backend lock poisoned")
    }

    fn check_reachable(&self) -> Result<(), GatewayError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GatewayError::Unavailable("backend unreachable".into()))
        }
    }

    async fn begin_write(&self) -> Result<(), GatewayError> {
        self.check_reachable()?;
        let delay = *self.write_delay.lock().expect("memory backend lock poisoned");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check_reachable()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Status {
                status: 503,
                body: "write rejected".into(),
            });
        }
        Ok(())
    }

    fn publish_all(&self, events: Vec<ChangeEvent>) {
        for event in events {
            self.changes.publish(event);
        }
    }
}

fn marker_row(marker: &Marker) -> MarkerRow {
    MarkerRow {
        id: marker.id,
        name: marker.name.clone(),
        description: marker.description.clone(),
        state: marker.state,
        location: encode_location(LngLat::new(marker.lng, marker.lat)),
        created_at: format_timestamp(marker.created_at),
        updated_at: format_timestamp(marker.updated_at),
    }
}

fn drawing_row(drawing: &Drawing) -> DrawingRow {
    DrawingRow {
        id: drawing.id,
        name: drawing.name.clone(),
        description: drawing.description.clone(),
        tags: Some(drawing.tags.iter().cloned().collect()),
        properties: Value::Object(drawing.properties.clone()),
        geom: drawing.geometry.clone(),
        created_at: format_timestamp(drawing.created_at),
        updated_at: format_timestamp(drawing.updated_at),
    }
}

fn to_value<T: serde::Serialize>(row: &T) -> Value {
    serde_json::to_value(row).unwrap_or(Value::Null)
}

#[async_trait]
impl MarkerGateway for MemoryBackend {
    async fn fetch_markers(&self, limit: usize) -> Result<Vec<Marker>, GatewayError> {
        self.check_reachable()?;
        let rows = self.lock().markers.values().take(limit).cloned().collect::<Vec<_>>();
        rows.into_iter().map(MarkerRow::into_marker).collect()
    }

    async fn fetch_markers_in_view(
        &self,
        bounds: Bounds,
        limit: usize,
    ) -> Result<Vec<Marker>, GatewayError> {
        self.check_reachable()?;
        let markers = self
            .lock()
            .markers
            .values()
            .cloned()
            .map(MarkerRow::into_marker)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(markers
            .into_iter()
            .filter(|marker| bounds.contains(LngLat::new(marker.lng, marker.lat)))
            .take(limit)
            .collect())
    }

    async fn upsert_markers(&self, markers: &[Marker]) -> Result<Vec<Marker>, GatewayError> {
        self.marker_upserts.fetch_add(1, Ordering::SeqCst);
        self.begin_write().await?;

        // The whole batch decodes before anything is stored, so a bad row commits nothing.
        let upserts = markers
            .iter()
            .map(MarkerUpsertRow::from)
            .map(|upsert| {
                let position = parse_point(&upsert.location).ok_or_else(|| {
                    GatewayError::Decode(format!("invalid point literal: {}", upsert.location))
                })?;
                Ok((upsert, position))
            })
            .collect::<Result<Vec<_>, GatewayError>>()?;
        let now = format_timestamp(Utc::now());
        let mut echoed = Vec::with_capacity(upserts.len());
        let mut events = Vec::with_capacity(upserts.len());
        {
            let mut state = self.lock();
            for (upsert, position) in upserts {
                let previous = state.markers.get(&upsert.id).cloned();
                let row = MarkerRow {
                    id: upsert.id,
                    name: upsert.name,
                    description: upsert.description,
                    state: upsert.state,
                    location: encode_location(position),
                    created_at: previous
                        .as_ref()
                        .map_or_else(|| now.clone(), |row| row.created_at.clone()),
                    updated_at: now.clone(),
                };
                state.markers.insert(row.id, row.clone());

                events.push(match previous {
                    Some(old) => {
                        ChangeEvent::update(MARKERS_TABLE, to_value(&row), Some(to_value(&old)))
                    }
                    None => ChangeEvent::insert(MARKERS_TABLE, to_value(&row)),
                });
                if !state.withheld.contains(&row.id) {
                    echoed.push(row);
                }
            }
        }
        self.publish_all(events);

        echoed.into_iter().map(MarkerRow::into_marker).collect()
    }

    async fn delete_marker(&self, id: Uuid) -> Result<(), GatewayError> {
        self.begin_write().await?;
        let removed = self.lock().markers.remove(&id);
        if let Some(old) = removed {
            self.changes.publish(ChangeEvent::delete(MARKERS_TABLE, to_value(&old)));
        }
        Ok(())
    }
}

#[async_trait]
impl DrawingGateway for MemoryBackend {
    async fn fetch_drawings(&self) -> Result<Vec<Drawing>, GatewayError> {
        self.check_reachable()?;
        let rows = self.lock().drawings.values().cloned().collect::<Vec<_>>();
        rows.into_iter().map(DrawingRow::into_drawing).collect()
    }

    async fn upsert_drawings(&self, drawings: &[Drawing]) -> Result<Vec<Drawing>, GatewayError> {
        self.begin_write().await?;

        let upserts = drawings.iter().map(DrawingUpsertRow::from).collect::<Vec<_>>();
        let now = format_timestamp(Utc::now());
        let mut echoed = Vec::with_capacity(upserts.len());
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            for upsert in upserts {
                for tag in &upsert.tags {
                    if state.tags.insert(tag.clone()) {
                        events.push(ChangeEvent::insert(
                            TAGS_TABLE,
                            serde_json::json!({ "tag": tag }),
                        ));
                    }
                }

                let previous = state.drawings.get(&upsert.id).cloned();
                let row = DrawingRow {
                    id: upsert.id,
                    name: upsert.name,
                    description: upsert.description,
                    tags: Some(upsert.tags),
                    properties: Value::Object(upsert.properties),
                    geom: upsert.geom,
                    created_at: previous
                        .as_ref()
                        .map_or_else(|| now.clone(), |row| row.created_at.clone()),
                    updated_at: now.clone(),
                };
                state.drawings.insert(row.id, row.clone());
                events.push(match previous {
                    Some(old) => {
                        ChangeEvent::update(DRAWINGS_TABLE, to_value(&row), Some(to_value(&old)))
                    }
                    None => ChangeEvent::insert(DRAWINGS_TABLE, to_value(&row)),
                });
                echoed.push(row);
            }
        }
        self.publish_all(events);

        echoed.into_iter().map(DrawingRow::into_drawing).collect()
    }

    async fn delete_drawings(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, GatewayError> {
        self.begin_write().await?;
        let removed = {
            let mut state = self.lock();
            ids.iter().filter_map(|id| state.drawings.remove(id)).collect::<Vec<_>>()
        };
        let deleted = removed.iter().map(|row| row.id).collect();
        self.publish_all(
            removed
                .iter()
                .map(|row| ChangeEvent::delete(DRAWINGS_TABLE, to_value(row)))
                .collect(),
        );
        Ok(deleted)
    }
}

#[async_trait]
impl TagGateway for MemoryBackend {
    async fn fetch_tags(&self) -> Result<Vec<String>, GatewayError> {
        self.check_reachable()?;
        Ok(self.lock().tags.iter().cloned().collect())
    }
}

#[async_trait]
impl HealthCheck for MemoryBackend {
    async fn ping(&self) -> Result<(), GatewayError> {
        self.check_reachable()
    }
}
