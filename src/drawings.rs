// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Online-only drawing cache.
//!
//! Writes go straight to the backend; the cache only changes from rows the backend echoes back.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use uuid::Uuid;

use crate::alerts::{Alerts, NewAlert};
use crate::error::ServiceError;
use crate::gateway::DrawingGateway;
use crate::model::Drawing;

struct DrawingInner {
    gateway: Arc<dyn DrawingGateway>,
    alerts: Alerts,
    drawings: Mutex<BTreeMap<Uuid, Drawing>>,
    revision: watch::Sender<u64>,
}

#[derive(Clone)]
pub struct DrawingStore {
    inner: Arc<DrawingInner>,
}

impl std::fmt::Debug for DrawingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingStore")
            .field("len", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl DrawingStore {
    pub fn new(gateway: Arc<dyn DrawingGateway>, alerts: Alerts) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(DrawingInner {
                gateway,
                alerts,
                drawings: Mutex::new(BTreeMap::new()),
                revision,
            }),
        }
    }

    /// Replaces the cache with the backend's drawings.
    pub async fn load_all(&self) -> Result<usize, ServiceError> {
        let drawings = match self.inner.gateway.fetch_drawings().await {
            Ok(drawings) => drawings,
            Err(err) => {
                tracing::error!(%err, "failed to fetch drawings");
                self.inner.alerts.error(NewAlert::titled("Failed to fetch drawings"), &err);
                return Err(ServiceError::FetchFailed(err));
            }
        };

        let count = drawings.len();
        *self.lock() = drawings.into_iter().map(|drawing| (drawing.id, drawing)).collect();
        self.bump();
        tracing::info!(count, "drawings loaded");
        Ok(count)
    }

    pub async fn upsert(&self, drawings: &[Drawing]) -> Result<(), ServiceError> {
        let saved = match self.inner.gateway.upsert_drawings(drawings).await {
            Ok(saved) => saved,
            Err(err) => {
                tracing::error!(%err, count = drawings.len(), "failed to save drawings");
                self.inner.alerts.error(NewAlert::titled("Failed to save drawings"), &err);
                return Err(ServiceError::SaveFailed(err));
            }
        };

        {
            let mut cache = self.lock();
            for drawing in saved {
                cache.insert(drawing.id, drawing);
            }
        }
        self.bump();
        Ok(())
    }

    /// Only ids the backend reports as deleted leave the cache.
    pub async fn remove(&self, ids: &[Uuid]) -> Result<(), ServiceError> {
        let deleted = match self.inner.gateway.delete_drawings(ids).await {
            Ok(deleted) => deleted,
            Err(err) => {
                tracing::error!(%err, count = ids.len(), "failed to delete drawings");
                self.inner.alerts.error(NewAlert::titled("Failed to delete drawings"), &err);
                return Err(ServiceError::DeleteFailed(err));
            }
        };

        {
            let mut cache = self.lock();
            for id in &deleted {
                cache.remove(id);
            }
        }
        self.bump();
        Ok(())
    }

    /// Detached copy of a cached drawing, or an empty drawing at `[0, 0]`.
    pub fn draft(&self, id: Uuid) -> Drawing {
        self.get(id).unwrap_or_else(|| Drawing::skeleton(id))
    }

    pub fn get(&self, id: Uuid) -> Option<Drawing> {
        self.lock().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<Drawing> {
        self.lock().values().cloned().collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<Uuid, Drawing>> {
        self.inner.drawings.lock().expect("drawing store lock poisoned")
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}
