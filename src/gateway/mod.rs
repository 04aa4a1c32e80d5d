// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Typed access to the backend store.
//!
//! Services depend on the narrow traits below rather than on a concrete client, so the daemon
//! can run against the PostgREST API ([`RestGateway`]) or fully in memory ([`MemoryBackend`]).

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{Bounds, Drawing, Marker};

pub mod changes;
pub mod memory;
pub mod rest;
pub mod wire;

pub use changes::{ChangeEvent, ChangeHub, ChangeKind, TableSubscription};
pub use memory::MemoryBackend;
pub use rest::{RestConfig, RestGateway};

pub const MARKERS_TABLE: &str = "markers";
pub const DRAWINGS_TABLE: &str = "drawings";
pub const TAGS_TABLE: &str = "tags";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("cannot decode backend data: {0}")]
    Decode(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MarkerGateway: Send + Sync {
    async fn fetch_markers(&self, limit: usize) -> Result<Vec<Marker>, GatewayError>;

    async fn fetch_markers_in_view(
        &self,
        bounds: Bounds,
        limit: usize,
    ) -> Result<Vec<Marker>, GatewayError>;

    /// One batched write; the returned rows are the backend's stored representation.
    async fn upsert_markers(&self, markers: &[Marker]) -> Result<Vec<Marker>, GatewayError>;

    async fn delete_marker(&self, id: Uuid) -> Result<(), GatewayError>;
}

#[async_trait]
pub trait DrawingGateway: Send + Sync {
    async fn fetch_drawings(&self) -> Result<Vec<Drawing>, GatewayError>;

    async fn upsert_drawings(&self, drawings: &[Drawing]) -> Result<Vec<Drawing>, GatewayError>;

    /// Returns the ids that were actually deleted.
    async fn delete_drawings(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, GatewayError>;
}

#[async_trait]
pub trait TagGateway: Send + Sync {
    /// Distinct tags, ordered.
    async fn fetch_tags(&self) -> Result<Vec<String>, GatewayError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), GatewayError>;
}

/// One backend seen through each of the narrow gateway traits.
#[derive(Clone)]
pub struct Gateways {
    pub markers: Arc<dyn MarkerGateway>,
    pub drawings: Arc<dyn DrawingGateway>,
    pub tags: Arc<dyn TagGateway>,
    pub health: Arc<dyn HealthCheck>,
}

impl Gateways {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: MarkerGateway + DrawingGateway + TagGateway + HealthCheck + 'static,
    {
        Self {
            markers: backend.clone(),
            drawings: backend.clone(),
            tags: backend.clone(),
            health: backend,
        }
    }
}

impl std::fmt::Debug for Gateways {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateways").finish_non_exhaustive()
    }
}
