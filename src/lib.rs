// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Fieldmark: offline-first sync core for map markers and drawings.
//!
//! Markers are edited locally, queued on disk and flushed to a PostgREST backend in batches
//! whenever the backend is reachable. Drawings and tags are online-only caches kept current by
//! backend change events.

pub mod alerts;
pub mod app;
pub mod config;
pub mod connectivity;
pub mod debounce;
pub mod drawings;
pub mod error;
pub mod export;
pub mod gateway;
pub mod model;
pub mod query;
pub mod server;
pub mod store;
pub mod sync;
pub mod tags;
