// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Local persistence.
//!
//! A small key/value store on disk (one JSON file per key, atomic writes) backs the pending
//! marker queue and persisted view settings.

pub mod local;
pub mod pending;

pub use local::{LocalStorage, StoreError, Stored, WriteDurability};
pub use pending::{PendingQueue, UNSYNCED_MARKERS_KEY};
