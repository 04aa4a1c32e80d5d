// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use super::{Drawing, Geometry, Marker, MarkerState};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub(crate) struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub(crate) fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("fieldmark-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

pub(crate) fn marker(name: &str, lng: f64, lat: f64) -> Marker {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    Marker {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        description: format!("{name} description"),
        state: MarkerState::New,
        lng,
        lat,
        created_at: at,
        updated_at: at,
    }
}

pub(crate) fn drawing(name: &str, tags: &[&str]) -> Drawing {
    let mut drawing = Drawing::skeleton(Uuid::new_v4());
    drawing.name = name.to_owned();
    drawing.tags = tags.iter().map(|tag| (*tag).to_owned()).collect();
    drawing.geometry = Geometry::LineString {
        coordinates: vec![vec![8.0, 47.0], vec![8.1, 47.1]],
    };
    drawing
}
