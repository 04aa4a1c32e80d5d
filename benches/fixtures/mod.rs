// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};
use criterion::Criterion;
use fieldmark::model::{Drawing, Geometry, Marker, MarkerState};
use uuid::Uuid;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!("fieldmark_bench_{prefix}_{pid}_{nanos}_{counter}"));
        std::fs::create_dir_all(&path).expect("create temp dir");

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse::<usize>().ok()).unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse::<u64>().ok()).unwrap_or(default)
}

pub fn criterion() -> Criterion {
    let sample_size = env_usize("BENCH_SAMPLE_SIZE", 60).clamp(10, 200);
    let warmup_secs = env_u64("BENCH_WARMUP_SECS", 3).clamp(1, 60);
    let measurement_secs = env_u64("BENCH_MEASUREMENT_SECS", 5).clamp(1, 120);

    Criterion::default()
        .sample_size(sample_size)
        .warm_up_time(Duration::from_secs(warmup_secs))
        .measurement_time(Duration::from_secs(measurement_secs))
}

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub const ALL: [Case; 3] = [Case::Small, Case::Medium, Case::Large];

    pub fn id(self) -> &'static str {
        match self {
            Case::Small => "small",
            Case::Medium => "medium",
            Case::Large => "large",
        }
    }

    pub fn len(self) -> usize {
        match self {
            Case::Small => 100,
            Case::Medium => 2_000,
            Case::Large => 10_000,
        }
    }
}

const TAGS: [&str; 6] = ["inspection", "north", "south", "green", "fence", "water"];

pub fn markers(case: Case) -> Vec<Marker> {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    (0..case.len())
        .map(|i| Marker {
            id: Uuid::from_u128(i as u128 + 1),
            name: format!("marker {i}"),
            description: format!("bench marker number {i} with a short note"),
            state: MarkerState::ALL[i % MarkerState::ALL.len()],
            lng: 13.0 + (i % 100) as f64 * 0.01,
            lat: 52.0 + (i / 100) as f64 * 0.01,
            created_at: at,
            updated_at: at,
        })
        .collect()
}

pub fn drawings(case: Case) -> Vec<Drawing> {
    (0..case.len())
        .map(|i| {
            let mut drawing = Drawing::skeleton(Uuid::from_u128(i as u128 + 1));
            drawing.name = format!("drawing {i}");
            drawing.tags = (0..(i % 3) + 1)
                .map(|k| TAGS[(i + k) % TAGS.len()].to_owned())
                .collect();
            let lng = 13.0 + (i % 100) as f64 * 0.01;
            let lat = 52.0 + (i / 100) as f64 * 0.01;
            drawing.geometry = Geometry::LineString {
                coordinates: vec![vec![lng, lat], vec![lng + 0.005, lat + 0.005]],
            };
            drawing
        })
        .collect()
}
