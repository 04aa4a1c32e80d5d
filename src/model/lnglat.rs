// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Rectangular lat/lng window, given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: LngLat,
    pub north_east: LngLat,
}

impl Bounds {
    pub fn new(south_west: LngLat, north_east: LngLat) -> Self {
        Self { south_west, north_east }
    }

    pub fn min_lng(&self) -> f64 {
        self.south_west.lng.min(self.north_east.lng)
    }

    pub fn max_lng(&self) -> f64 {
        self.south_west.lng.max(self.north_east.lng)
    }

    pub fn min_lat(&self) -> f64 {
        self.south_west.lat.min(self.north_east.lat)
    }

    pub fn max_lat(&self) -> f64 {
        self.south_west.lat.max(self.north_east.lat)
    }

    pub fn contains(&self, point: LngLat) -> bool {
        (self.min_lng()..=self.max_lng()).contains(&point.lng)
            && (self.min_lat()..=self.max_lat()).contains(&point.lat)
    }
}
