// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Geometry;

/// Free-form drawing properties (e.g. `color`), stored as an opaque JSON object.
pub type DrawingProperties = serde_json::Map<String, serde_json::Value>;

/// A vector drawing (polygon, line or point) with tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub properties: DrawingProperties,
    pub geometry: Geometry,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Drawing {
    /// Empty drawing placed at `[0, 0]`, the starting point for net-new drafts.
    pub fn skeleton(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: String::new(),
            description: String::new(),
            tags: BTreeSet::new(),
            properties: DrawingProperties::new(),
            geometry: Geometry::point(0.0, 0.0),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn color(&self) -> Option<&str> {
        self.properties.get("color").and_then(|value| value.as_str())
    }
}
