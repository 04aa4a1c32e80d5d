// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geolocated point of interest recorded in the field.
///
/// Markers are the only entity that can be edited while offline: edits land in the pending
/// queue first and are flushed to the backend in batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub state: MarkerState,
    pub lng: f64,
    pub lat: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Marker {
    /// Empty marker with the given id, used as the starting point for net-new drafts.
    pub fn skeleton(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: String::new(),
            description: String::new(),
            state: MarkerState::default(),
            lng: 0.0,
            lat: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fresh marker at a position with a client-generated id.
    pub fn new_at(lng: f64, lat: f64) -> Self {
        let mut marker = Self::skeleton(Uuid::new_v4());
        marker.lng = lng;
        marker.lat = lat;
        marker
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerState {
    #[default]
    New,
    Marked,
    Done,
}

impl MarkerState {
    pub const ALL: [MarkerState; 3] = [Self::New, Self::Marked, Self::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Marked => "marked",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for MarkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMarkerStateError {
    value: String,
}

impl fmt::Display for ParseMarkerStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown marker state {:?} (expected new|marked|done)", self.value)
    }
}

impl std::error::Error for ParseMarkerStateError {}

impl FromStr for MarkerState {
    type Err = ParseMarkerStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "marked" => Ok(Self::Marked),
            "done" => Ok(Self::Done),
            other => Err(ParseMarkerStateError { value: other.to_owned() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Marker, MarkerState};

    #[test]
    fn state_round_trips_through_str() {
        for state in MarkerState::ALL {
            assert_eq!(state.as_str().parse::<MarkerState>().unwrap(), state);
        }
        "open".parse::<MarkerState>().unwrap_err();
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&MarkerState::Marked).unwrap();
        assert_eq!(json, "\"marked\"");
    }

    #[test]
    fn new_at_assigns_distinct_ids() {
        let a = Marker::new_at(13.4, 52.5);
        let b = Marker::new_at(13.4, 52.5);
        assert_ne!(a.id, b.id);
        assert_eq!(a.lng, 13.4);
        assert_eq!(a.lat, 52.5);
        assert_eq!(a.state, MarkerState::New);
    }
}
