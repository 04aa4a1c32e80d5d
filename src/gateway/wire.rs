// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Backend row shapes and their conversion to the domain model.
//!
//! Writes encode marker locations as WKT (`POINT(<lng> <lat>)`); reads return GeoJSON
//! (`{"type": "Point", "coordinates": [lng, lat]}`). Timestamps come back as naive strings that
//! are UTC by convention.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::GatewayError;
use crate::model::{Bounds, Drawing, DrawingProperties, Geometry, LngLat, Marker, MarkerState};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRow {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub state: MarkerState,
    pub location: Value,
    pub created_at: String,
    pub updated_at: String,
}

impl MarkerRow {
    pub fn into_marker(self) -> Result<Marker, GatewayError> {
        let position = decode_location(&self.location)?;
        Ok(Marker {
            id: self.id,
            name: self.name,
            description: self.description,
            state: self.state,
            lng: position.lng,
            lat: position.lat,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Write shape for `markers`; timestamps are owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerUpsertRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub state: MarkerState,
    pub location: String,
}

impl From<&Marker> for MarkerUpsertRow {
    fn from(marker: &Marker) -> Self {
        Self {
            id: marker.id,
            name: marker.name.clone(),
            description: marker.description.clone(),
            state: marker.state,
            location: format_point(marker.lng, marker.lat),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingRow {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub properties: Value,
    pub geom: Geometry,
    pub created_at: String,
    pub updated_at: String,
}

impl DrawingRow {
    pub fn into_drawing(self) -> Result<Drawing, GatewayError> {
        let properties = match self.properties {
            Value::Object(map) => map,
            _ => DrawingProperties::new(),
        };
        Ok(Drawing {
            id: self.id,
            name: self.name,
            description: self.description,
            tags: self.tags.unwrap_or_default().into_iter().collect(),
            properties,
            geometry: self.geom,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingUpsertRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub geom: Geometry,
    pub properties: DrawingProperties,
    pub tags: Vec<String>,
}

impl From<&Drawing> for DrawingUpsertRow {
    fn from(drawing: &Drawing) -> Self {
        Self {
            id: drawing.id,
            name: drawing.name.clone(),
            description: drawing.description.clone(),
            geom: drawing.geometry.clone(),
            properties: drawing.properties.clone(),
            tags: drawing.tags.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRow {
    pub tag: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IdRow {
    pub id: Uuid,
}

/// Arguments of the `markers_in_view` RPC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkersInViewArgs {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
    pub limit_rows: usize,
}

impl MarkersInViewArgs {
    pub fn new(bounds: Bounds, limit_rows: usize) -> Self {
        Self {
            min_lat: bounds.min_lat(),
            min_lng: bounds.min_lng(),
            max_lat: bounds.max_lat(),
            max_lng: bounds.max_lng(),
            limit_rows,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            LngLat::new(self.min_lng, self.min_lat),
            LngLat::new(self.max_lng, self.max_lat),
        )
    }
}

pub fn format_point(lng: f64, lat: f64) -> String {
    format!("POINT({lng} {lat})")
}

/// Parses `POINT(<lng> <lat>)`, optionally prefixed by an EWKT `SRID=<n>;`.
pub fn parse_point(text: &str) -> Option<LngLat> {
    let text = text.trim();
    let text = match text.split_once(';') {
        Some((srid, rest)) if srid.trim().to_ascii_uppercase().starts_with("SRID=") => rest.trim(),
        _ => text,
    };

    let (tag, rest) = text.split_at(text.find('(')?);
    if !tag.trim().eq_ignore_ascii_case("POINT") {
        return None;
    }
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    let mut parts = inner.split_whitespace();
    let lng = parts.next()?.parse::<f64>().ok()?;
    let lat = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !lng.is_finite() || !lat.is_finite() {
        return None;
    }
    Some(LngLat::new(lng, lat))
}

/// GeoJSON point or WKT text to a position.
pub fn decode_location(value: &Value) -> Result<LngLat, GatewayError> {
    match value {
        Value::String(text) => parse_point(text)
            .ok_or_else(|| GatewayError::Decode(format!("invalid point literal: {text}"))),
        Value::Object(_) => match serde_json::from_value::<Geometry>(value.clone()) {
            Ok(Geometry::Point { coordinates }) if coordinates.len() >= 2 => {
                Ok(LngLat::new(coordinates[0], coordinates[1]))
            }
            Ok(other) => Err(GatewayError::Decode(format!(
                "expected Point location, got {}",
                other.kind()
            ))),
            Err(err) => Err(GatewayError::Decode(format!("invalid location: {err}"))),
        },
        other => Err(GatewayError::Decode(format!("invalid location: {other}"))),
    }
}

pub fn encode_location(position: LngLat) -> Value {
    serde_json::json!({
        "type": "Point",
        "coordinates": [position.lng, position.lat],
    })
}

/// Naive timestamps are UTC; strings with an explicit offset are honored.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, GatewayError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(&format!("{text}Z")) {
        return Ok(at.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| GatewayError::Decode(format!("invalid timestamp: {text}")))
}

/// Postgres `timestamp without time zone` text form.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
