// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! URL query-string encoding of the map view (`filter`, `center`, `zoom`).

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::filter::{filters_to_query, parse_filters, Filter};
use crate::model::LngLat;

pub const FILTER_PARAM: &str = "filter";
pub const CENTER_PARAM: &str = "center";
pub const ZOOM_PARAM: &str = "zoom";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub center: Option<LngLat>,
    #[serde(default)]
    pub zoom: Option<f64>,
}

impl ViewState {
    /// Parses a query string (with or without a leading `?`). Unparseable values are ignored.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                FILTER_PARAM => state.filters = parse_filters(&value),
                CENTER_PARAM => state.center = parse_center(&value),
                ZOOM_PARAM => state.zoom = parse_zoom(&value),
                _ => {}
            }
        }
        state
    }

    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if !self.filters.is_empty() {
            out.append_pair(FILTER_PARAM, &filters_to_query(&self.filters));
        }
        if let Some(center) = self.center {
            out.append_pair(CENTER_PARAM, &format_center(center));
        }
        if let Some(zoom) = self.zoom {
            out.append_pair(ZOOM_PARAM, &format_zoom(zoom));
        }
        out.finish()
    }
}

/// `lat,lng` with three decimals each.
pub fn format_center(center: LngLat) -> String {
    format!("{:.3},{:.3}", center.lat, center.lng)
}

pub fn parse_center(value: &str) -> Option<LngLat> {
    let (lat, lng) = value.split_once(',')?;
    if lng.contains(',') {
        return None;
    }
    let lat = parse_finite(lat)?;
    let lng = parse_finite(lng)?;
    Some(LngLat { lng, lat })
}

pub fn format_zoom(zoom: f64) -> String {
    format!("{zoom:.2}")
}

pub fn parse_zoom(value: &str) -> Option<f64> {
    parse_finite(value)
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
