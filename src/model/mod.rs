// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Markers are the offline-capable point entity; drawings carry GeoJSON geometry and tags.

pub mod drawing;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod geometry;
pub mod lnglat;
pub mod marker;

pub use drawing::{Drawing, DrawingProperties};
pub use geometry::{Geometry, Position};
pub use lnglat::{Bounds, LngLat};
pub use marker::{Marker, MarkerState, ParseMarkerStateError};
