// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-side queries over in-memory collections.
//!
//! Filters use a compact, URL-friendly grammar (`field.op(v1,v2);field2.op2(v3)`) that also
//! travels in the `filter` query parameter of the map view.

pub mod eval;
pub mod filter;
pub mod params;

pub use eval::{apply_filters, filter_matches, filters_match, FieldValue, Filterable};
pub use filter::{filters_to_query, parse_filters, Filter, FilterOperator, ParseFilterError};
pub use params::ViewState;
