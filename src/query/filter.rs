// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

const SEGMENT_SEPARATOR: char = ';';
const VALUE_SEPARATOR: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Loose equality against a scalar field (first value only).
    Eq,
    /// List field must include every value.
    Contains,
    /// List field must include at least one value.
    Overlaps,
}

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Contains => "contains",
            Self::Overlaps => "overlaps",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Eq),
            "contains" => Ok(Self::Contains),
            "overlaps" => Ok(Self::Overlaps),
            other => Err(ParseFilterError::UnknownOperator(other.to_owned())),
        }
    }
}

/// One `field.op(v1,v2)` clause. A filter set is an ordered list of clauses, ANDed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: SmolStr,
    pub operator: FilterOperator,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(
        field: impl Into<SmolStr>,
        operator: FilterOperator,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.field, self.operator)?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            f.write_str(value)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFilterError {
    Malformed(String),
    UnknownOperator(String),
}

impl fmt::Display for ParseFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(segment) => {
                write!(f, "malformed filter {segment:?} (expected field.op(v1,v2))")
            }
            Self::UnknownOperator(op) => {
                write!(f, "unknown filter operator {op:?} (expected eq|contains|overlaps)")
            }
        }
    }
}

impl std::error::Error for ParseFilterError {}

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = segment_regex()
            .captures(s)
            .ok_or_else(|| ParseFilterError::Malformed(s.to_owned()))?;
        let operator = caps[2].parse::<FilterOperator>()?;
        Ok(Self {
            field: SmolStr::new(&caps[1]),
            operator,
            values: caps[3].split(VALUE_SEPARATOR).map(str::to_owned).collect(),
        })
    }
}

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([a-z]+)\(([^();]+)\)$")
            .expect("filter segment regex is valid")
    })
}

/// Parses a compact filter query such as `tags.contains(a,b);name.eq(c)`.
///
/// Parsing is tolerant: malformed segments are dropped and never reported as errors.
pub fn parse_filters(query: &str) -> Vec<Filter> {
    if query.is_empty() {
        return Vec::new();
    }

    query
        .split(SEGMENT_SEPARATOR)
        .filter_map(|segment| match segment.parse::<Filter>() {
            Ok(filter) => Some(filter),
            Err(err) => {
                tracing::debug!(%err, "dropping filter segment");
                None
            }
        })
        .collect()
}

pub fn filters_to_query(filters: &[Filter]) -> String {
    let mut out = String::new();
    for (idx, filter) in filters.iter().enumerate() {
        if idx > 0 {
            out.push(SEGMENT_SEPARATOR);
        }
        out.push_str(&filter.to_string());
    }
    out
}
