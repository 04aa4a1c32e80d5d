// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Cow;

use serde_json::Value;

use super::filter::{Filter, FilterOperator};
use crate::model::{Drawing, Marker};

/// A field value as seen by the filter engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Text(Cow<'a, str>),
    List(Vec<Cow<'a, str>>),
}

impl FieldValue<'_> {
    /// Loose scalar equality: numbers and booleans are coerced from the filter's string value,
    /// text compares verbatim and lists compare by their comma-joined form.
    ///
    /// Booleans accept both `1`/`0` and the words `true`/`false`, since a filter string has no
    /// other way to spell a boolean.
    fn loosely_equals(&self, expected: &str) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => match expected.trim() {
                "true" | "1" => *value,
                "false" | "0" => !*value,
                _ => false,
            },
            Self::Number(value) => {
                expected.trim().parse::<f64>().is_ok_and(|expected| expected == *value)
            }
            Self::Text(value) => value.as_ref() == expected,
            Self::List(items) => items.join(",") == expected,
        }
    }
}

/// Items the filter engine can evaluate against.
pub trait Filterable {
    /// Looks up a field by name. `None` means the field is absent, which never excludes.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Non-record items (e.g. JSON scalars) never match a filter set.
    fn is_record(&self) -> bool {
        true
    }
}

pub fn filter_matches<T: Filterable + ?Sized>(item: &T, filter: &Filter) -> bool {
    let Some(value) = item.field(&filter.field) else {
        return true;
    };

    match filter.operator {
        FilterOperator::Eq => match filter.values.first() {
            Some(expected) => value.loosely_equals(expected),
            None => true,
        },
        FilterOperator::Contains => match &value {
            FieldValue::List(items) => {
                filter.values.iter().all(|v| items.iter().any(|item| item == v))
            }
            _ => true,
        },
        FilterOperator::Overlaps => match &value {
            FieldValue::List(items) => {
                filter.values.iter().any(|v| items.iter().any(|item| item == v))
            }
            _ => true,
        },
    }
}

pub fn filters_match<T: Filterable + ?Sized>(item: &T, filters: &[Filter]) -> bool {
    if !item.is_record() {
        return false;
    }
    filters.iter().all(|filter| filter_matches(item, filter))
}

pub fn apply_filters<'a, T: Filterable>(
    items: impl IntoIterator<Item = &'a T>,
    filters: &[Filter],
) -> Vec<&'a T> {
    items.into_iter().filter(|item| filters_match(*item, filters)).collect()
}

impl Filterable for Marker {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(Cow::Owned(self.id.to_string())),
            "name" => FieldValue::Text(Cow::Borrowed(&self.name)),
            "description" => FieldValue::Text(Cow::Borrowed(&self.description)),
            "state" => FieldValue::Text(Cow::Borrowed(self.state.as_str())),
            "lng" => FieldValue::Number(self.lng),
            "lat" => FieldValue::Number(self.lat),
            "created_at" => FieldValue::Text(Cow::Owned(self.created_at.to_rfc3339())),
            "updated_at" => FieldValue::Text(Cow::Owned(self.updated_at.to_rfc3339())),
            _ => return None,
        })
    }
}

impl Filterable for Drawing {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(Cow::Owned(self.id.to_string())),
            "name" => FieldValue::Text(Cow::Borrowed(&self.name)),
            "description" => FieldValue::Text(Cow::Borrowed(&self.description)),
            "tags" => {
                FieldValue::List(self.tags.iter().map(|tag| Cow::Borrowed(tag.as_str())).collect())
            }
            "geometry" => FieldValue::Text(Cow::Borrowed(self.geometry.kind())),
            "created_at" => FieldValue::Text(Cow::Owned(self.created_at.to_rfc3339())),
            "updated_at" => FieldValue::Text(Cow::Owned(self.updated_at.to_rfc3339())),
            other => return self.properties.get(other).map(json_field_value),
        })
    }
}

impl Filterable for Value {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.as_object()?.get(name).map(json_field_value)
    }

    fn is_record(&self) -> bool {
        self.is_object()
    }
}

fn json_field_value(value: &Value) -> FieldValue<'_> {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
        Value::String(s) => FieldValue::Text(Cow::Borrowed(s)),
        Value::Array(items) => FieldValue::List(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Cow::Borrowed(s.as_str()),
                    other => Cow::Owned(other.to_string()),
                })
                .collect(),
        ),
        Value::Object(_) => FieldValue::Text(Cow::Owned(value.to_string())),
    }
}
