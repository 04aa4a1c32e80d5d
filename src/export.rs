// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! CSV export of markers.

use csv::{Terminator, WriterBuilder};
use serde::Serialize;
use uuid::Uuid;

use crate::gateway::wire::format_timestamp;
use crate::model::{Marker, MarkerState};

pub const MARKERS_CSV_HEADER: [&str; 8] =
    ["id", "name", "description", "state", "lng", "lat", "created_at", "updated_at"];

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const MARKERS_CSV_FILENAME: &str = "markers.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One flat export row; timestamps keep the backend's naive UTC form.
#[derive(Debug, Serialize)]
struct MarkerCsvRow<'a> {
    id: Uuid,
    name: &'a str,
    description: &'a str,
    state: MarkerState,
    lng: f64,
    lat: f64,
    created_at: String,
    updated_at: String,
}

impl<'a> From<&'a Marker> for MarkerCsvRow<'a> {
    fn from(marker: &'a Marker) -> Self {
        Self {
            id: marker.id,
            name: &marker.name,
            description: &marker.description,
            state: marker.state,
            lng: marker.lng,
            lat: marker.lat,
            created_at: format_timestamp(marker.created_at),
            updated_at: format_timestamp(marker.updated_at),
        }
    }
}

/// Header plus one row per marker, CRLF separated with no trailing line break.
pub fn markers_csv(markers: &[Marker]) -> Result<String, ExportError> {
    let mut wrt = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::with_capacity(64 + markers.len() * 96));

    // Written by hand so an empty export still carries the header.
    wrt.write_record(MARKERS_CSV_HEADER)?;
    for marker in markers {
        wrt.serialize(MarkerCsvRow::from(marker))?;
    }

    let bytes = wrt.into_inner().map_err(|err| csv::Error::from(err.into_error()))?;
    let mut out = String::from_utf8(bytes)?;
    if out.ends_with("\r\n") {
        out.truncate(out.len() - 2);
    }
    Ok(out)
}

/// `attachment` disposition header value for a download.
pub fn attachment_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename.replace('"', ""))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use uuid::Uuid;

    use super::{attachment_disposition, markers_csv};
    use crate::model::{Marker, MarkerState};

    fn sample() -> Marker {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        Marker {
            id: Uuid::nil(),
            name: "Hydrant".to_owned(),
            description: "red, \"big\"".to_owned(),
            state: MarkerState::Done,
            lng: 8.5,
            lat: 47.25,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn empty_export_is_header_only() {
        assert_eq!(
            markers_csv(&[]).unwrap(),
            "id,name,description,state,lng,lat,created_at,updated_at"
        );
    }

    #[test]
    fn rows_are_crlf_separated_and_quoted() {
        let csv = markers_csv(&[sample(), sample()]).unwrap();
        let rows = csv.split("\r\n").collect::<Vec<_>>();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            "00000000-0000-0000-0000-000000000000,Hydrant,\"red, \"\"big\"\"\",done,8.5,47.25,\
             2024-05-01T08:30:00.000000,2024-05-01T08:30:00.000000"
        );
        assert!(!csv.ends_with('\n'));
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("a,b", "\"a,b\"")]
    #[case("line\nbreak", "\"line\nbreak\"")]
    #[case("say \"hi\"", "\"say \"\"hi\"\"\"")]
    #[case("", "")]
    fn names_are_quoted_only_when_needed(#[case] name: &str, #[case] expected: &str) {
        let mut marker = sample();
        marker.name = name.to_owned();
        marker.description = "plain".to_owned();
        let csv = markers_csv(&[marker]).unwrap();
        let row = csv.split_once("\r\n").map(|(_, row)| row).unwrap();
        let prefix = "00000000-0000-0000-0000-000000000000,";
        assert!(row.starts_with(&format!("{prefix}{expected},plain,done,")), "{row}");
    }

    #[test]
    fn disposition_names_the_file() {
        assert_eq!(attachment_disposition("markers.csv"), "attachment; filename=\"markers.csv\"");
    }
}
