// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! PostgREST client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use super::wire::{
    DrawingRow, DrawingUpsertRow, IdRow, MarkerRow, MarkerUpsertRow, MarkersInViewArgs, TagRow,
};
use super::{
    DrawingGateway, GatewayError, HealthCheck, MarkerGateway, TagGateway, DRAWINGS_TABLE,
    MARKERS_TABLE, TAGS_TABLE,
};
use crate::model::{Bounds, Drawing, Marker};

const REST_PATH: &str = "rest/v1/";
const MARKER_COLUMNS: &str = "id,name,description,state,location,created_at,updated_at";
const DRAWING_COLUMNS: &str = "id,name,description,properties,geom,tags,created_at,updated_at";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";
const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone)]
pub struct RestConfig {
    base_url: Url,
    api_key: String,
}

impl RestConfig {
    /// `base_url` is the project URL (e.g. `https://xyz.supabase.co`); the REST prefix is added.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[derive(Debug, Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    rest_url: Url,
}

impl RestGateway {
    pub fn new(config: RestConfig) -> Result<Self, GatewayError> {
        let rest_url = config
            .base_url
            .join(REST_PATH)
            .map_err(|err| GatewayError::Unavailable(format!("invalid api url: {err}")))?;

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| GatewayError::Unavailable("api key is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| GatewayError::Unavailable("api key is not a valid header value".into()))?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("fieldmark/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, rest_url })
    }

    fn table_url(&self, table: &str, query: &[(&str, &str)]) -> Result<Url, GatewayError> {
        let mut url = self
            .rest_url
            .join(table)
            .map_err(|err| GatewayError::Unavailable(format!("invalid table url: {err}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|err| GatewayError::Decode(err.to_string()))
}

async fn expect_success(response: reqwest::Response) -> Result<(), GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Undecodable rows are skipped so one bad row never hides the rest.
fn decode_rows<R, T>(rows: Vec<R>, decode: impl Fn(R) -> Result<T, GatewayError>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match decode(row) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%err, "skipping undecodable row");
                None
            }
        })
        .collect()
}

#[async_trait]
impl MarkerGateway for RestGateway {
    async fn fetch_markers(&self, limit: usize) -> Result<Vec<Marker>, GatewayError> {
        let limit = limit.to_string();
        let url = self.table_url(MARKERS_TABLE, &[("select", MARKER_COLUMNS), ("limit", &limit)])?;
        let rows: Vec<MarkerRow> = read_json(self.client.get(url).send().await?).await?;
        Ok(decode_rows(rows, MarkerRow::into_marker))
    }

    async fn fetch_markers_in_view(
        &self,
        bounds: Bounds,
        limit: usize,
    ) -> Result<Vec<Marker>, GatewayError> {
        let url = self.table_url("rpc/markers_in_view", &[])?;
        let args = MarkersInViewArgs::new(bounds, limit);
        let rows: Vec<MarkerRow> = read_json(self.client.post(url).json(&args).send().await?).await?;
        Ok(decode_rows(rows, MarkerRow::into_marker))
    }

    async fn upsert_markers(&self, markers: &[Marker]) -> Result<Vec<Marker>, GatewayError> {
        let url = self.table_url(MARKERS_TABLE, &[("select", MARKER_COLUMNS)])?;
        let rows = markers.iter().map(MarkerUpsertRow::from).collect::<Vec<_>>();
        let response = self
            .client
            .post(url)
            .header("Prefer", PREFER_UPSERT)
            .json(&rows)
            .send()
            .await?;
        let rows: Vec<MarkerRow> = read_json(response).await?;
        Ok(decode_rows(rows, MarkerRow::into_marker))
    }

    async fn delete_marker(&self, id: Uuid) -> Result<(), GatewayError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(MARKERS_TABLE, &[("id", &filter)])?;
        expect_success(self.client.delete(url).send().await?).await
    }
}

#[async_trait]
impl DrawingGateway for RestGateway {
    async fn fetch_drawings(&self) -> Result<Vec<Drawing>, GatewayError> {
        let url = self.table_url(DRAWINGS_TABLE, &[("select", DRAWING_COLUMNS)])?;
        let rows: Vec<DrawingRow> = read_json(self.client.get(url).send().await?).await?;
        Ok(decode_rows(rows, DrawingRow::into_drawing))
    }

    async fn upsert_drawings(&self, drawings: &[Drawing]) -> Result<Vec<Drawing>, GatewayError> {
        let url = self.table_url(DRAWINGS_TABLE, &[("select", DRAWING_COLUMNS)])?;
        let rows = drawings.iter().map(DrawingUpsertRow::from).collect::<Vec<_>>();
        let response = self
            .client
            .post(url)
            .header("Prefer", PREFER_UPSERT)
            .json(&rows)
            .send()
            .await?;
        let rows: Vec<DrawingRow> = read_json(response).await?;
        Ok(decode_rows(rows, DrawingRow::into_drawing))
    }

    async fn delete_drawings(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, GatewayError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let filter = format!("in.({list})");
        let url = self.table_url(DRAWINGS_TABLE, &[("id", &filter), ("select", "id")])?;
        let response = self
            .client
            .delete(url)
            .header("Prefer", PREFER_REPRESENTATION)
            .send()
            .await?;
        let rows: Vec<IdRow> = read_json(response).await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}

#[async_trait]
impl TagGateway for RestGateway {
    async fn fetch_tags(&self) -> Result<Vec<String>, GatewayError> {
        let url = self.table_url(TAGS_TABLE, &[("select", "tag"), ("order", "tag")])?;
        let rows: Vec<TagRow> = read_json(self.client.get(url).send().await?).await?;
        Ok(rows.into_iter().map(|row| row.tag).collect())
    }
}

#[async_trait]
impl HealthCheck for RestGateway {
    async fn ping(&self) -> Result<(), GatewayError> {
        expect_success(self.client.get(self.rest_url.clone()).send().await?).await
    }
}
