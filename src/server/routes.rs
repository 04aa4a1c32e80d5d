// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use crate::alerts::{Alert, NewAlert};
use crate::app::App;
use crate::export::{attachment_disposition, markers_csv, CSV_CONTENT_TYPE, MARKERS_CSV_FILENAME};
use crate::gateway::{ChangeEvent, MarkerGateway as _};
use crate::model::{Bounds, Drawing, Marker};
use crate::query::{apply_filters, parse_filters, Filter, ViewState};
use crate::sync::SyncStatus;

#[derive(Debug, Deserialize)]
pub(super) struct FilterQuery {
    filter: Option<String>,
}

impl FilterQuery {
    /// An explicit `filter` wins; otherwise the persisted view filters apply.
    fn resolve(&self, app: &App) -> Vec<Filter> {
        match &self.filter {
            Some(query) => parse_filters(query),
            None => app.view_state().filters,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub online: bool,
    pub pending: usize,
    pub markers: usize,
    pub drawings: usize,
    pub tags: usize,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Serialize)]
pub struct MarkerView {
    #[serde(flatten)]
    pub marker: Marker,
    pub sync: SyncStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteDrawings {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Online {
    pub online: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewReport {
    #[serde(flatten)]
    pub view: ViewState,
    pub query: String,
}

impl From<ViewState> for ViewReport {
    fn from(view: ViewState) -> Self {
        let query = view.to_query();
        Self { view, query }
    }
}

pub(super) async fn status(State(app): State<Arc<App>>) -> Json<StatusReport> {
    Json(StatusReport {
        online: app.connectivity.is_online(),
        pending: app.markers.pending_count(),
        markers: app.markers.all().len(),
        drawings: app.drawings.all().len(),
        tags: app.tags.values().len(),
        alerts: app.alerts.all(),
    })
}

pub(super) async fn list_markers(
    State(app): State<Arc<App>>,
    Query(query): Query<FilterQuery>,
) -> Json<Vec<MarkerView>> {
    let filters = query.resolve(&app);
    let markers = app.markers.all_with_pending();
    let views = apply_filters(&markers, &filters)
        .into_iter()
        .map(|marker| MarkerView {
            sync: app.markers.status(marker.id),
            marker: marker.clone(),
        })
        .collect();
    Json(views)
}

pub(super) async fn marker_draft(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Json<Marker> {
    Json(app.markers.draft(id))
}

/// Accepted immediately; the flush happens in the background.
pub(super) async fn save_marker(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(marker): Json<Marker>,
) -> Result<impl IntoResponse, ApiError> {
    if marker.id != id {
        return Err(ApiError::BadRequest(format!(
            "marker id {} does not match path id {id}",
            marker.id
        )));
    }
    app.markers.save_draft(marker);
    let view = MarkerView {
        sync: app.markers.status(id),
        marker: app.markers.draft(id),
    };
    Ok((StatusCode::ACCEPTED, Json(view)))
}

pub(super) async fn delete_marker(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app.markers.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Debounced; only the last bounds of a burst are fetched.
pub(super) async fn load_view(
    State(app): State<Arc<App>>,
    Json(bounds): Json<Bounds>,
) -> StatusCode {
    app.markers.load_view(bounds);
    StatusCode::ACCEPTED
}

pub(super) async fn list_drawings(
    State(app): State<Arc<App>>,
    Query(query): Query<FilterQuery>,
) -> Json<Vec<Drawing>> {
    let filters = query.resolve(&app);
    let drawings = app.drawings.all();
    Json(apply_filters(&drawings, &filters).into_iter().cloned().collect())
}

/// Responds with the stored representation of every written drawing.
pub(super) async fn upsert_drawings(
    State(app): State<Arc<App>>,
    Json(drawings): Json<Vec<Drawing>>,
) -> Result<Json<Vec<Drawing>>, ApiError> {
    app.drawings.upsert(&drawings).await?;
    let saved = drawings
        .iter()
        .filter_map(|drawing| app.drawings.get(drawing.id))
        .collect();
    Ok(Json(saved))
}

pub(super) async fn delete_drawings(
    State(app): State<Arc<App>>,
    Json(body): Json<DeleteDrawings>,
) -> Result<StatusCode, ApiError> {
    app.drawings.remove(&body.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn drawing_draft(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Json<Drawing> {
    Json(app.drawings.draft(id))
}

pub(super) async fn tags(State(app): State<Arc<App>>) -> Json<Vec<String>> {
    Json(app.tags.values())
}

pub(super) async fn dismiss_alert(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !app.alerts.has(&id) {
        return Err(ApiError::NotFound(format!("alert {id}")));
    }
    if !app.alerts.dismiss(&id) {
        return Err(ApiError::Conflict(format!("alert {id} cannot be dismissed")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn set_connectivity(
    State(app): State<Arc<App>>,
    Json(body): Json<Online>,
) -> StatusCode {
    app.connectivity.set_online(body.online);
    StatusCode::NO_CONTENT
}

pub(super) async fn view(State(app): State<Arc<App>>) -> Json<ViewReport> {
    Json(app.view_state().into())
}

pub(super) async fn set_view(
    State(app): State<Arc<App>>,
    Json(view): Json<ViewState>,
) -> Json<ViewReport> {
    app.set_view_state(view.clone());
    Json(view.into())
}

/// Always a fresh fetch, so the file reflects the backend rather than the local cache.
pub(super) async fn export_markers(
    State(app): State<Arc<App>>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = app.markers.settings().fetch_limit;
    let markers = match app.gateways.markers.fetch_markers(limit).await {
        Ok(markers) => markers,
        Err(err) => {
            tracing::error!(%err, "failed to export markers");
            app.alerts.error(NewAlert::titled("Failed to export markers"), &err);
            return Err(err.into());
        }
    };
    let body = markers_csv(&markers)?;
    tracing::info!(count = markers.len(), "markers exported");

    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_owned()),
            (header::CONTENT_DISPOSITION, attachment_disposition(MARKERS_CSV_FILENAME)),
        ],
        body,
    ))
}

pub(super) async fn change_hook(
    State(app): State<Arc<App>>,
    Json(event): Json<ChangeEvent>,
) -> StatusCode {
    let receivers = app.changes.publish(event);
    tracing::debug!(receivers, "change event received");
    StatusCode::ACCEPTED
}
