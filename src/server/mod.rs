// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Local HTTP surface of the daemon.
//!
//! Every route works against the in-process services, so marker edits are accepted while the
//! backend is unreachable and flushed once connectivity returns.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tokio::net::TcpListener;

use crate::app::App;
use crate::error::ServiceError;
use crate::export::ExportError;
use crate::gateway::GatewayError;

mod routes;

pub use routes::{DeleteDrawings, MarkerView, Online, StatusReport, ViewReport};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Service(_) | ApiError::Gateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/status", get(routes::status))
        .route("/markers", get(routes::list_markers))
        .route("/markers/view", post(routes::load_view))
        .route("/markers/{id}", put(routes::save_marker).delete(routes::delete_marker))
        .route("/markers/{id}/draft", get(routes::marker_draft))
        .route(
            "/drawings",
            get(routes::list_drawings)
                .put(routes::upsert_drawings)
                .delete(routes::delete_drawings),
        )
        .route("/drawings/{id}/draft", get(routes::drawing_draft))
        .route("/tags", get(routes::tags))
        .route("/alerts/{id}", delete(routes::dismiss_alert))
        .route("/connectivity", post(routes::set_connectivity))
        .route("/view", get(routes::view).put(routes::set_view))
        .route("/export/markers.csv", get(routes::export_markers))
        .route("/hooks/changes", post(routes::change_hook))
        .with_state(app)
}

/// Binds `127.0.0.1:port` (0 = ephemeral).
pub async fn bind(port: u16) -> std::io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

/// Serves until ctrl-c or SIGTERM.
pub async fn serve(listener: TcpListener, app: Arc<App>) -> std::io::Result<()> {
    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(%err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}
