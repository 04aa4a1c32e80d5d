// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Explicit wiring of all services.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::alerts::Alerts;
use crate::config::{BackendSettings, Settings};
use crate::connectivity::{Connectivity, ConnectivityProbe};
use crate::drawings::DrawingStore;
use crate::gateway::{ChangeHub, GatewayError, Gateways, MemoryBackend, RestConfig, RestGateway};
use crate::model::{Drawing, Geometry, Marker, MarkerState};
use crate::query::ViewState;
use crate::store::{LocalStorage, PendingQueue, Stored};
use crate::sync::{MarkerSync, SyncSettings};
use crate::tags::TagRegistry;

/// Storage key of the persisted map view (filters, center, zoom).
pub const VIEW_STATE_KEY: &str = "mapView";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Every service of a running instance. Must be built inside a Tokio runtime.
#[derive(Debug)]
pub struct App {
    pub alerts: Alerts,
    pub connectivity: Connectivity,
    pub changes: ChangeHub,
    pub gateways: Gateways,
    pub markers: MarkerSync,
    pub drawings: DrawingStore,
    pub tags: TagRegistry,
    view: Mutex<Stored<ViewState>>,
    _probe: Option<ConnectivityProbe>,
}

impl App {
    pub fn new(
        gateways: Gateways,
        changes: ChangeHub,
        storage: LocalStorage,
        sync: SyncSettings,
        initially_online: bool,
    ) -> Self {
        let alerts = Alerts::new();
        let connectivity = Connectivity::new(alerts.clone(), initially_online);
        let markers = MarkerSync::new(
            gateways.markers.clone(),
            PendingQueue::new(storage.clone()),
            alerts.clone(),
            connectivity.clone(),
            sync,
        );
        markers.listen(&changes);
        let drawings = DrawingStore::new(gateways.drawings.clone(), alerts.clone());
        let tags = TagRegistry::new(gateways.tags.clone(), alerts.clone(), &changes);
        let view = Mutex::new(Stored::load(storage, VIEW_STATE_KEY));

        Self {
            alerts,
            connectivity,
            changes,
            gateways,
            markers,
            drawings,
            tags,
            view,
            _probe: None,
        }
    }

    /// Builds the app for `settings` and starts the connectivity probe.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let storage =
            LocalStorage::new(settings.data_dir.clone()).with_durability(settings.durability);
        let changes = ChangeHub::new();

        let gateways = match &settings.backend {
            BackendSettings::Demo => {
                tracing::info!("using in-memory demo backend");
                Gateways::from_backend(Arc::new(demo_backend(changes.clone())))
            }
            BackendSettings::Rest { api_url, api_key } => {
                let gateway = RestGateway::new(RestConfig::new(api_url, api_key.clone())?)?;
                Gateways::from_backend(Arc::new(gateway))
            }
        };

        let mut app = Self::new(gateways, changes, storage, settings.sync.clone(), true);
        app.start_probe(settings.probe_interval);
        Ok(app)
    }

    /// Replaces any running probe.
    pub fn start_probe(&mut self, interval: Duration) {
        self._probe = Some(ConnectivityProbe::spawn(
            self.connectivity.clone(),
            self.gateways.health.clone(),
            interval,
        ));
    }

    /// Initial loads of all collections. Failures are already logged and alerted.
    pub async fn load(&self) {
        let (markers, drawings, tags) =
            tokio::join!(self.markers.load_all(), self.drawings.load_all(), self.tags.load());
        tracing::info!(
            markers = markers.is_ok(),
            drawings = drawings.is_ok(),
            tags = tags.is_ok(),
            "initial load finished"
        );
    }

    pub fn view_state(&self) -> ViewState {
        self.view.lock().expect("view state lock poisoned").get().clone()
    }

    pub fn set_view_state(&self, view: ViewState) {
        self.view.lock().expect("view state lock poisoned").set(view);
    }
}

/// In-memory backend with a handful of sample markers, drawings and tags.
pub fn demo_backend(changes: ChangeHub) -> MemoryBackend {
    let backend = MemoryBackend::new(changes);
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).single().unwrap_or_else(Utc::now);

    let markers = [
        ("Hydrant", "Next to the bakery", MarkerState::New, 13.4050, 52.5200),
        ("Bench", "Broken slat", MarkerState::Marked, 13.4101, 52.5219),
        ("Streetlight", "Flickering at night", MarkerState::Done, 13.3989, 52.5170),
    ]
    .into_iter()
    .map(|(name, description, state, lng, lat)| Marker {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        description: description.to_owned(),
        state,
        lng,
        lat,
        created_at: at,
        updated_at: at,
    })
    .collect::<Vec<_>>();
    backend.seed_markers(&markers);

    let mut route = Drawing::skeleton(Uuid::new_v4());
    route.name = "Inspection route".to_owned();
    route.tags = ["inspection".to_owned(), "north".to_owned()].into_iter().collect();
    route.properties.insert("color".to_owned(), serde_json::json!("#e4572e"));
    route.geometry = Geometry::LineString {
        coordinates: vec![vec![13.4050, 52.5200], vec![13.4101, 52.5219]],
    };
    route.created_at = at;
    route.updated_at = at;

    let mut area = Drawing::skeleton(Uuid::new_v4());
    area.name = "Park".to_owned();
    area.tags = ["green".to_owned()].into_iter().collect();
    area.geometry = Geometry::Polygon {
        coordinates: vec![vec![
            vec![13.398, 52.516],
            vec![13.402, 52.516],
            vec![13.402, 52.518],
            vec![13.398, 52.518],
            vec![13.398, 52.516],
        ]],
    };
    area.created_at = at;
    area.updated_at = at;

    backend.seed_drawings(&[route, area]);
    backend.seed_tags(["maintenance"]);
    backend
}
