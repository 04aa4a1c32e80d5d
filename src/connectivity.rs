// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Online/offline tracking.
//!
//! The platform signal (a health probe in the daemon, explicit calls elsewhere) feeds
//! [`Connectivity::set_online`]; consumers watch the state through [`Connectivity::subscribe`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::alerts::{Alerts, NewAlert};
use crate::gateway::HealthCheck;

pub const OFFLINE_ALERT_ID: &str = "offline";

#[derive(Debug)]
struct ConnectivityInner {
    alerts: Alerts,
    online: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct Connectivity {
    inner: Arc<ConnectivityInner>,
}

impl Connectivity {
    /// The initial state is applied like a transition, so starting offline shows the alert.
    pub fn new(alerts: Alerts, initially_online: bool) -> Self {
        let (online, _) = watch::channel(initially_online);
        let connectivity = Self {
            inner: Arc::new(ConnectivityInner { alerts, online }),
        };
        connectivity.sync_alert(initially_online);
        connectivity
    }

    pub fn is_online(&self) -> bool {
        *self.inner.online.borrow()
    }

    pub fn set_online(&self, online: bool) {
        let changed = self.inner.online.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            tracing::info!(online, "connectivity changed");
            self.sync_alert(online);
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.online.subscribe()
    }

    fn sync_alert(&self, online: bool) {
        if online {
            self.inner.alerts.delete(OFFLINE_ALERT_ID);
        } else {
            self.inner.alerts.warn(
                NewAlert::titled("You are offline")
                    .with_id(OFFLINE_ALERT_ID)
                    .with_msg(
                        "Your entries are stored on this device and synced automatically once \
                         you are back online. Keep the app running for that.",
                    )
                    .persistent(),
            );
        }
    }
}

/// Background task polling the backend health check; aborted on drop.
#[derive(Debug)]
pub struct ConnectivityProbe {
    handle: JoinHandle<()>,
}

impl ConnectivityProbe {
    pub fn spawn(
        connectivity: Connectivity,
        health: Arc<dyn HealthCheck>,
        interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let online = match health.ping().await {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::debug!(%err, "health check failed");
                        false
                    }
                };
                connectivity.set_online(online);
            }
        });
        Self { handle }
    }
}

impl Drop for ConnectivityProbe {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
