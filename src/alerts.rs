// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! User-visible notifications.
//!
//! Alerts are keyed by id: raising an alert with an id that is already shown replaces it in
//! place, which is how long-lived states ("offline", "saving") are kept to a single banner.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use smol_str::SmolStr;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warn,
    Error,
}

impl AlertLevel {
    fn default_title(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warn => "Warning",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub id: SmolStr,
    pub title: String,
    pub msg: Option<String>,
    pub details: Option<String>,
    pub level: AlertLevel,
    pub can_close: bool,
}

/// Parameters for raising an alert. Unset ids get a random one; unset titles fall back to the
/// level name.
#[derive(Debug, Clone)]
pub struct NewAlert {
    id: Option<SmolStr>,
    title: Option<String>,
    msg: Option<String>,
    details: Option<String>,
    can_close: bool,
}

impl Default for NewAlert {
    fn default() -> Self {
        Self {
            id: None,
            title: None,
            msg: None,
            details: None,
            can_close: true,
        }
    }
}

impl NewAlert {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<SmolStr>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// The alert cannot be dismissed by the user; only the raising service clears it.
    pub fn persistent(mut self) -> Self {
        self.can_close = false;
        self
    }

    fn build(self, level: AlertLevel) -> Alert {
        Alert {
            id: self.id.unwrap_or_else(|| SmolStr::new(uuid::Uuid::new_v4().to_string())),
            title: self.title.unwrap_or_else(|| level.default_title().to_owned()),
            msg: self.msg,
            details: self.details,
            level,
            can_close: self.can_close,
        }
    }
}

#[derive(Debug)]
struct AlertsInner {
    entries: Mutex<Vec<Alert>>,
    rev: watch::Sender<u64>,
}

#[derive(Debug, Clone)]
pub struct Alerts {
    inner: Arc<AlertsInner>,
}

impl Default for Alerts {
    fn default() -> Self {
        Self::new()
    }
}

impl Alerts {
    pub fn new() -> Self {
        let (rev, _) = watch::channel(0);
        Self {
            inner: Arc::new(AlertsInner {
                entries: Mutex::new(Vec::new()),
                rev,
            }),
        }
    }

    pub fn info(&self, alert: NewAlert) -> Alert {
        self.raise(alert.build(AlertLevel::Info))
    }

    pub fn warn(&self, alert: NewAlert) -> Alert {
        self.raise(alert.build(AlertLevel::Warn))
    }

    /// Raises an error alert; the error text becomes the alert details.
    pub fn error(&self, alert: NewAlert, err: &dyn std::error::Error) -> Alert {
        self.raise(alert.with_details(err.to_string()).build(AlertLevel::Error))
    }

    fn raise(&self, alert: Alert) -> Alert {
        {
            let mut entries = self.inner.entries.lock().expect("alerts lock poisoned");
            match entries.iter_mut().find(|existing| existing.id == alert.id) {
                Some(existing) if *existing == alert => return alert,
                Some(existing) => *existing = alert.clone(),
                None => entries.push(alert.clone()),
            }
        }
        self.bump();
        alert
    }

    pub fn delete(&self, id: &str) -> bool {
        let removed = {
            let mut entries = self.inner.entries.lock().expect("alerts lock poisoned");
            let before = entries.len();
            entries.retain(|alert| alert.id != id);
            entries.len() != before
        };
        if removed {
            self.bump();
        }
        removed
    }

    /// User-initiated close; persistent alerts stay.
    pub fn dismiss(&self, id: &str) -> bool {
        let closable = self.get(id).is_some_and(|alert| alert.can_close);
        closable && self.delete(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<Alert> {
        let entries = self.inner.entries.lock().expect("alerts lock poisoned");
        entries.iter().find(|alert| alert.id == id).cloned()
    }

    /// All alerts in the order they were first raised.
    pub fn all(&self) -> Vec<Alert> {
        self.inner.entries.lock().expect("alerts lock poisoned").clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.rev.subscribe()
    }

    fn bump(&self) {
        self.inner.rev.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::{AlertLevel, Alerts, NewAlert};

    #[test]
    fn raising_same_id_replaces_in_place() {
        let alerts = Alerts::new();
        alerts.info(NewAlert::titled("first").with_id("a"));
        alerts.info(NewAlert::titled("other").with_id("b"));
        alerts.warn(NewAlert::titled("second").with_id("a"));

        let all = alerts.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].title, "second");
        assert_eq!(all[0].level, AlertLevel::Warn);
        assert_eq!(all[1].id, "b");
    }

    #[test]
    fn defaults_title_and_generates_id() {
        let alerts = Alerts::new();
        let alert = alerts.warn(NewAlert::default().with_msg("careful"));
        assert_eq!(alert.title, "Warning");
        assert!(alert.can_close);
        assert!(uuid::Uuid::parse_str(&alert.id).is_ok());
    }

    #[test]
    fn error_carries_details() {
        let alerts = Alerts::new();
        let err = std::io::Error::other("disk on fire");
        let alert = alerts.error(NewAlert::titled("Save failed"), &err);
        assert_eq!(alert.details.as_deref(), Some("disk on fire"));
        assert_eq!(alert.level, AlertLevel::Error);
    }

    #[test]
    fn dismiss_respects_persistent_alerts() {
        let alerts = Alerts::new();
        alerts.warn(NewAlert::titled("offline").with_id("offline").persistent());
        alerts.info(NewAlert::titled("hello").with_id("hello"));

        assert!(!alerts.dismiss("offline"));
        assert!(alerts.dismiss("hello"));
        assert!(alerts.has("offline"));
        assert!(!alerts.has("hello"));

        assert!(alerts.delete("offline"));
        assert!(!alerts.delete("offline"));
    }

    #[test]
    fn subscribers_see_changes_but_not_identical_reraises() {
        let alerts = Alerts::new();
        let mut rx = alerts.subscribe();
        alerts.info(NewAlert::titled("x").with_id("x"));
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        alerts.info(NewAlert::titled("x").with_id("x"));
        assert!(!rx.has_changed().unwrap());
    }
}
