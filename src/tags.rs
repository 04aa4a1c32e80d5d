// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::alerts::{Alerts, NewAlert};
use crate::error::ServiceError;
use crate::gateway::{ChangeHub, ChangeKind, TagGateway, TAGS_TABLE};

#[derive(Debug)]
struct TagSet {
    values: Mutex<BTreeSet<String>>,
    revision: watch::Sender<u64>,
}

impl TagSet {
    fn extend(&self, tags: impl IntoIterator<Item = String>) -> bool {
        let changed = {
            let mut values = self.values.lock().expect("tag registry lock poisoned");
            tags.into_iter().fold(false, |changed, tag| values.insert(tag) || changed)
        };
        if changed {
            self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
        }
        changed
    }
}

/// Known tags, kept current by INSERT events on the `tags` table.
///
/// Tags are append-only, so a bulk load is merged into the set instead of replacing it. The
/// change listener stops when the registry is dropped.
pub struct TagRegistry {
    gateway: Arc<dyn TagGateway>,
    alerts: Alerts,
    tags: Arc<TagSet>,
    listener: JoinHandle<()>,
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagRegistry").field("tags", &self.tags).finish_non_exhaustive()
    }
}

impl TagRegistry {
    pub fn new(gateway: Arc<dyn TagGateway>, alerts: Alerts, changes: &ChangeHub) -> Self {
        let (revision, _) = watch::channel(0);
        let tags = Arc::new(TagSet {
            values: Mutex::new(BTreeSet::new()),
            revision,
        });

        let mut feed = changes.subscribe(TAGS_TABLE);
        let sink = tags.clone();
        let listener = tokio::spawn(async move {
            while let Some(event) = feed.recv().await {
                if event.kind != ChangeKind::Insert {
                    continue;
                }
                let tag = event
                    .new
                    .as_ref()
                    .and_then(|row| row.get("tag"))
                    .and_then(|tag| tag.as_str());
                match tag {
                    Some(tag) => {
                        sink.extend([tag.to_owned()]);
                    }
                    None => tracing::warn!("ignoring tag insert without tag"),
                }
            }
        });

        Self {
            gateway,
            alerts,
            tags,
            listener,
        }
    }

    pub async fn load(&self) -> Result<usize, ServiceError> {
        match self.gateway.fetch_tags().await {
            Ok(tags) => {
                let count = tags.len();
                self.tags.extend(tags);
                tracing::debug!(count, "tags loaded");
                Ok(count)
            }
            Err(err) => {
                tracing::error!(%err, "failed to fetch tags");
                self.alerts.error(NewAlert::titled("Failed to fetch tags"), &err);
                Err(ServiceError::FetchFailed(err))
            }
        }
    }

    /// Sorted, deduplicated tags.
    pub fn values(&self) -> Vec<String> {
        let values = self.tags.values.lock().expect("tag registry lock poisoned");
        values.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tags.revision.subscribe()
    }
}

impl Drop for TagRegistry {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
