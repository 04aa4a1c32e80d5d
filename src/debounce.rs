// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Trailing-edge debouncer: only the last call within `delay` runs.
///
/// A call cancels the previous one only while it is still waiting; once the delay has elapsed
/// the work is detached and runs to completion.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn call<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let deadline = tokio::time::Instant::now() + self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tokio::spawn(work);
        });

        let previous = self.pending.lock().expect("debouncer lock poisoned").replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drops a call that is still waiting.
    pub fn cancel(&self) {
        if let Some(timer) = self.pending.lock().expect("debouncer lock poisoned").take() {
            timer.abort();
        }
    }
}
