// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Daemon settings: command-line options with environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use crate::store::WriteDurability;
use crate::sync::SyncSettings;

pub const DEFAULT_PORT: u16 = 27436;
pub const DEFAULT_DATA_DIR: &str = ".fieldmark";
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(10);
pub const API_URL_ENV: &str = "FIELDMARK_API_URL";
pub const API_KEY_ENV: &str = "FIELDMARK_API_KEY";

/// Raw options as given on the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Options {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub data_dir: Option<String>,
    pub port: Option<u16>,
    pub demo: bool,
    pub durable_writes: bool,
    pub retry_secs: Option<u64>,
    pub probe_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSettings {
    /// In-memory backend seeded with sample data.
    Demo,
    Rest { api_url: String, api_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: BackendSettings,
    pub data_dir: PathBuf,
    pub port: u16,
    pub durability: WriteDurability,
    pub sync: SyncSettings,
    pub probe_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing backend url: pass --api-url or set {API_URL_ENV}")]
    MissingApiUrl,
    #[error("missing api key: pass --api-key or set {API_KEY_ENV}")]
    MissingApiKey,
    #[error("--demo cannot be combined with --api-url or --api-key")]
    DemoWithBackend,
    #[error("{0} must be at least one second")]
    ZeroInterval(&'static str),
}

impl Settings {
    /// Resolves options against `env`. Demo mode without `--data-dir` uses a fresh temp dir.
    pub fn resolve(
        options: Options,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let backend = if options.demo {
            if options.api_url.is_some() || options.api_key.is_some() {
                return Err(ConfigError::DemoWithBackend);
            }
            BackendSettings::Demo
        } else {
            let api_url = options
                .api_url
                .or_else(|| env(API_URL_ENV))
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingApiUrl)?;
            let api_key = options
                .api_key
                .or_else(|| env(API_KEY_ENV))
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingApiKey)?;
            BackendSettings::Rest { api_url, api_key }
        };

        let data_dir = match (options.data_dir, options.demo) {
            (Some(dir), _) => PathBuf::from(dir),
            (None, true) => demo_data_dir(),
            (None, false) => PathBuf::from(DEFAULT_DATA_DIR),
        };

        let mut sync = SyncSettings::default();
        if let Some(secs) = options.retry_secs {
            if secs == 0 {
                return Err(ConfigError::ZeroInterval("--retry-secs"));
            }
            sync.retry_delay = Duration::from_secs(secs);
        }
        let probe_interval = match options.probe_secs {
            Some(0) => return Err(ConfigError::ZeroInterval("--probe-secs")),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_PROBE_INTERVAL,
        };

        Ok(Self {
            backend,
            data_dir,
            port: options.port.unwrap_or(DEFAULT_PORT),
            durability: if options.durable_writes {
                WriteDurability::Durable
            } else {
                WriteDurability::BestEffort
            },
            sync,
            probe_interval,
        })
    }

    pub fn from_env(options: Options) -> Result<Self, ConfigError> {
        Self::resolve(options, |name| std::env::var(name).ok())
    }
}

fn demo_data_dir() -> PathBuf {
    let now_millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("fieldmark-demo-{}-{now_millis}", std::process::id()))
}
