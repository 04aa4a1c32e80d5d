// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fieldmark-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fieldmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Fieldmark daemon entrypoint.
//!
//! Serves the local HTTP surface at `http://127.0.0.1:<port>/` and keeps markers in sync with
//! the configured PostgREST backend, or with a built-in demo backend under `--demo`.

use std::error::Error;
use std::sync::Arc;

use fieldmark::app::App;
use fieldmark::config::{Options, Settings, API_KEY_ENV, API_URL_ENV, DEFAULT_PORT};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "fieldmark=info";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<data-dir>] [--api-url <url>] [--api-key <key>] [--port <port>] [--durable-writes] [--retry-secs <n>] [--probe-secs <n>]\n  {program} --demo [--data-dir <dir>] [--port <port>] [--retry-secs <n>] [--probe-secs <n>]\n\nServes the local API at `http://127.0.0.1:<port>/`.\n--port selects the port (0 = ephemeral; default {DEFAULT_PORT}).\n\n--api-url / --api-key fall back to {API_URL_ENV} / {API_KEY_ENV}.\nIf data-dir/--data-dir is omitted, `.fieldmark` is used.\n--demo uses a built-in in-memory backend and a fresh temp data dir.\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported).\nLog verbosity follows RUST_LOG (default {DEFAULT_LOG_FILTER})."
    );
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<Options, ()> {
    let mut options = Options::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "--api-url" => {
                if options.api_url.is_some() {
                    return Err(());
                }
                options.api_url = Some(args.next().ok_or(())?);
            }
            "--api-key" => {
                if options.api_key.is_some() {
                    return Err(());
                }
                options.api_key = Some(args.next().ok_or(())?);
            }
            "--data-dir" => {
                if options.data_dir.is_some() {
                    return Err(());
                }
                options.data_dir = Some(args.next().ok_or(())?);
            }
            "--port" => {
                if options.port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.port = Some(raw.parse().map_err(|_| ())?);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            "--retry-secs" => {
                if options.retry_secs.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.retry_secs = Some(raw.parse().map_err(|_| ())?);
            }
            "--probe-secs" => {
                if options.probe_secs.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.probe_secs = Some(raw.parse().map_err(|_| ())?);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.data_dir.is_some() {
                    return Err(());
                }
                options.data_dir = Some(arg);
            }
        }
    }

    Ok(options)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "fieldmark".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };
        let settings = match Settings::from_env(options) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("fieldmark: {err}");
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let app = Arc::new(App::from_settings(&settings)?);
            app.load().await;

            let (listener, addr) = fieldmark::server::bind(settings.port).await?;
            tracing::info!(
                %addr,
                data_dir = %settings.data_dir.display(),
                "serving fieldmark"
            );
            fieldmark::server::serve(listener, app).await?;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("fieldmark: {err}");
        std::process::exit(1);
    }
}
