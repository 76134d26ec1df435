// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_FILE_PREFIX: &str = "tabula.log";

/// Keeps the background log writer alive. Dropping it flushes pending lines.
pub struct LogHandle {
    _guard: WorkerGuard,
}

/// Installs a daily-rolling file subscriber. The terminal belongs to the TUI,
/// so nothing is written to stdout or stderr. `RUST_LOG` overrides `level`.
pub fn init(dir: &Path, level: &str) -> Result<LogHandle> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create log directory {}; set [log].dir", dir.display()))?;

    let filter = build_filter(level)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    tracing::info!(log_dir = %dir.display(), level, "logging initialised");
    Ok(LogHandle { _guard: guard })
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = ["tabula", "tabula_app", "tabula_client", "tabula_tui", "tabula_testkit"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(format!("warn,{directives}"))
        .with_context(|| format!("invalid log level {level:?}"))
}
