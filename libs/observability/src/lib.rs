// Copyright 2025 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Logging setup for the MAP-E tools.

use std::{io::IsTerminal, path::Path};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{EnvFilter, Registry, fmt::time::UtcTime, prelude::*};

/// Environment variable to define the log level.
pub const LOG_LEVEL_ENV: &str = "RUST_LOG";

/// Output format of the stderr logger.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One bunyan formatted JSON object per line.
    Json,
}

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum SetupTracingError {
    /// A global subscriber is already installed.
    #[error("global tracing subscriber already set")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Setup logging using the tracing library.
///
/// # Arguments
///
/// * `log_dir`: If provided, logs are written to a file that carries the name of the current
///   executable in this directory.
/// * `log_to_stderr`: If Some, logs will additionally be printed to stderr in the given format.
///
/// The returned guards must be kept alive for the buffered writers to flush.
pub fn setup_tracing<P: AsRef<Path>>(
    log_dir: Option<P>,
    log_to_stderr: Option<LogFormat>,
) -> Result<Vec<WorkerGuard>, SetupTracingError> {
    let log_level =
        EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut guards = vec![];
    let mut layers = vec![JsonStorageLayer.boxed()];

    if let Some(log_dir) = log_dir {
        let log_file = tracing_appender::rolling::never(
            log_dir.as_ref(),
            format!("{}.log", extract_exec_name()),
        );
        let (non_blocking_writer, file_guard) = tracing_appender::non_blocking(log_file);
        let file_logger = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(non_blocking_writer)
            .with_filter(tracing::level_filters::LevelFilter::DEBUG);
        layers.push(file_logger.boxed());
        guards.push(file_guard);
    }

    match log_to_stderr {
        Some(LogFormat::Text) => {
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            let stderr_logger = tracing_subscriber::fmt::layer()
                // Enable colors if the stderr is a terminal.
                .with_ansi(std::io::stderr().is_terminal())
                .with_timer(UtcTime::rfc_3339())
                .with_writer(non_blocking_writer)
                .with_filter(log_level);
            layers.push(stderr_logger.boxed());
            guards.push(guard);
        }
        Some(LogFormat::Json) => {
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            let json_logger = BunyanFormattingLayer::new(extract_exec_name(), non_blocking_writer)
                .with_filter(log_level);
            layers.push(json_logger.boxed());
            guards.push(guard);
        }
        None => {}
    }

    // global subscriber
    let subscriber = Registry::default().with(layers);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!("Logging initialized!");
    Ok(guards)
}

/// Extract the name of the executable that is currently running.
fn extract_exec_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_stem()
                .and_then(|name| name.to_str())
                .map(|name| name.to_string())
        })
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_name_is_not_empty() {
        assert!(!extract_exec_name().is_empty());
    }

    #[test]
    fn test_setup_tracing_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let _guards = setup_tracing(Some(dir.path()), None).unwrap();
        tracing::info!("written to the log file");
        assert!(matches!(
            setup_tracing(None::<&Path>, Some(LogFormat::Text)),
            Err(SetupTracingError::AlreadySet(_))
        ));
    }
}
