// SPDX-License-Identifier: GPL-3.0-only

//! Multibook harness
//!
//! Drives the embedded document from a host process. Each stdin line is a
//! JSON [`HarnessInput`]; every message the document posts to its host is
//! written to stdout as one JSON line, as are requested snapshots.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use futures::{FutureExt, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use multibook::app::{Application, HarnessInput};
use multibook::app_settings;
use multibook::bridge::TextRegion;
use multibook::channel::{MessageEnvelope, QueueChannel};
use multibook::config::{Config, ConfigError};
use multibook::i18n;

/// Environment variable naming a config file when no argument is given.
const CONFIG_ENV: &str = "MULTIBOOK_CONFIG";

#[derive(Debug)]
enum HarnessError {
    Config(ConfigError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Config(e) => write!(f, "configuration error: {}", e),
            HarnessError::Io(e) => write!(f, "I/O error: {}", e),
            HarnessError::Json(e) => write!(f, "failed to encode output: {}", e),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Config(e) => Some(e),
            HarnessError::Io(e) => Some(e),
            HarnessError::Json(e) => Some(e),
        }
    }
}

impl From<ConfigError> for HarnessError {
    fn from(e: ConfigError) -> Self {
        HarnessError::Config(e)
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(e: std::io::Error) -> Self {
        HarnessError::Io(e)
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(e: serde_json::Error) -> Self {
        HarnessError::Json(e)
    }
}

fn load_config() -> Result<Config, HarnessError> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    match path {
        Some(path) => {
            tracing::info!("loading configuration from {}", path.display());
            Ok(Config::load(path)?)
        }
        None => Ok(Config::default()),
    }
}

async fn write_line<W>(out: &mut W, line: &str) -> Result<(), HarnessError>
where
    W: AsyncWriteExt + Unpin,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

async fn write_envelope<W>(out: &mut W, envelope: &MessageEnvelope) -> Result<(), HarnessError>
where
    W: AsyncWriteExt + Unpin,
{
    write_line(out, &serde_json::to_string(envelope)?).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), HarnessError> {
    // Logs go to stderr, stdout carries the message stream
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("multibook=info")),
        )
        .init();

    let config = load_config()?;
    i18n::select_locale(config.locale.as_deref().unwrap_or(app_settings::DEFAULT_LOCALE));

    let (channel, mut outbound) = QueueChannel::new();
    let app = Application::start(channel, &config, Some(TextRegion::new("")));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    // The ready announcement
    while let Some(Some(envelope)) = outbound.next().now_or_never() {
        write_envelope(&mut stdout, &envelope).await?;
    }

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let snapshot = match serde_json::from_str::<HarnessInput>(line) {
            Ok(input) => app.apply(input, Instant::now()),
            Err(e) => {
                tracing::warn!("skipping invalid input line: {}", e);
                None
            }
        };

        // Everything posted while handling this line goes out before the snapshot
        while let Some(Some(envelope)) = outbound.next().now_or_never() {
            write_envelope(&mut stdout, &envelope).await?;
        }
        if let Some(snapshot) = snapshot {
            write_line(&mut stdout, &serde_json::to_string(&snapshot)?).await?;
        }
    }

    tracing::info!("input closed, shutting down");
    Ok(())
}
