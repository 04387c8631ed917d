// src/logging.rs

//! Native log output
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` (`RUST_LOG` wins
//! over the configured level), a console layer in the configured format and
//! an optional daily-rolling file.

use std::path::Path;

use async_trait::async_trait;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};
use uuid::Uuid;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result, ResultExt};
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Owns the subscriber configuration and the file writer guard
#[derive(Debug)]
pub struct LoggingManager {
    state: ManagedState,
    config: LoggingConfig,
    installed: bool,
    _guards: Vec<WorkerGuard>,
}

impl LoggingManager {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            state: ManagedState::new(Uuid::new_v4(), "logging_manager"),
            config,
            installed: false,
            _guards: Vec::new(),
        }
    }

    /// `RUST_LOG` if set, otherwise the configured level.
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.config.level))
    }

    fn format_layer<W>(&self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer().with_writer(writer).with_ansi(ansi).with_target(true);
        match self.config.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }

    fn setup_tracing(&mut self) -> Result<()> {
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if self.config.console {
            layers.push(self.format_layer(std::io::stderr, true));
        }

        if let Some(file_config) = self.config.file.clone() {
            let file_appender =
                tracing_appender::rolling::daily(&file_config.directory, &file_config.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            self._guards.push(guard);
            layers.push(self.format_layer(non_blocking, false));
        }

        // A subscriber may already be installed (tests, embedding hosts).
        match Registry::default()
            .with(layers)
            .with(self.filter())
            .try_init()
        {
            Ok(()) => self.installed = true,
            Err(e) => {
                tracing::debug!("global subscriber already set: {}", e);
            }
        }

        Ok(())
    }

    fn ensure_log_dir(dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))
    }
}

#[async_trait]
impl Manager for LoggingManager {
    fn name(&self) -> &str {
        "logging_manager"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;

        if let Some(file_config) = &self.config.file {
            Self::ensure_log_dir(&file_config.directory)?;
        }

        if let Err(e) = self.setup_tracing() {
            self.state.set_state(ManagerState::Error).await;
            return Err(Error::config(format!("Failed to set up logging: {}", e)).caused_by(e));
        }

        self.state.set_state(ManagerState::Running).await;
        tracing::info!(level = %self.config.level, "logging initialized");
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down logging");
        // Dropping the guards flushes the non-blocking file writer.
        self._guards.clear();
        self.state.set_state(ManagerState::Shutdown).await;
        Ok(())
    }

    async fn status(&self) -> ManagerStatus {
        let mut status = self.state.status().await;
        status.add_metadata("file_logging", serde_json::Value::Bool(self.config.file.is_some()));
        status.add_metadata("console_logging", serde_json::Value::Bool(self.config.console));
        status.add_metadata("log_level", serde_json::Value::String(self.config.level.clone()));
        status.add_metadata("subscriber_installed", serde_json::Value::Bool(self.installed));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileLogConfig;

    #[tokio::test]
    async fn test_logging_manager_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
            console: false,
            file: Some(FileLogConfig {
                directory: log_dir.clone(),
                file_prefix: "test".to_string(),
            }),
        };
        let mut manager = LoggingManager::new(config);

        manager.initialize().await.unwrap();
        assert!(log_dir.is_dir());

        let status = manager.status().await;
        assert_eq!(status.state, ManagerState::Running);
        assert_eq!(status.metadata["log_level"], "debug");

        manager.shutdown().await.unwrap();
        assert_eq!(manager.status().await.state, ManagerState::Shutdown);
    }
}
