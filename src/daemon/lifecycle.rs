//! Daemon Lifecycle Management
//!
//! Handles daemon startup and ordered shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::{prepare_data_dir, Config};
use crate::pipeline::Pipeline;
use crate::query::QueryEngine;

use super::http::{AppState, HttpServer};

/// How long the HTTP server gets to finish in-flight requests
const HTTP_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Daemon instance managing all components
pub struct Daemon {
    config: Config,
    data_dir: PathBuf,
    pipeline: Arc<Pipeline>,
    query: QueryEngine,
    shutdown_tx: broadcast::Sender<()>,
}

impl Daemon {
    /// Prepare the data directory, start the pipeline with every format
    /// enabled and open the query engine.
    pub async fn start(config: Config, data_dir: &Path) -> Result<Self> {
        info!("Starting hlte daemon v{}", env!("CARGO_PKG_VERSION"));

        let data_dir = prepare_data_dir(data_dir)?;
        info!("Using local data path '{}'", data_dir.display());

        let pipeline = Arc::new(Pipeline::start(&config.pipeline, data_dir.clone()));
        pipeline
            .enable_all()
            .await
            .context("Pipeline closed during startup")?;

        let query = QueryEngine::open(&data_dir)
            .await
            .context("Failed to open query engine")?;

        let (shutdown_tx, _) = broadcast::channel(16);

        info!("Daemon initialized");
        Ok(Self {
            config,
            data_dir,
            pipeline,
            query,
            shutdown_tx,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn pipeline(&self) -> Arc<Pipeline> {
        self.pipeline.clone()
    }

    /// Handle that stops [`Daemon::run`] when sent to
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Serve HTTP until Ctrl+C, SIGTERM or an explicit shutdown, then shut
    /// down in order.
    pub async fn run(&self) -> Result<()> {
        info!("Daemon running");

        let shutdown_rx = self.shutdown_tx.subscribe();

        let http_server = HttpServer::new(
            self.config.http.clone(),
            self.config.auth.clone(),
            AppState {
                pipeline: self.pipeline.clone(),
                query: self.query.clone(),
            },
        );
        let shutdown_rx_http = self.shutdown_tx.subscribe();
        let mut http_handle = tokio::spawn(async move { http_server.run(shutdown_rx_http).await });

        let http_result = tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                None
            }
            _ = Self::wait_for_sigterm() => {
                info!("Received SIGTERM, shutting down");
                None
            }
            _ = Self::wait_for_shutdown(shutdown_rx) => {
                info!("Shutdown requested");
                None
            }
            result = &mut http_handle => Some(result),
        };

        let _ = self.shutdown_tx.send(());

        // Stop taking requests before draining the pipeline
        let http_result = match http_result {
            Some(result) => Some(result),
            None => match tokio::time::timeout(HTTP_SHUTDOWN_TIMEOUT, &mut http_handle).await {
                Ok(result) => Some(result),
                Err(_) => {
                    warn!(
                        "HTTP server did not shut down within {:?}, aborting",
                        HTTP_SHUTDOWN_TIMEOUT
                    );
                    http_handle.abort();
                    None
                }
            },
        };

        self.shutdown().await;

        match http_result {
            Some(Ok(Ok(()))) | None => Ok(()),
            Some(Ok(Err(e))) => Err(e),
            Some(Err(e)) => Err(e).context("HTTP server task panicked"),
        }
    }

    /// Drain the pipeline and close the query engine
    pub async fn shutdown(&self) {
        info!("Shutting down daemon");

        for (format, stats) in self.pipeline.shutdown().await {
            if stats.failed > 0 {
                error!(
                    "Format '{}' stopped with {} failed writes ({} written)",
                    format, stats.failed, stats.written
                );
            } else {
                info!("Format '{}' stopped ({} written)", format, stats.written);
            }
        }

        self.query.close().await;
        info!("Daemon shutdown complete");
    }

    /// Wait for SIGTERM signal
    #[cfg(unix)]
    async fn wait_for_sigterm() {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}. Falling back to pending future.", e);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    async fn wait_for_sigterm() {
        std::future::pending::<()>().await
    }

    async fn wait_for_shutdown(mut rx: broadcast::Receiver<()>) {
        let _ = rx.recv().await;
    }
}
