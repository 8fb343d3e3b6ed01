//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port against a temporary SQLite
//! database, so endpoint tests talk to the server over HTTP exactly as the
//! pipeline's cache client does.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use covershelf_server::{config::AppConfig, router, state::build_app_state};
use reqwest::Client;
use std::{net::SocketAddr, path::PathBuf};
use tempfile::NamedTempFile;
use tokio::{net::TcpListener, task::JoinHandle};

// --- Full Application Test Harness ---

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub db_path: PathBuf,
    _db_file: NamedTempFile,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        // `try_init` is used to prevent panic if the logger is already initialized.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_path_buf();

        let config = AppConfig {
            port: 0,
            db_url: db_path.to_string_lossy().to_string(),
        };
        let app_state = build_app_state(&config).await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        // Give the server a moment to start up.
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            db_path,
            _db_file: db_file,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
