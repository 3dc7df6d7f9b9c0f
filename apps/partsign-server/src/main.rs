//! partsign server - signing broker for direct browser-to-S3 multipart uploads.
//!
//! The browser asks this server to open a multipart session, to sign each part
//! PUT, and to finalize (or abort) the session. Part bytes never pass through
//! here; they go straight from the browser to the bucket using the returned
//! `Authorization` header.
//!
//! # Usage
//!
//! ```text
//! AWS_S3_BUCKET_NAME=media AWS_S3_ACCESS_KEY=... AWS_S3_SECRET_KEY=... partsign-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `AWS_S3_BUCKET_NAME` | `uploads` | Target bucket |
//! | `AWS_S3_REGION` | `us-east-1` | Bucket region and signing region |
//! | `AWS_S3_ACCESS_KEY` / `AWS_S3_SECRET_KEY` | *(empty)* | Signing credentials |
//! | `AWS_S3_ENDPOINT_URL` | *(unset)* | S3-compatible endpoint |
//! | `AWS_S3_PUBLIC_HOST` | *(unset)* | Host the browser PUTs parts to |
//! | `PARTSIGN_STORE` | `s3` | `s3` or `memory` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `json` for one JSON object per line |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use partsign_core::{
    MemoryObjectStore, ObjectStore, PartsignHandler, S3ObjectStore, StoreKind, SystemClock,
    UploadConfig, UploadCoordinator,
};
use partsign_http::{UploadHandler, UploadHttpConfig, UploadHttpService};

/// Server version reported in health check responses.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Build the object store selected by `PARTSIGN_STORE`.
async fn build_store(config: &UploadConfig) -> Arc<dyn ObjectStore> {
    match config.store {
        StoreKind::S3 => Arc::new(S3ObjectStore::from_config(config).await),
        StoreKind::Memory => {
            warn!("using in-memory object store; uploads are lost on restart");
            Arc::new(MemoryObjectStore::new(
                &config.credentials(),
                Arc::new(SystemClock),
            ))
        }
    }
}

/// Wire the coordinator, handler, and HTTP service together.
async fn build_service(config: &UploadConfig) -> UploadHttpService<PartsignHandler> {
    let store = build_store(config).await;
    let coordinator = UploadCoordinator::new(config, store, Arc::new(SystemClock));
    let handler = PartsignHandler::new(Arc::new(coordinator));

    let http_config = UploadHttpConfig {
        version: VERSION.to_owned(),
        ..UploadHttpConfig::default()
    };
    UploadHttpService::new(Arc::new(handler), http_config)
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<H: UploadHandler>(listener: TcpListener, service: UploadHttpService<H>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Request `/health` from a running server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    // No half-close: hyper drops half-closed HTTP/1 connections unanswered.
    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Docker HEALTHCHECK entry point.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = match UploadConfig::from_env() {
            Ok(config) => {
                let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
                run_health_check(&addr).await.is_ok()
            }
            Err(_) => false,
        };
        std::process::exit(i32::from(!healthy));
    }

    let config = UploadConfig::from_env().context("invalid configuration")?;
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    init_tracing(&config.log_level, json_logs)?;

    if config.access_key.is_empty() || config.secret_key.is_empty() {
        warn!("AWS_S3_ACCESS_KEY or AWS_S3_SECRET_KEY is empty; part signing will fail");
    }

    info!(
        gateway_listen = %config.gateway_listen,
        bucket = %config.bucket_name,
        region = %config.region,
        part_host = %config.part_host(),
        store = ?config.store,
        version = VERSION,
        "starting partsign server",
    );

    let service = build_service(&config).await;

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
