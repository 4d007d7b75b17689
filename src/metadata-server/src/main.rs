// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use gce_metadata_server::attributes::AttributeStore;
use gce_metadata_server::config::Args;
use gce_metadata_server::credentials::EnvironmentOverride;
use gce_metadata_server::issuer::TokenIssuer;
use gce_metadata_server::server::{MetadataServer, router};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    args.validate()?;
    enable_tracing()?;
    tracing::info!("Configuration: {args:?}");

    // Signing keys use the default provider when one is installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let source = args
        .credentials_builder(EnvironmentOverride::from_env())
        .build()
        .await
        .inspect_err(|e| tracing::error!("cannot initialize credentials: {e}"))?;

    let attributes = Arc::new(AttributeStore::default());
    if let Some(path) = &args.custom_attribute_file {
        attributes.load(path).await;
    }
    let issuer = TokenIssuer::new(source.clone()).with_lock_timeout(args.token_lock_timeout);
    let server = MetadataServer::new(issuer, args.identity_resolver(source), attributes);
    let app = router(Arc::new(server));

    let address = args.listen_address()?;
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Starting metadata server on {}", listener.local_addr()?);

    let shutdown = Arc::new(Notify::new());
    let notified = shutdown.clone();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { notified.notified().await })
            .into_future(),
    );
    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        result = shutdown_signal() => result?,
    }

    tracing::info!(
        "Shutting down, waiting up to {} for in-flight requests",
        humantime::format_duration(args.shutdown_grace_period)
    );
    shutdown.notify_one();
    match tokio::time::timeout(args.shutdown_grace_period, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!("in-flight requests did not finish in time");
            server.abort();
        }
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {},
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;
    Ok(())
}

fn enable_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
