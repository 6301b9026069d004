pub mod config;
pub mod directory;
pub mod err;
pub mod io;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use crate::config::Config;
use crate::directory::{StudentDirectory, SystemClock};
use crate::err::{Error, Fine, Maybe, Nothing};
use crate::store::SharedDirectory;

pub type Payload<T> = Result<Maybe<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V> where V: Serialize {
    Ok(Fine(value))
}

pub fn breaks<V>(err: Error) -> Payload<V> where V: Serialize {
    Ok(Nothing(err))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    let directory = match config.snapshot_path() {
        Some(path) => SharedDirectory::open(path, Arc::new(SystemClock)).await?,
        None => {
            log::warn!("Running ephemeral, records will not outlive this process");
            SharedDirectory::in_memory(StudentDirectory::new())
        }
    };
    if let Some(path) = directory.snapshot_path() {
        log::info!(
            "Persisting {} student(s) to {}",
            directory.len().await,
            path.display()
        );
    }
    let app = routes::router(directory);

    log::info!("Starting student directory HTTP server on http://{}", config.bind_addr);
    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
