use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::domain::LanguageTable;
use crate::core::pipeline::orchestrator::Orchestrator;
use crate::core::pipeline::telemetry::TelemetryLogger;
use crate::core::pipeline::workspace::WorkspaceManager;
use crate::core::traits::launcher::Launcher;
use crate::core::traits::telemetry::TelemetryStore;
use crate::native::docker::DockerLauncher;
use crate::native::fixtures::FsFixtureSource;
use crate::native::telemetry::{JsonLinesTelemetryStore, MemoryTelemetryStore};
use crate::stubs::launcher::LauncherStub;

mod config;
mod constants;
mod core;
mod http;
mod native;
mod stubs;

#[tokio::main]
#[tracing::instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let config = Config::parse();
    tracing::debug!("Loaded config: {:?}", config);

    let store: Arc<dyn TelemetryStore> = match &config.telemetry_log {
        Some(path) => Arc::new(JsonLinesTelemetryStore::new(path)),
        None => Arc::new(MemoryTelemetryStore::new()),
    };

    let launcher: Arc<dyn Launcher> = if config.dry_run {
        tracing::warn!("Dry run: submitted code is echoed back, no containers are started");
        Arc::new(LauncherStub::echo(Duration::ZERO))
    } else {
        Arc::new(
            DockerLauncher::new(&config.docker)
                .with_echo(!config.no_echo)
                .with_timeout(config.timeout()),
        )
    };

    let orchestrator = Orchestrator::new(
        WorkspaceManager::new(config.workspace_root(), LanguageTable::default()),
        config.image_prefix.clone(),
        launcher,
        TelemetryLogger::new(store),
        Arc::new(FsFixtureSource::new(&config.fixture_root)),
    );

    let listener = TcpListener::bind(config.listen).await?;
    tracing::info!("HTTP server listening on {}", config.listen);
    axum::serve(listener, http::routes::router(Arc::new(orchestrator))).await?;

    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
