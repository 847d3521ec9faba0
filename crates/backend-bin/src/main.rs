use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use larder_backend_lib::{
    auth::generate_secret,
    config::{LogFormat, Settings},
    logging,
    notify::TracingNotifier,
    router,
    scheduler::ScanScheduler,
    storage::MemoryStorage,
    AppState,
};
use tokio::net::TcpListener;

/// Larder backend server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "larder.toml")]
    config: PathBuf,

    /// Emit logs as JSON regardless of configuration
    #[arg(long)]
    json_logs: bool,

    /// Print a freshly generated signing secret and exit
    #[arg(long)]
    generate_secret: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.generate_secret {
        println!("{}", generate_secret());
        return Ok(());
    }

    let mut settings = Settings::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    if args.json_logs {
        settings.log_format = LogFormat::Json;
    }
    let secret = settings.validate().context("invalid configuration")?;

    logging::init_logging(&settings.log_level, settings.log_format)
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    let storage = Arc::new(MemoryStorage::new());
    let notifier = Arc::new(TracingNotifier);

    let scheduler = settings.scan.enabled.then(|| {
        Arc::new(ScanScheduler::new(
            storage.clone(),
            storage.clone(),
            notifier.clone(),
            &settings.scan,
        ))
        .start()
    });
    if scheduler.is_none() {
        tracing::info!("expiry scans disabled");
    }

    let bind_addr = settings.bind_addr;
    let state = AppState::new(storage, settings, &secret, notifier)
        .context("failed to build application state")?;
    let app = router::create_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
