use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use sk_domain::Settings;
use sk_kicker::cli::Cli;
use sk_kicker::service::Service;
use sk_syncthing::{ClientOptions, RestSyncthingClient, SyncthingApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Best-effort .env loading; never overrides the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to load settings");
            std::process::exit(1);
        }
    };
    let tz_label = settings
        .cron_timezone
        .map(|tz| tz.to_string())
        .unwrap_or_else(|| "UTC".into());
    tracing::info!(
        api_url = %settings.api_url,
        dry_run = settings.dry_run,
        timezone = %tz_label,
        "settings loaded"
    );

    let client = RestSyncthingClient::new(
        &settings.api_url,
        &settings.api_key,
        ClientOptions {
            verify_tls: settings.verify_tls,
            request_timeout: settings.request_timeout,
        },
    )?;
    let api: Arc<dyn SyncthingApi> = Arc::new(client);
    let service = Arc::new(Service::new(settings, api));

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    if cli.check {
        if let Err(e) = service.check_once(&shutdown).await {
            tracing::error!(error = %e, "status check failed");
            std::process::exit(1);
        }
        return Ok(());
    }

    service.run(shutdown).await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sk_kicker=debug")),
        )
        .init();
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("termination signal received");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
