use anyhow::Result;
use disks_poweroff::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let mut args = std::env::args();
    let prog = args.next().unwrap_or_else(|| version::NAME.into());
    let Some(config_path) = args.next() else {
        eprintln!("Usage: {prog} config_path");
        std::process::exit(1);
    };

    tracing::info!(
        version = version::VERSION,
        config = %config_path,
        "Starting disks-poweroff"
    );

    let config = config::Config::load(std::path::Path::new(&config_path));
    let daemon = daemon::Daemon::new(&config, Box::new(power::HdparmPower))?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut daemon_handle = tokio::spawn(daemon.run(shutdown_rx));

    tokio::select! {
        result = &mut daemon_handle => {
            result.map_err(|e| anyhow::anyhow!("daemon task join: {e}"))??;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = daemon_handle.await;
        }
    }

    Ok(())
}
