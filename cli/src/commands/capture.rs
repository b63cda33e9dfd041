use batlog_platform::{find_battery, SysfsSource};
use color_eyre::eyre::Result;
use tracing::{error, info, warn};

use crate::config::SamplerConfig;
use crate::sampler::Sampler;

pub fn run(config: SamplerConfig) -> Result<()> {
    println!("Verbose {}", config.verbose);
    println!("Time    {} sec", config.interval.as_secs());
    println!("Output  {}", config.output.display());
    println!("Format  {}", config.format.label());

    hint_battery_name(&config);

    println!("Capture start.");
    info!(
        charger = %config.charger,
        battery = %config.battery,
        interval_secs = config.interval.as_secs(),
        "Capture started"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let sampler = Sampler::new(&config, SysfsSource::new());
    let sampler = runtime.block_on(sampler.run(config.interval, shutdown_signal()));

    let stats = sampler.stats();
    info!(
        iterations = stats.iterations,
        recorded = stats.recorded,
        failed = stats.failed,
        "Capture stopped"
    );

    Ok(())
}

/// Warn early when the capacity file is missing and point at a device that has one.
fn hint_battery_name(config: &SamplerConfig) {
    if config.paths.capacity.exists() {
        return;
    }

    match find_battery(&config.root) {
        Some(found) if found.name != config.battery => {
            warn!(
                path = ?config.paths.capacity,
                suggestion = %found.name,
                "Capacity source not found, try -b {}",
                found.name
            );
        }
        _ => {
            warn!(path = ?config.paths.capacity, "Capacity source not found");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
