//! ST7735R panel daemon for Raspberry Pi
//!
//! Probes the panel on SPI, shows an image (or colour bars) and keeps the
//! frame pump running until SIGINT/SIGTERM. Runs as a systemd service.

use clap::Parser;
use st7735r_dbi::config::{Config, DEFAULT_CONFIG_PATH};
use st7735r_dbi::{DisplayController, Framebuffer, PixelFormat, VsyncScheduler, hw, image_proc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "st7735r-dbi")]
#[command(about = "ST7735R SPI panel daemon for Raspberry Pi")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Image to display (overrides config)
    #[arg(short, long)]
    image: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show colour bars for a few seconds and exit
    #[arg(long)]
    test: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    tracing::info!("Starting ST7735R panel daemon");

    let config = Config::load(&args.config).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from {}: {}", args.config, e);
        tracing::info!("Using default configuration");
        Config::default()
    });

    let device = hw::open(&config)?;
    let controller = DisplayController::new(Arc::new(device));

    let (width, height) = controller.size();
    let fb = Arc::new(Framebuffer::new(
        width as u32,
        height as u32,
        PixelFormat::Xrgb8888,
    ));

    match args.image.as_ref().or(config.image_path.as_ref()) {
        Some(path) if !args.test => {
            if let Err(e) = image_proc::render_image(path, &fb) {
                tracing::warn!("{}; showing test pattern", e);
                image_proc::test_pattern(&fb);
            }
        }
        _ => image_proc::test_pattern(&fb),
    }

    controller.enable(fb).await?;

    if args.test {
        tokio::time::sleep(Duration::from_secs(5)).await;
        controller.remove().await?;
        tracing::info!("Test pattern complete");
        return Ok(());
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let scheduler = VsyncScheduler::new(controller.clone());
    let scheduler_shutdown = shutdown_tx.subscribe();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_shutdown).await;
    });

    wait_for_shutdown().await;
    tracing::info!("Shutdown signal received");

    let _ = shutdown_tx.send(());

    tokio::select! {
        _ = scheduler_handle => {},
        _ = tokio::time::sleep(Duration::from_secs(5)) => {
            tracing::warn!("Scheduler shutdown timeout");
        }
    }

    controller.remove().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
///
/// Default level is "warn" to minimize SD card wear from log writes.
/// Use --verbose flag for "debug" level during development/troubleshooting.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("st7735r_dbi={}", level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
async fn wait_for_shutdown() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT");
        }
    }
}
