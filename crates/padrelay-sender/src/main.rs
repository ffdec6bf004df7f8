//! padrelay sender entry point.
//!
//! Samples an input device once per tick and serves its state changes to any
//! receiver that connects over WebSocket.
//!
//! # Usage
//!
//! ```text
//! padrelay-sender [OPTIONS]
//!
//! Options:
//!   --config <PATH>     Config file [default: platform config dir]
//!   --address <HOST>    Address to bind [default: from config, 127.0.0.1]
//!   --port <PORT>       Port to bind [default: from config, 8765]
//!   --tick-ms <MS>      Sampling interval [default: from config, 100]
//!   --device <INDEX>    Input device index [default: from config, 0]
//!   --list-devices      Print the input devices and exit
//!   --demo              Replay a built-in press/release script instead of
//!                       reading a device
//! ```
//!
//! Every option can also be set with the matching `PADRELAY_*` environment
//! variable (`PADRELAY_PORT`, `PADRELAY_TICK_MS`, ...).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use padrelay_sender::infrastructure::network::{run_server, ServerConfig};
use padrelay_sender::infrastructure::sampler::{
    self, mock::demo_script, mock::ScriptedSamplerFactory, ButtonMap, SamplerFactory,
};
use padrelay_sender::infrastructure::storage::config::{default_config_path, load_config, SenderConfig};

/// Ticks each signal stays pressed in `--demo` mode.
const DEMO_HOLD_TICKS: usize = 5;

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "padrelay-sender",
    about = "Streams input device state changes to padrelay receivers",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "PADRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Host name or IP address for the WebSocket server to bind to.
    #[arg(long, env = "PADRELAY_ADDRESS")]
    address: Option<String>,

    /// TCP port for the WebSocket server.
    #[arg(long, env = "PADRELAY_PORT")]
    port: Option<u16>,

    /// Milliseconds between two device samples.
    #[arg(long, env = "PADRELAY_TICK_MS", value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: Option<u64>,

    /// Index of the input device to sample (see --list-devices).
    #[arg(long, env = "PADRELAY_DEVICE")]
    device: Option<usize>,

    /// Print the available input devices and exit.
    #[arg(long)]
    list_devices: bool,

    /// Replay a built-in script instead of reading a device.
    #[arg(long)]
    demo: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    fn apply_to(&self, config: &mut SenderConfig) {
        if let Some(address) = &self.address {
            config.network.address = address.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.sampler.tick_interval_ms = tick_ms;
        }
        if let Some(device) = self.device {
            config.sampler.device_index = device;
        }
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(default_config_path()?),
        }
    }
}

/// Resolves `[network]` to a socket address, taking the first result so that
/// host names such as `localhost` work as well as IP literals.
async fn bind_addr(config: &SenderConfig) -> anyhow::Result<SocketAddr> {
    let host = config.network.address.as_str();
    let port = config.network.port;
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("cannot resolve bind address '{host}:{port}'"))?
        .next()
        .with_context(|| format!("bind address '{host}:{port}' resolved to nothing"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config_path()?;
    let mut config = load_config(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    cli.apply_to(&mut config);
    config.validate()?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if cli.list_devices {
        let devices = sampler::list_devices();
        if devices.is_empty() {
            info!("no input devices found");
        }
        for device in devices {
            info!("{device}");
        }
        return Ok(());
    }

    let layout = config.layout().context("invalid [[signals]] table")?;

    let factory: Arc<dyn SamplerFactory> = if cli.demo {
        info!("demo mode: replaying a scripted press/release cycle");
        Arc::new(ScriptedSamplerFactory::new(layout.clone(), demo_script(&layout, DEMO_HOLD_TICKS)).looping())
    } else {
        let buttons = ButtonMap::new(&layout, |signal| config.button_for(signal.as_str()))
            .context("every signal needs a `button` code")?;
        sampler::device_factory(config.sampler.device_index, layout.clone(), buttons)
            .context("failed to select input device")?
    };

    let server_config = ServerConfig {
        bind_addr: bind_addr(&config).await?,
        tick_interval: config.tick_interval(),
        layout,
    };

    info!(
        "padrelay sender starting: ws://{}, tick {} ms, signals [{}]",
        server_config.bind_addr,
        config.sampler.tick_interval_ms,
        server_config.layout.names().join(", ")
    );

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => warn!("failed to listen for Ctrl+C: {e}"),
        }
    });

    // Returns once every session has closed its socket.
    run_server(server_config, factory, Arc::clone(&running)).await?;
    info!("padrelay sender stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
