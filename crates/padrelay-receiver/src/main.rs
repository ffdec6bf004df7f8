//! padrelay receiver entry point.
//!
//! Connects to a sender and replays every relayed press and release on this
//! machine.
//!
//! # Usage
//!
//! ```text
//! padrelay-receiver [OPTIONS]
//!
//! Options:
//!   --config <PATH>           Config file [default: platform config dir]
//!   --address <HOST>          Sender address [default: from config, 127.0.0.1]
//!   --port <PORT>             Sender port [default: from config, 8765]
//!   --injector <log|keyboard> Injector backend [default: from config, log]
//!   --reconnect-secs <SECS>   Reconnect delay, 0 to exit on disconnect
//!                             [default: from config, 0]
//! ```
//!
//! Every option can also be set with the matching `PADRELAY_*` environment
//! variable.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use padrelay_receiver::application::receive_state::{InputInjector, ReceiveStateUseCase};
use padrelay_receiver::infrastructure::injection::{
    log::LogInjector, platform_keyboard, KeyBindings,
};
use padrelay_receiver::infrastructure::network::{run_connection, ClientNetworkError};
use padrelay_receiver::infrastructure::storage::config::{
    default_config_path, load_config, InjectorKind, ReceiverConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "padrelay-receiver",
    about = "Replays relayed input state changes as local key presses",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "PADRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Host or IP address of the sender.
    #[arg(long, env = "PADRELAY_ADDRESS")]
    address: Option<String>,

    /// TCP port of the sender.
    #[arg(long, env = "PADRELAY_PORT")]
    port: Option<u16>,

    /// How received events are replayed.
    #[arg(long, env = "PADRELAY_INJECTOR", value_enum)]
    injector: Option<InjectorKind>,

    /// Seconds to wait before reconnecting after a disconnect (0 = exit).
    #[arg(long, env = "PADRELAY_RECONNECT_SECS")]
    reconnect_secs: Option<u64>,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    fn apply_to(&self, config: &mut ReceiverConfig) {
        if let Some(address) = &self.address {
            config.network.address = address.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(injector) = self.injector {
            config.receiver.injector = injector;
        }
        if let Some(secs) = self.reconnect_secs {
            config.receiver.reconnect_secs = secs;
        }
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(default_config_path()?),
        }
    }
}

fn build_injector(config: &ReceiverConfig) -> anyhow::Result<Box<dyn InputInjector>> {
    match config.receiver.injector {
        InjectorKind::Log => Ok(Box::new(LogInjector::new())),
        InjectorKind::Keyboard => {
            let layout = config.layout()?;
            let bindings = KeyBindings::new(&layout, |signal| config.key_for(signal.as_str()))
                .context("invalid key bindings in [[signals]]: every signal needs its own `key`")?;
            platform_keyboard(bindings).context("failed to open keyboard backend")
        }
    }
}

/// Waits up to `delay`, returning early once `running` is cleared.
async fn wait_for_reconnect(delay: Duration, running: &AtomicBool) {
    const STEP: Duration = Duration::from_millis(200);
    let mut waited = Duration::ZERO;
    while waited < delay && running.load(Ordering::Relaxed) {
        let step = STEP.min(delay - waited);
        tokio::time::sleep(step).await;
        waited += step;
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config_path()?;
    let mut config = load_config(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    cli.apply_to(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let layout = config.layout().context("invalid [[signals]] table")?;
    let injector = build_injector(&config)?;
    let mut use_case = ReceiveStateUseCase::new(layout, injector);
    let url = config.url();

    info!(
        "padrelay receiver starting: {url}, injector {:?}, signals [{}]",
        config.receiver.injector,
        use_case.layout().names().join(", ")
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

    loop {
        match run_connection(&url, &mut use_case, &running).await {
            Ok(_) => {}
            Err(e @ ClientNetworkError::Receive(_)) => {
                // A mismatched sender will not fix itself by reconnecting.
                return Err(e).context("sender rejected");
            }
            Err(e) => error!("{e}"),
        }

        let Some(delay) = config.reconnect_delay() else {
            break;
        };
        if !running.load(Ordering::Relaxed) {
            break;
        }
        info!("reconnecting in {} s", delay.as_secs());
        wait_for_reconnect(delay, &running).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
    }

    info!("padrelay receiver stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
