//! walletview daemon: entry point for following a wallet service.

mod sink;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use walletview_rpc::{HttpTransport, WalletClient};
use walletview_sync::{ShutdownController, SyncConfig, SyncDriver};
use walletview_utils::{LogFormat, SystemClock};

use crate::sink::{OutputFormat, Sink};

#[derive(Parser)]
#[command(name = "walletview", about = "Follow a wallet service and print its reconciled state")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "WALLETVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Wallet service host.
    #[arg(long, env = "WALLETVIEW_RPC_HOST")]
    rpc_host: Option<String>,

    /// Wallet service JSON-RPC port.
    #[arg(long, env = "WALLETVIEW_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Wallet service RPC password.
    #[arg(long, env = "WALLETVIEW_RPC_PASSWORD", hide_env_values = true)]
    rpc_password: Option<String>,

    /// Seconds to sleep between refresh cycles.
    #[arg(long, env = "WALLETVIEW_REFRESH_INTERVAL")]
    refresh_interval: Option<u64>,

    /// Deadline in seconds for each RPC call.
    #[arg(long, env = "WALLETVIEW_CALL_TIMEOUT")]
    call_timeout: Option<u64>,

    /// IANA time zone for displayed times (e.g. "Europe/Berlin").
    #[arg(long, env = "WALLETVIEW_TIMEZONE")]
    timezone: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "WALLETVIEW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "WALLETVIEW_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// How view models are written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "WALLETVIEW_OUTPUT")]
    output: OutputFormat,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Refresh continuously until interrupted.
    Run,
    /// Run a single refresh cycle and exit.
    Once,
}

fn load_config(cli: &Cli) -> anyhow::Result<SyncConfig> {
    let base = match &cli.config {
        Some(path) => SyncConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SyncConfig::default(),
    };

    let config = SyncConfig {
        rpc_host: cli.rpc_host.clone().unwrap_or(base.rpc_host),
        rpc_port: cli.rpc_port.unwrap_or(base.rpc_port),
        rpc_password: cli.rpc_password.clone().or(base.rpc_password),
        refresh_interval_secs: cli.refresh_interval.unwrap_or(base.refresh_interval_secs),
        call_timeout_secs: cli.call_timeout.unwrap_or(base.call_timeout_secs),
        timezone: cli.timezone.clone().or(base.timezone),
        log_level: cli.log_level.clone().unwrap_or(base.log_level),
        log_format: cli.log_format.unwrap_or(base.log_format),
        ..base
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    walletview_utils::init_logging(config.log_format, &config.log_level)
        .map_err(anyhow::Error::msg)?;

    let transport = HttpTransport::new(
        &config.rpc_host,
        config.rpc_port,
        config.rpc_password.clone(),
        config.call_timeout(),
    )?;
    tracing::info!(
        url = transport.url(),
        interval_secs = config.refresh_interval_secs,
        "connecting to wallet service"
    );
    let mut driver = SyncDriver::new(WalletClient::new(transport), SystemClock, &config)?;
    let mut sink = Sink::new(cli.output);

    match cli.command {
        Command::Once => {
            let update = driver.run_cycle().await?;
            sink.present(&update)?;
        }
        Command::Run => {
            let (handle, mut updates) = driver.spawn();
            let signals = ShutdownController::new();
            let interrupted = signals.wait_for_signal();
            tokio::pin!(interrupted);

            loop {
                tokio::select! {
                    _ = &mut interrupted => break,
                    update = updates.recv() => match update {
                        Some(update) => sink.present(&update)?,
                        None => break,
                    },
                }
            }

            tracing::info!("stopping sync driver");
            handle.shutdown().await?;
            tracing::info!("walletview exited cleanly");
        }
    }

    Ok(())
}
