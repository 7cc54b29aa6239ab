//! Minebank daemon: runs the accrual service and exposes its controls.

use anyhow::Context;
use clap::Parser;
use minebank_accrual::CreditTarget;
use minebank_service::{AccrualEvent, AccrualService, ServiceConfig, ServiceStatus};
use minebank_types::{AccrualParams, Amount, Unit};
use minebank_utils::{format_duration, init_logging, LogFormat};
use std::path::PathBuf;
use tokio::sync::broadcast;

#[derive(Parser)]
#[command(name = "minebank-daemon", about = "Mining balance accrual daemon")]
struct Cli {
    /// Data directory for the accrual store.
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "MINEBANK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Seconds between scheduler checks.
    #[arg(long, env = "MINEBANK_TICK_CADENCE_SECS")]
    tick_cadence_secs: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MINEBANK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MINEBANK_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "MINEBANK_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the accrual scheduler until SIGINT/SIGTERM.
    Run,
    /// Print balances, routing and time to the next accrual as JSON.
    Status,
    /// Turn accrual on.
    Enable,
    /// Turn accrual off.
    Disable,
    /// Change the unit that receives converted accrual.
    SetTarget {
        /// Ticker symbol, e.g. BTC or eth.
        symbol: String,
    },
    /// Route accrual to the target unit ("on") or the flat balance ("off").
    AutoCredit {
        #[arg(value_parser = parse_toggle)]
        state: bool,
        /// Also change the target unit.
        #[arg(long)]
        unit: Option<Unit>,
    },
    /// Change the amount accrued per 5-minute interval.
    SetRate { rate: Amount },
    /// Set the mining payout address.
    SetWallet { address: String },
    /// Overwrite one unit's address and/or balance.
    SetUnitWallet {
        unit: Unit,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        balance: Option<Amount>,
    },
    /// Apply any whole intervals due now.
    Tick,
    /// Wipe the store and restore defaults.
    Reset {
        /// Required; the wipe cannot be undone.
        #[arg(long)]
        yes: bool,
    },
}

fn parse_toggle(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on/off, got {other:?}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = cli.config.as_ref().map(|path| {
        ServiceConfig::from_toml_file(path).map_err(|e| (path.clone(), e))
    });

    let mut config = match &file_config {
        Some(Ok(cfg)) => cfg.clone(),
        _ => ServiceConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(cadence) = cli.tick_cadence_secs {
        config.tick_cadence_secs = cadence;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    init_logging(config.log_format, &config.log_level)
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))?;

    match file_config {
        Some(Ok(_)) => {
            if let Some(path) = &cli.config {
                tracing::info!("Loaded config from {}", path.display());
            }
        }
        Some(Err((path, e))) => {
            tracing::warn!("Failed to load config file {}: {e}, using CLI defaults", path.display());
        }
        None => {}
    }
    config.validate()?;

    let mut service = AccrualService::open(&config, AccrualParams::default())
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;

    match cli.command {
        Command::Run => {
            tracing::info!(
                data_dir = %config.data_dir.display(),
                cadence_secs = config.tick_cadence_secs,
                "Starting minebank accrual service"
            );
            let reporter = tokio::spawn(report_events(service.subscribe()));
            service.start()?;

            service.shutdown_controller().wait_for_signal().await;
            tracing::info!("Shutdown signal received, stopping accrual service");
            service.stop().await?;
            reporter.abort();

            tracing::info!("minebank daemon exited cleanly");
        }
        Command::Status => {
            let status = service.status().await?;
            println!("{}", serde_json::to_string_pretty(&status_json(&status))?);
        }
        Command::Enable => service.set_enabled(true).await?,
        Command::Disable => service.set_enabled(false).await?,
        Command::SetTarget { symbol } => {
            let unit = service.set_target_unit(&symbol).await?;
            println!("target unit set to {} ({})", unit, unit.name());
        }
        Command::AutoCredit { state, unit } => service.set_auto_credit(state, unit).await?,
        Command::SetRate { rate } => service.set_rate(rate).await?,
        Command::SetWallet { address } => service.set_wallet_address(address).await?,
        Command::SetUnitWallet {
            unit,
            address,
            balance,
        } => {
            if address.is_none() && balance.is_none() {
                anyhow::bail!("nothing to update: pass --address and/or --balance");
            }
            let entry = service.update_unit_wallet(unit, address, balance).await?;
            println!("{unit}: {} (address {:?})", entry.balance, entry.address);
        }
        Command::Tick => {
            let result = service.tick_now().await?;
            match result.accrual() {
                Some(accrual) => println!(
                    "credited {} intervals: +{} to {} (total {})",
                    accrual.intervals, accrual.credited_amount, accrual.credited_to, accrual.new_balance
                ),
                None => println!("{result:?}"),
            }
        }
        Command::Reset { yes } => {
            if !yes {
                anyhow::bail!("reset wipes every balance; re-run with --yes to confirm");
            }
            service.reset().await?;
            println!("store reset to defaults");
        }
    }

    Ok(())
}

/// Log every event as it arrives.
async fn report_events(mut rx: broadcast::Receiver<AccrualEvent>) {
    loop {
        match rx.recv().await {
            Ok(AccrualEvent::Accrued(accrual)) => {
                let unit = match accrual.credited_to {
                    CreditTarget::Flat => String::new(),
                    CreditTarget::Unit(unit) => format!(" {unit}"),
                };
                tracing::info!(
                    "Mining update: +{}{unit} (Total: {}{unit})",
                    accrual.credited_amount,
                    accrual.new_balance
                );
            }
            Ok(AccrualEvent::Withheld { intervals, reason }) => {
                tracing::warn!("Mining update withheld for {intervals} intervals: {reason}");
            }
            Ok(event) => tracing::debug!(?event, "accrual event"),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "event reporter lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn status_json(status: &ServiceStatus) -> serde_json::Value {
    let state = status.engine.state();
    let units: serde_json::Map<String, serde_json::Value> = status
        .engine
        .unit_balances()
        .iter()
        .map(|(unit, entry)| {
            (
                unit.symbol().to_string(),
                serde_json::json!({
                    "address": entry.address,
                    "balance": entry.balance.to_string(),
                }),
            )
        })
        .collect();

    serde_json::json!({
        "enabled": state.enabled,
        "flat_balance": state.flat_balance.to_string(),
        "rate_per_interval": state.rate_per_interval.to_string(),
        "auto_credit": state.auto_credit,
        "target_unit": state.target_unit.symbol(),
        "wallet_address": state.wallet_address,
        "last_update": state.last_update.as_secs(),
        "now": status.now.as_secs(),
        "next_accrual_in": status.seconds_until_next_accrual.map(format_duration),
        "unit_balances": units,
        "stats": status.stats,
    })
}
