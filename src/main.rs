use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use presale_dapp::config::PresaleConfig;
use presale_dapp::connector::{ConnectorKind, RpcWalletConnector, WalletConnector};
use presale_dapp::contract::RpcPresaleContract;
use presale_dapp::notify::LogNotifier;
use presale_dapp::presale::{DepositOutcome, PresaleController, PresaleView, SessionSettings};
use presale_dapp::runtime::{self, PresalePoller};

const DEFAULT_CONFIG_PATH: &str = "config/presale.toml";

#[derive(Parser)]
#[command(author, version, about = "Whitelist-tiered token presale client")]
struct Cli {
    /// Presale configuration file; defaults are used when it does not exist.
    #[arg(short, long, global = true, env = "PRESALE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WalletArg {
    Injected,
    BridgeBased,
}

impl From<WalletArg> for ConnectorKind {
    fn from(wallet: WalletArg) -> Self {
        match wallet {
            WalletArg::Injected => ConnectorKind::Injected,
            WalletArg::BridgeBased => ConnectorKind::BridgeBased,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    GenerateConfig {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
    /// Connect, refresh the presale state once and print it
    Status {
        #[arg(short, long, value_enum, default_value = "injected")]
        wallet: WalletArg,
    },
    /// Print the presale state on every countdown tick until interrupted
    Watch {
        #[arg(short, long, value_enum, default_value = "injected")]
        wallet: WalletArg,
    },
    /// Send the deposit for the connected account's tier
    Contribute {
        #[arg(short, long, value_enum, default_value = "injected")]
        wallet: WalletArg,
    },
    /// Open the graphical presale page
    #[cfg(feature = "gui")]
    Gui,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = cli.config.as_path();
    match cli.command {
        Commands::GenerateConfig { path } => generate_config(&path),
        Commands::Status { wallet } => block_on(status(config, wallet.into())),
        Commands::Watch { wallet } => block_on(watch(config, wallet.into())),
        Commands::Contribute { wallet } => block_on(contribute(config, wallet.into())),
        #[cfg(feature = "gui")]
        Commands::Gui => launch_gui(config),
    }
}

/// The GUI owns its executor, so the tokio runtime is only built for the
/// commands that need it.
fn block_on(command: impl Future<Output = Result<()>>) -> Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(command)
}

fn generate_config(path: &Path) -> Result<()> {
    PresaleConfig::default().save(path)?;
    info!(?path, "wrote default configuration");
    Ok(())
}

type CliController = PresaleController<RpcPresaleContract, LogNotifier>;

async fn connect(config_path: &Path, kind: ConnectorKind) -> Result<(PresaleConfig, CliController)> {
    let config = PresaleConfig::load_or_default(config_path)?;
    let settings = SessionSettings::from_config(&config)?;
    let connector = RpcWalletConnector::new(config.network.clone(), config.wallet.clone());
    let (state, controller) =
        runtime::open_session(&connector, kind, &config.polling, settings.clone(), LogNotifier)
            .await;
    match controller {
        Some(controller) => Ok((config, controller)),
        None => {
            let message = presale_dapp::presale::derive::network_message(&state, &settings.rules);
            connector.disconnect();
            bail!("{kind} wallet unavailable: {message}")
        }
    }
}

async fn status(config_path: &Path, kind: ConnectorKind) -> Result<()> {
    let (_, controller) = connect(config_path, kind).await?;
    controller.refresh_total_raised().await;
    print_view(&controller.view(runtime::now_ms()));
    Ok(())
}

async fn watch(config_path: &Path, kind: ConnectorKind) -> Result<()> {
    let (config, controller) = connect(config_path, kind).await?;
    let (views_tx, mut views_rx) = mpsc::unbounded_channel();
    let poller = PresalePoller::start(controller, &config.polling, views_tx);

    let mut last: Option<PresaleView> = None;
    loop {
        tokio::select! {
            view = views_rx.recv() => {
                let Some(view) = view else { break };
                if last.as_ref() != Some(&view) {
                    print_view(&view);
                    last = Some(view);
                }
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }
    poller.shutdown().await;
    Ok(())
}

async fn contribute(config_path: &Path, kind: ConnectorKind) -> Result<()> {
    let (_, controller) = connect(config_path, kind).await?;
    let now = runtime::now_ms();
    let view = controller.view(now);
    match controller.submit_deposit(now).await {
        DepositOutcome::Confirmed(receipt) => {
            info!(
                transaction = ?receipt.transaction_hash,
                block = ?receipt.block_number,
                "contribution confirmed"
            );
            print_view(&controller.view(runtime::now_ms()));
            Ok(())
        }
        DepositOutcome::Failed(receipt) => {
            bail!("deposit {:?} reverted", receipt.transaction_hash)
        }
        DepositOutcome::Rejected => bail!("deposit rejected"),
        DepositOutcome::Skipped => bail!("cannot contribute: {}", view.contribute_label),
    }
}

fn print_view(view: &PresaleView) {
    println!("{}", view.network_message);
    println!("{}", view.address_message);
    println!("limit:     {}", view.limit_message);
    println!("balance:   {} / {}", view.native_balance, view.token_balance);
    println!(
        "raised:    {} ({:.0}%)",
        view.total_raised,
        view.raised_progress * 100.0
    );
    println!("time left: {}", view.time_left);
    println!(
        "action:    {}{}",
        view.contribute_label,
        if view.can_contribute { "" } else { " (disabled)" }
    );
}

#[cfg(feature = "gui")]
fn launch_gui(config_path: &Path) -> Result<()> {
    use presale_dapp::ui::{self, PresaleGuiFlags};

    let config = PresaleConfig::load_or_default(config_path)?;
    let settings = SessionSettings::from_config(&config)?;
    ui::launch(PresaleGuiFlags { config, settings })?;
    Ok(())
}
