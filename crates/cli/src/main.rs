//! r1-control CLI: drive a Rabbit R1 as a push-to-talk and swipe remote.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use r1_control_core::clock::{Clock, SystemClock};
use r1_control_core::config::{self, Settings};
use r1_control_core::descriptor::DescriptorType;
use r1_control_core::diagnostics::key_tests;
use r1_control_core::manager::DeviceManager;
use r1_control_core::session::AccessorySession;
use r1_control_core::usb::{list_accessories, NusbConnector};
use r1_control_core::{R1_PID, R1_VID};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "r1-control",
    version,
    about = "Push-to-talk and swipe remote for the Rabbit R1 over USB"
)]
struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached R1 accessories.
    List,
    /// Connect and read PTT/swipe events from stdin.
    Run {
        /// Only use the accessory with this serial number.
        #[arg(long, default_value = "")]
        serial: String,
    },
    /// Register one descriptor and tap every key in its test catalog.
    Probe {
        /// Descriptor: keyboard, consumer, system, camera.
        descriptor: String,
        /// Only use the accessory with this serial number.
        #[arg(long, default_value = "")]
        serial: String,
        /// Pause between keys, in milliseconds.
        #[arg(long, default_value_t = 2000)]
        delay_ms: u64,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings.
    Show,
    /// Enable or disable keep-awake.
    KeepAwake {
        state: Toggle,
        /// Idle minutes before the R1 may sleep (0, 30, 60, 120, 180, 300; 0 = never).
        #[arg(long)]
        sleep_after: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn settings_path(cli_path: Option<PathBuf>) -> Result<PathBuf> {
    match cli_path {
        Some(path) => Ok(path),
        None => Ok(config::default_path()?),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            let accessories = list_accessories(R1_VID, R1_PID)?;
            if accessories.is_empty() {
                println!("No R1 found (VID 0x{R1_VID:04X}, PID 0x{R1_PID:04X}).");
                println!("Check the cable and USB permissions.");
            } else {
                for accessory in &accessories {
                    println!("{accessory}");
                }
            }
        }
        Commands::Run { serial } => {
            let path = settings_path(cli.config)?;
            let runtime = tokio::runtime::Runtime::new().context("start tokio runtime")?;
            runtime.block_on(run(path, serial))?;
        }
        Commands::Probe {
            descriptor,
            serial,
            delay_ms,
        } => probe(&descriptor, &serial, Duration::from_millis(delay_ms))?,
        Commands::Config { action } => {
            let path = settings_path(cli.config)?;
            let mut settings = Settings::load_or_create(&path)
                .with_context(|| format!("load settings from {}", path.display()))?;
            match action {
                ConfigAction::Show => {
                    println!("Settings file: {}", path.display());
                    println!("  PTT hotkey:   {}", settings.hotkey);
                    println!("  Swipe hotkey: {}", settings.swipe_hotkey);
                    println!("  Auto start:   {}", settings.auto_start);
                    println!("  Keep awake:   {}", settings.keep_awake);
                    println!("  Sleep after:  {} min", settings.sleep_after_minutes);
                }
                ConfigAction::KeepAwake { state, sleep_after } => {
                    let enabled = matches!(state, Toggle::On);
                    let minutes = sleep_after.unwrap_or(settings.sleep_after_minutes);
                    settings.set_keep_awake(enabled, minutes)?;
                    settings.save(&path)?;
                    println!(
                        "Keep awake {} (sleep after {} min)",
                        if enabled { "on" } else { "off" },
                        settings.sleep_after_minutes
                    );
                }
            }
        }
    }

    Ok(())
}

type ManagerOp = fn(&DeviceManager) -> r1_control_core::error::Result<()>;

async fn run(path: PathBuf, serial: String) -> Result<()> {
    let settings = Settings::load_or_create(&path)
        .with_context(|| format!("load settings from {}", path.display()))?;

    let manager = Arc::new(DeviceManager::new(
        Arc::new(NusbConnector::default()),
        Arc::new(SystemClock),
        serial,
    ));
    manager.set_keep_awake(settings.keep_awake());

    let mut events = manager.subscribe();
    let observer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(state) => println!("state: {state}"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "State observer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let cancel = CancellationToken::new();
    let coordinator = tokio::spawn(Arc::clone(&manager).run(cancel.clone()));

    println!(
        "Commands: down, up (PTT {}), swipe ({}), status, quit",
        settings.hotkey, settings.swipe_hotkey
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        let command = line.trim();
        let op: ManagerOp = match command {
            "down" => DeviceManager::ptt_down,
            "up" => DeviceManager::ptt_up,
            "swipe" => DeviceManager::swipe,
            "status" => {
                let m = Arc::clone(&manager);
                let status = tokio::task::spawn_blocking(move || m.status()).await?;
                println!("{}", serde_json::to_string_pretty(&status)?);
                continue;
            }
            "quit" | "exit" => break,
            "" => continue,
            other => {
                eprintln!("Unknown command '{other}'. Valid: down, up, swipe, status, quit");
                continue;
            }
        };

        let m = Arc::clone(&manager);
        if let Err(e) = tokio::task::spawn_blocking(move || op(&m)).await? {
            eprintln!("{command}: {e}");
        }
    }

    info!("Shutting down");
    cancel.cancel();
    coordinator.await.context("join device manager")?;
    tokio::task::spawn_blocking(move || manager.close()).await?;
    observer.abort();
    Ok(())
}

fn probe(descriptor: &str, serial: &str, delay: Duration) -> Result<()> {
    let descriptor = DescriptorType::from_name(descriptor).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown descriptor '{}'. Valid descriptors: keyboard, consumer, system, camera",
            descriptor
        )
    })?;
    let tests = key_tests(descriptor);
    if tests.is_empty() {
        anyhow::bail!("{descriptor} has no key tests");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut session = AccessorySession::open(&NusbConnector::default(), serial, clock.clone())?;
    let id = session.register_descriptor(descriptor)?;
    println!("Registered {descriptor} as HID {id}");

    for (i, test) in tests.iter().enumerate() {
        println!(
            "[{}/{}] {}: expect {} / {} ({})",
            i + 1,
            tests.len(),
            test.name,
            test.android_key,
            test.linux_key,
            test.description
        );
        if let Err(e) = session.tap_to(id, &test.down, &test.up) {
            eprintln!("  failed: {e}");
        }
        clock.sleep(delay);
    }

    session.close();
    println!("Done.");
    Ok(())
}
