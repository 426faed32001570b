//! autoboiler: node entry point.
//!
//! ```text
//! autoboiler [--config PATH] controller     control node
//! autoboiler [--config PATH] boiler         remote actuator node
//! autoboiler [--config PATH] send REQUEST   one-shot control-socket client
//! ```
//!
//! The physical radio, GPIO and SPI bindings live outside this crate;
//! the nodes run here against the simulated hardware in
//! [`adapters::sim`](autoboiler::adapters::sim).
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │  SimRadio   GpioRelayBank<SimPin>   Tc77<SimSpi>   SystemClock │
//! │  JsonLinesLog   UnixControlServer   ButtonInputs               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │      Controller (radio · scheduler · filter · socket)          │
//! │      Boiler     (radio · relays · buttons)                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use autoboiler::adapters::sim::{SimPin, SimRadio, SimSpi};
use autoboiler::adapters::telemetry_log::JsonLinesLog;
use autoboiler::adapters::time::SystemClock;
use autoboiler::app::boiler::{Boiler, BoilerParts, BoilerSettings};
use autoboiler::app::controller::{Controller, ControllerParts, ControllerSettings};
use autoboiler::config::SystemConfig;
use autoboiler::drivers::button::ButtonInputs;
use autoboiler::drivers::relay::GpioRelayBank;
use autoboiler::events::ButtonQueue;
use autoboiler::rpc::client::send_request;
use autoboiler::rpc::transport::UnixControlServer;
use autoboiler::sensors::temperature::Tc77;

const DEFAULT_CONFIG: &str = "/etc/autoboiler/config.json";

/// Simulated Boiler reports this often.
const SIM_TELEMETRY_PERIOD: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "autoboiler", version)]
#[command(about = "Radio-linked boiler controller and remote relay node", long_about = None)]
struct Cli {
    /// Configuration file (JSON); defaults apply when it does not exist
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the control node
    Controller,
    /// Run the remote actuator node
    Boiler,
    /// Send one request to a running controller and print the reply
    Send {
        /// Request words, e.g. `boost -2 time 3600`
        #[arg(required = true, allow_negative_numbers = true)]
        request: Vec<String>,
    },
}

/// SIGINT / SIGTERM set the returned flag; the loops observe it at their
/// next wait boundary.
fn install_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("installing signal handler")?;
    Ok(flag)
}

fn run_controller(config: &SystemConfig, shutdown: &AtomicBool) -> Result<()> {
    let c = &config.controller;
    let relays = GpioRelayBank::new(c.relay_lines.iter().copied().map(SimPin::new).collect())
        .context("initialising local relays")?;
    let sink = JsonLinesLog::open(&c.telemetry_log)
        .with_context(|| format!("opening telemetry log {}", c.telemetry_log.display()))?;
    let server = UnixControlServer::bind(&c.socket_path, c.socket_mode)
        .with_context(|| format!("binding control socket {}", c.socket_path.display()))?;
    let parts = ControllerParts {
        radio: SimRadio::with_boiler(config.boiler.relay_lines.len(), 55.0, SIM_TELEMETRY_PERIOD),
        relays,
        sensor: Tc77::new(SimSpi::new(20.0)),
        sink,
        clock: SystemClock::new(),
        server,
    };

    let mut controller = Controller::new(parts, ControllerSettings::from_config(c));
    let outcome = controller.run(shutdown);
    let failures = controller.teardown();
    outcome.context("controller loop")?;
    if !failures.is_empty() {
        warn!("{} teardown step(s) failed", failures.len());
    }
    Ok(())
}

fn run_boiler(config: &SystemConfig, shutdown: &AtomicBool) -> Result<()> {
    let b = &config.boiler;
    let queue = Arc::new(ButtonQueue::new());
    let inputs = ButtonInputs::new(b.button_lines.clone(), b.debounce(), Arc::clone(&queue));

    // Without GPIO, a line number typed on stdin is a falling edge on it.
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines().map_while(Result::ok) {
            match line.trim().parse::<u32>() {
                Ok(gpio) => {
                    inputs.on_falling_edge(gpio);
                }
                Err(_) => warn!("stdin: expected a GPIO line number, got {:?}", line),
            }
        }
    });

    let relays = GpioRelayBank::new(b.relay_lines.iter().copied().map(SimPin::new).collect())
        .context("initialising relays")?;
    let parts = BoilerParts {
        radio: SimRadio::silent(),
        relays,
        sensor: Tc77::new(SimSpi::new(60.0)),
        buttons: queue,
    };
    let mut boiler = Boiler::new(parts, BoilerSettings::from_config(b));
    boiler.run(shutdown);
    let failures = boiler.teardown();
    if !failures.is_empty() {
        warn!("{} teardown step(s) failed", failures.len());
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = SystemConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Commands::Send { request } => {
            let reply = send_request(
                &config.controller.socket_path,
                &request.join(" "),
                config.controller.client_timeout(),
            )
            .with_context(|| format!("contacting {}", config.controller.socket_path.display()))?;
            println!("{reply}");
            Ok(if reply.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Controller => {
            info!("autoboiler v{} (controller)", env!("CARGO_PKG_VERSION"));
            let shutdown = install_shutdown_flag()?;
            run_controller(&config, &shutdown)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Boiler => {
            info!("autoboiler v{} (boiler)", env!("CARGO_PKG_VERSION"));
            let shutdown = install_shutdown_flag()?;
            run_boiler(&config, &shutdown)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
