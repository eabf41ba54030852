//! glucolink host entry point.
//!
//! Startup order: banner, configuration (including the IoT Edge root CA),
//! network check, termination handler, peripherals, timers.  The network
//! check comes after the configuration because the configuration selects
//! the probe.  Each step that can fail has its own exit code.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          SimulatedHub      MonotonicClock     │
//! │  (pins, sensor, network)  (CloudTransport)  (Clock)            │
//! │  LogEventSink             ShutdownFlag (SIGTERM/SIGINT)        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (domain core)                  │    │
//! │  │  Scheduler · Connection · Telemetry · Methods · Twin   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use log::{error, info, warn};

use glucolink::adapters::adc::IioAdcSensor;
use glucolink::adapters::gpio::{SimInputPin, SimOutputPin};
use glucolink::adapters::hardware::HardwareAdapter;
use glucolink::adapters::log_sink::LogEventSink;
use glucolink::adapters::network::{StaticNetworkProbe, SysfsNetworkProbe};
use glucolink::adapters::sim_hub::SimulatedHub;
use glucolink::adapters::time::MonotonicClock;
use glucolink::app::ports::{NetworkProbe, SensorPort};
use glucolink::app::service::AppService;
use glucolink::config::{CommandLine, NetworkSource, SensorSource, SystemConfig};
use glucolink::drivers::button::ButtonInput;
use glucolink::drivers::pump::PumpDriver;
use glucolink::drivers::status_led::StatusLed;
use glucolink::error::ExitCode;
use glucolink::sensors::SimulatedGlucoseSensor;
use glucolink::signals::ShutdownFlag;

fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  glucolink v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let code = match run() {
        Ok(code) | Err(code) => code,
    };
    if !code.is_success() && code != ExitCode::TermHandlerSigTerm {
        error!("Exiting with {}", code);
    }
    code.into()
}

fn run() -> Result<ExitCode, ExitCode> {
    // ── 1. Configuration ──────────────────────────────────────
    let config = load_config()?;

    // ── 2. Network check (warning only) ───────────────────────
    let mut network: Box<dyn NetworkProbe> = match config.network {
        NetworkSource::Always => Box::new(StaticNetworkProbe::new(true)),
        NetworkSource::Sysfs => Box::new(SysfsNetworkProbe::default()),
    };
    if !network.is_internet_reachable() {
        warn!("Network is not ready. Device cannot connect until network is ready.");
    }

    // ── 3. Termination handler ────────────────────────────────
    let shutdown = ShutdownFlag::new();
    shutdown.register_termination().map_err(|e| {
        error!("Cannot register termination handler: {}", e);
        ExitCode::InitTermHandler
    })?;

    // ── 4. Peripherals ────────────────────────────────────────
    let sensor: Box<dyn SensorPort> = match &config.sensor {
        SensorSource::Simulated { seed, start } => {
            Box::new(SimulatedGlucoseSensor::new(*seed, *start))
        }
        SensorSource::IioAdc {
            raw_path,
            bits,
            reference_volts,
        } => Box::new(
            IioAdcSensor::open(raw_path, *bits, *reference_volts).map_err(|e| {
                error!("Cannot open sensor: {}", e);
                ExitCode::InitSensor
            })?,
        ),
    };

    let pump = open_pump(SimOutputPin::named("pump", false))?;
    let led = open_status_led(SimOutputPin::named("status_led", true))?;
    let button = ButtonInput::new(SimInputPin::new(true));
    let hw = HardwareAdapter::new(pump, led, button, sensor, network);

    let hub = SimulatedHub::new(config.hub.clone());

    // ── 5. Event loop ─────────────────────────────────────────
    let mut app = AppService::new(config, hw, hub, MonotonicClock::new(), LogEventSink::new());
    if let Err(code) = app.start() {
        app.close();
        return Err(code);
    }
    Ok(app.run(&shutdown))
}

fn open_pump(pin: SimOutputPin) -> Result<PumpDriver<SimOutputPin>, ExitCode> {
    PumpDriver::new(pin).map_err(|e| {
        error!("Cannot open pump output: {}", e);
        ExitCode::InitPump
    })
}

fn open_status_led(pin: SimOutputPin) -> Result<StatusLed<SimOutputPin>, ExitCode> {
    StatusLed::new(pin).map_err(|e| {
        error!("Cannot open status LED output: {}", e);
        ExitCode::InitStatusLed
    })
}

fn load_config() -> Result<SystemConfig, ExitCode> {
    let cli = CommandLine::parse(std::env::args().skip(1)).map_err(|e| {
        error!("{}", e);
        e.exit_code()
    })?;

    let mut config = match &cli.config_file {
        Some(path) => SystemConfig::load_file(path).map_err(|e| {
            error!("{:#}", e);
            ExitCode::InitConfigFile
        })?,
        None => SystemConfig::default(),
    };
    config.apply(cli);

    let checked = config.validate().and_then(|()| config.load_edge_root_ca());
    if let Err(e) = checked {
        error!("Configuration: {}", e);
        return Err(e.exit_code());
    }
    info!(
        "Connection: {:?}, poll {}s (backoff {}..{}s)",
        config.connection.connection_type,
        config.default_poll_period_secs,
        config.min_backoff_secs,
        config.max_backoff_secs
    );
    Ok(config)
}
