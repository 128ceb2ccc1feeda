//! Wirescan - command line I2C bus scanner
//!
//! Scans each configured bus once, either on real i2c-dev adapters or by
//! replaying captured fixtures, and prints what was identified.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wirescan_bus::{Bus, SimulatedBus};
use wirescan_core::address::HexAddr;
use wirescan_core::{BusId, DiscoveryResult};
use wirescan_discovery::{ScanReport, Scanner};

use crate::config::{BusConfig, BusSource};

#[derive(Parser, Debug)]
#[command(name = "wirescan")]
#[command(about = "Discover and identify peripherals on I2C buses")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "wirescan.toml")]
    config: PathBuf,

    /// Scan /dev/i2c-N instead of the configured buses (repeatable)
    #[arg(short, long)]
    bus: Vec<u8>,

    /// Replay a bus fixture instead of the configured buses (repeatable,
    /// numbered after the highest --bus)
    #[arg(short, long)]
    fixture: Vec<PathBuf>,

    /// Print the discovery tables as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    reports: &'a [ScanReport],
    result: &'a DiscoveryResult,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Wirescan v{}", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let config = config::load_config(&args.config)?;

    let buses = if !args.bus.is_empty() || !args.fixture.is_empty() {
        config::buses_from_args(&args.bus, &args.fixture)?
    } else {
        config.buses()
    };

    let mut scanner = Scanner::new(config.scanner.clone());
    let mut result = DiscoveryResult::new();
    let mut reports = Vec::new();

    // One bus at a time, all into the same tables
    for bus_config in &buses {
        let mut bus = open_bus(bus_config)?;
        let report = scanner.scan(bus.as_mut(), BusId(bus_config.number), &mut result);
        reports.push(report);
    }

    if args.json {
        let output = Output {
            reports: &reports,
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&reports, &result);
    }

    Ok(())
}

fn open_bus(bus_config: &BusConfig) -> Result<Box<dyn Bus>> {
    match bus_config.source()? {
        BusSource::Fixture(path) => {
            let bus = SimulatedBus::from_file(&path)
                .with_context(|| format!("loading fixture {}", path.display()))?;
            Ok(Box::new(bus))
        }
        BusSource::Device(path) => open_device(&path),
    }
}

#[cfg(target_os = "linux")]
fn open_device(path: &std::path::Path) -> Result<Box<dyn Bus>> {
    let bus = wirescan_bus::LinuxI2cBus::open(path)?;
    Ok(Box::new(bus))
}

#[cfg(not(target_os = "linux"))]
fn open_device(path: &std::path::Path) -> Result<Box<dyn Bus>> {
    anyhow::bail!(
        "cannot open {}: i2c-dev adapters are only supported on Linux, use --fixture",
        path.display()
    )
}

fn print_summary(reports: &[ScanReport], result: &DiscoveryResult) {
    for report in reports {
        println!("Bus {}: {} devices found", report.bus, report.found);
        for address in &report.unknown_errors {
            println!("  ! unknown error at {}", HexAddr(*address));
        }
    }

    if result.devices.is_empty() {
        return;
    }

    println!("Devices:");
    for record in result.devices.values() {
        println!(
            "  - {} on bus {}: {:?}",
            HexAddr(record.address),
            record.bus,
            record.kind
        );
    }
    if !result.sensors.is_empty() {
        println!("Sensors:");
        for (kind, address) in &result.sensors {
            println!("  - {} at {}", kind, HexAddr(*address));
        }
    }
    if let Some(screen) = &result.screen {
        println!("Screen: {:?} at {}", screen.model, HexAddr(screen.address));
    }
    if let Some(keyboard) = &result.keyboard {
        println!("Keyboard: {:?}", keyboard);
    }
}
