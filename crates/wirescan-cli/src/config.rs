//! Configuration loading and validation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use wirescan_discovery::{ClockVariant, ScannerConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default, rename = "bus")]
    pub buses: Vec<BusConfig>,
}

/// One bus to scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Bus number recorded into device records
    pub number: u8,
    /// i2c-dev character device (defaults to /dev/i2c-{number})
    #[serde(default)]
    pub device: Option<PathBuf>,
    /// Replay a captured fixture instead of touching hardware
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

/// Where a bus comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusSource {
    Device(PathBuf),
    Fixture(PathBuf),
}

impl BusConfig {
    pub fn device(number: u8) -> Self {
        Self {
            number,
            device: None,
            fixture: None,
        }
    }

    pub fn fixture(number: u8, path: PathBuf) -> Self {
        Self {
            number,
            device: None,
            fixture: Some(path),
        }
    }

    /// Resolve the bus source, rejecting entries that name both
    pub fn source(&self) -> Result<BusSource> {
        match (&self.device, &self.fixture) {
            (Some(_), Some(_)) => anyhow::bail!(
                "bus {} sets both `device` and `fixture`, pick one",
                self.number
            ),
            (None, Some(path)) => Ok(BusSource::Fixture(path.clone())),
            (Some(path), None) => Ok(BusSource::Device(path.clone())),
            (None, None) => Ok(BusSource::Device(PathBuf::from(format!(
                "/dev/i2c-{}",
                self.number
            )))),
        }
    }
}

impl Config {
    /// Buses to scan, falling back to bus 0 when none are configured
    pub fn buses(&self) -> Vec<BusConfig> {
        if self.buses.is_empty() {
            vec![BusConfig::device(0)]
        } else {
            self.buses.clone()
        }
    }
}

/// Buses named on the command line
///
/// Fixtures are numbered after the highest explicit bus so that no two
/// buses share a number in the discovery tables.
pub fn buses_from_args(numbers: &[u8], fixtures: &[PathBuf]) -> Result<Vec<BusConfig>> {
    let mut buses: Vec<BusConfig> = numbers.iter().map(|&n| BusConfig::device(n)).collect();
    let first_free = numbers.iter().max().map_or(0, |&n| u16::from(n) + 1);

    for (i, path) in fixtures.iter().enumerate() {
        let number = u8::try_from(first_free + i as u16).map_err(|_| {
            anyhow::anyhow!("no free bus number left for fixture {}", path.display())
        })?;
        buses.push(BusConfig::fixture(number, path.clone()));
    }

    Ok(buses)
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        scanner: ScannerConfig {
            secure_element: false,
            clock: ClockVariant::None,
            pmu: true,
        },
        buses: vec![BusConfig::device(0), BusConfig::device(1)],
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}
