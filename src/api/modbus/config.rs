use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

use super::error::{DriveError, ValidationError};

pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD_RATE: u32 = 19200;
pub const DEFAULT_SLAVE_ID: u8 = 1;
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
/// Last address of the bulk register dump (inclusive).
pub const DEFAULT_SWEEP_LAST_ADDRESS: u16 = 58;
/// Upper bound of the reference setpoint, in raw reference units.
pub const DEFAULT_MAX_OUTPUT: f64 = 20000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Connection and behaviour settings for one drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    /// Modbus slave address of the drive.
    pub slave_id: u8,
    /// Response timeout for each exchange.
    pub timeout_ms: u64,
    /// Delay between polling cycles.
    pub poll_interval_ms: u64,
    pub sweep_last_address: u16,
    pub max_output: f64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            slave_id: DEFAULT_SLAVE_ID,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            sweep_last_address: DEFAULT_SWEEP_LAST_ADDRESS,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

impl DriveConfig {
    /// Parse configuration from a JSON string. Missing fields take defaults.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Read and validate configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port_name.trim().is_empty() {
            return Err(ValidationError::EmptyPortName);
        }
        if !(1..=247).contains(&self.slave_id) {
            return Err(ValidationError::SlaveId(self.slave_id));
        }
        if !self.max_output.is_finite()
            || self.max_output < 0.0
            || self.max_output > f64::from(u16::MAX)
        {
            return Err(ValidationError::MaxOutput(self.max_output));
        }
        if self.timeout_ms == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::ZeroPollInterval);
        }
        self.serial_data_bits()?;
        self.serial_stop_bits()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn serial_data_bits(&self) -> Result<serialport::DataBits, ValidationError> {
        match self.data_bits {
            5 => Ok(serialport::DataBits::Five),
            6 => Ok(serialport::DataBits::Six),
            7 => Ok(serialport::DataBits::Seven),
            8 => Ok(serialport::DataBits::Eight),
            other => Err(ValidationError::DataBits(other)),
        }
    }

    pub fn serial_stop_bits(&self) -> Result<serialport::StopBits, ValidationError> {
        match self.stop_bits {
            1 => Ok(serialport::StopBits::One),
            2 => Ok(serialport::StopBits::Two),
            other => Err(ValidationError::StopBits(other)),
        }
    }
}

/// Builder for [`DriveConfig`], validating on `build()`.
///
/// ```
/// use vfdctl::DriveConfigBuilder;
///
/// let config = DriveConfigBuilder::new()
///     .with_port("/dev/ttyUSB1")
///     .with_slave_id(3)
///     .with_timeout(1000)
///     .build()?;
/// assert_eq!(config.baud_rate, 19200);
/// # Ok::<(), vfdctl::DriveError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DriveConfigBuilder {
    config: DriveConfig,
}

impl DriveConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port_name: &str) -> Self {
        self.config.port_name = port_name.to_string();
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.config.parity = parity;
        self
    }

    pub fn with_slave_id(mut self, slave_id: u8) -> Self {
        self.config.slave_id = slave_id;
        self
    }

    /// Set the per-exchange response timeout in milliseconds.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Set the delay between polling cycles in milliseconds.
    pub fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.config.poll_interval_ms = interval_ms;
        self
    }

    pub fn with_sweep_last_address(mut self, address: u16) -> Self {
        self.config.sweep_last_address = address;
        self
    }

    pub fn with_max_output(mut self, max_output: f64) -> Self {
        self.config.max_output = max_output;
        self
    }

    pub fn build(self) -> Result<DriveConfig, DriveError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl From<DriveConfig> for DriveConfigBuilder {
    fn from(config: DriveConfig) -> Self {
        Self { config }
    }
}
