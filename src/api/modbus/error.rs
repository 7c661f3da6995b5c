use std::time::Duration;

use thiserror::Error;

/// Failure of a single exchange with the drive, as seen by the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,

    #[error("failed to open serial port {port}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial port error")]
    Serial(#[from] serialport::Error),

    #[error("serial I/O error")]
    Io(#[from] std::io::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("modbus protocol error: {0}")]
    Protocol(String),

    #[error("invalid serial settings")]
    Settings(#[from] ValidationError),
}

/// Operator-supplied or configured value rejected before any bus traffic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("reference {value} is outside the accepted range 0..={max}")]
    ReferenceOutOfRange { value: f64, max: f64 },

    #[error("reference {value} scaled by {scale} does not fit a 16-bit register")]
    ReferenceOverflow { value: f64, scale: u16 },

    #[error("register {0} is not writable")]
    NotWritable(&'static str),

    #[error("max output {0} does not fit a 16-bit register")]
    MaxOutput(f64),

    #[error("port name is empty")]
    EmptyPortName,

    #[error("unsupported data bits: {0}")]
    DataBits(u8),

    #[error("unsupported stop bits: {0}")]
    StopBits(u8),

    #[error("slave id {0} is outside 1..=247")]
    SlaveId(u8),

    #[error("serial timeout must be greater than zero")]
    ZeroTimeout,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Errors surfaced by drive operations.
#[derive(Debug, Error)]
pub enum DriveError {
    /// The transport could not be acquired or connected. Nothing was sent.
    #[error("cannot connect to the drive")]
    ConnectionFailure(#[source] TransportError),

    #[error("failed to read register {address}")]
    RegisterRead {
        address: u16,
        #[source]
        source: TransportError,
    },

    #[error("failed to write 0x{value:04X} to register {address}")]
    RegisterWrite {
        address: u16,
        value: u16,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The status word reports a fault but no fault code could be obtained.
    #[error("drive is faulted but the fault code is unavailable")]
    FaultCodeUnavailable,
}

impl DriveError {
    /// True for errors a polling loop treats as "skip this cycle".
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriveError::RegisterRead { .. } | DriveError::RegisterWrite { .. }
        )
    }
}
