pub mod client;
pub mod command;
pub mod config;
pub mod core;
pub mod diagnostic;
pub mod error;
pub mod polling;
pub mod registers;
pub mod session;
pub mod traits;

// Errors
pub use error::{DriveError, TransportError, ValidationError};

// Configuration
pub use config::{DriveConfig, DriveConfigBuilder, Parity};

// Transport and session lifecycle
pub use self::core::RtuTransport;
pub use session::{with_session, Connector, RtuConnector, Session};
pub use traits::{LoggingHandler, ModbusTransport, StatusHandler, SweepHandler};

// Drive semantics
pub use command::{validate_reference, ControlCommand, Dispatcher};
pub use diagnostic::{evaluate, fault_description, Diagnosis, DriveState, FaultCode};
pub use registers::{all_registers, lookup, register, Access, RegisterDef, RegisterName};

// Polling
pub use polling::{
    poll_status, read_sweep_record, run_monitor, run_sweep, CancelToken, MonitorSummary, Paced,
    PacedExt, Pacer, RegisterSweep, StatusPoller, StatusSample, SweepRecord, SweepSummary,
    ThreadSleep,
};

pub use client::{read_diagnosis, ConnectionReport, DriveClient};
