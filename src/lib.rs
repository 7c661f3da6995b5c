//! vfdctl: supervisory client for Modbus RTU variable-frequency drives
//!
//! This crate provides the register protocol layer for a VFD / motor inverter
//! reachable over a Modbus RTU serial link: the register map, the status-word
//! diagnostics, control-word commands, and lazy polling iterators for live
//! status and bulk register dumps. The `vfdctl` binary is a thin CLI over the
//! same API.
//!
//! All bus I/O goes through the [`ModbusTransport`] trait. Production code
//! uses [`RtuTransport`] (serialport + rmodbus); tests and embedding hosts can
//! plug in their own transport through a [`Connector`].
//!
//! ```no_run
//! use vfdctl::{ControlCommand, DriveClient, DriveConfigBuilder};
//!
//! let config = DriveConfigBuilder::new()
//!     .with_port("/dev/ttyUSB0")
//!     .with_max_output(20000.0)
//!     .build()?;
//! let client = DriveClient::new(config);
//!
//! let report = client.test_connection()?;
//! println!("{report}");
//! client.send(ControlCommand::Start)?;
//! # Ok::<(), vfdctl::DriveError>(())
//! ```

pub mod api;
#[doc(hidden)]
pub mod boot;
#[doc(hidden)]
pub mod cli;
#[doc(hidden)]
pub mod protocol;

pub use api::*;
