//! One-shot drive operations, each wrapped in its own session.

use serde::Serialize;
use std::fmt;

use super::{
    command::{validate_reference, ControlCommand, Dispatcher},
    config::DriveConfig,
    diagnostic::{evaluate, Diagnosis},
    error::DriveError,
    polling::{
        run_monitor, run_sweep, CancelToken, MonitorSummary, PacedExt, Pacer, RegisterSweep,
        StatusPoller, SweepSummary,
    },
    registers::{register, RegisterName},
    session::{self, Connector, RtuConnector, Session},
    traits::{ModbusTransport, StatusHandler, SweepHandler},
};

/// Result of the connection test: live values plus the full diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionReport {
    pub timestamp: String,
    pub frequency_hz: f64,
    pub current_a: f64,
    pub diagnosis: Diagnosis,
}

impl fmt::Display for ConnectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frequency: {:.2} Hz", self.frequency_hz)?;
        writeln!(f, "Current:   {:.2} A", self.current_a)?;
        writeln!(f, "Status:    0x{:04X}", self.diagnosis.status_word)?;
        write!(f, "Drive:     {}", self.diagnosis.describe())
    }
}

/// Read the status word and, only when it reports a fault, the fault code.
///
/// A failed fault-code read does not fail the diagnosis; it is reported as
/// an unavailable code.
pub fn read_diagnosis<T: ModbusTransport>(
    session: &mut Session<T>,
) -> Result<Diagnosis, DriveError> {
    let status_word = session.read_register(register(RegisterName::StatusWord).address)?;
    let preliminary = evaluate(status_word, None);
    if !preliminary.is_fault() {
        return Ok(preliminary);
    }

    let fault_code = match session.read_register(register(RegisterName::FaultCode).address) {
        Ok(code) => Some(code),
        Err(err) => {
            log::warn!("Drive is faulted but the fault code could not be read: {err}");
            None
        }
    };
    let diagnosis = evaluate(status_word, fault_code);
    if diagnosis.fault_code().is_err() {
        log::warn!("Fault code unavailable (status word 0x{status_word:04X})");
    }
    Ok(diagnosis)
}

/// Entry point for drive operations.
///
/// Every method opens a fresh session through the connector, performs its
/// exchanges and closes the session before returning.
pub struct DriveClient<C: Connector = RtuConnector> {
    config: DriveConfig,
    connector: C,
}

impl DriveClient<RtuConnector> {
    pub fn new(config: DriveConfig) -> Self {
        Self::with_connector(config, RtuConnector)
    }
}

impl<C: Connector> DriveClient<C> {
    pub fn with_connector(config: DriveConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Run `op` in a new session.
    pub fn with_session<R, F>(&self, op: F) -> Result<R, DriveError>
    where
        F: FnOnce(&mut Session<C::Transport>) -> Result<R, DriveError>,
    {
        let transport = self
            .connector
            .acquire(&self.config)
            .map_err(DriveError::ConnectionFailure)?;
        session::with_session(transport, op)
    }

    pub fn test_connection(&self) -> Result<ConnectionReport, DriveError> {
        self.with_session(|session| {
            let frequency = register(RegisterName::Frequency);
            let current = register(RegisterName::Current);
            let values = session.read_holding_registers(frequency.address, 2)?;
            let diagnosis = read_diagnosis(session)?;

            let report = ConnectionReport {
                timestamp: chrono::Utc::now().to_rfc3339(),
                frequency_hz: frequency.to_physical(values[0]),
                current_a: current.to_physical(values[1]),
                diagnosis,
            };
            log::info!(
                "Connection test OK: {:.2} Hz, {:.2} A, {}",
                report.frequency_hz,
                report.current_a,
                report.diagnosis
            );
            Ok(report)
        })
    }

    pub fn diagnose(&self) -> Result<Diagnosis, DriveError> {
        self.with_session(read_diagnosis)
    }

    pub fn send(&self, command: ControlCommand) -> Result<(), DriveError> {
        let max_output = self.config.max_output;
        self.with_session(|session| Dispatcher::new(session, max_output).send(command))
    }

    pub fn set_reference(&self, value: f64) -> Result<u16, DriveError> {
        self.set_reference_on(RegisterName::Reference1, value)
    }

    /// Validated before the port is opened: a rejected setpoint causes no I/O.
    pub fn set_reference_on(&self, target: RegisterName, value: f64) -> Result<u16, DriveError> {
        let max_output = self.config.max_output;
        validate_reference(register(target), value, max_output)?;
        self.with_session(|session| {
            Dispatcher::new(session, max_output).set_reference_on(target, value)
        })
    }

    pub fn read_register(&self, address: u16) -> Result<u16, DriveError> {
        self.with_session(|session| session.read_register(address))
    }

    pub fn write_register(&self, address: u16, value: u16) -> Result<(), DriveError> {
        self.with_session(|session| {
            session.write_register(address, value)?;
            log::info!("Wrote {value} to register {address}");
            Ok(())
        })
    }

    /// Poll status until `cancel` fires, pausing `poll_interval` between cycles.
    pub fn monitor<P, H>(
        &self,
        cancel: CancelToken,
        pacer: P,
        handler: &mut H,
    ) -> Result<MonitorSummary, DriveError>
    where
        P: Pacer,
        H: StatusHandler + ?Sized,
    {
        let interval = self.config.poll_interval();
        self.with_session(|session| {
            let cycles = StatusPoller::new(session, cancel).paced(interval, pacer);
            Ok(run_monitor(cycles, handler))
        })
    }

    /// Dump registers `0..=sweep_last_address`, stopping after a FAULT record.
    pub fn dump<P, H>(
        &self,
        cancel: CancelToken,
        pacer: P,
        handler: &mut H,
    ) -> Result<SweepSummary, DriveError>
    where
        P: Pacer,
        H: SweepHandler + ?Sized,
    {
        let interval = self.config.poll_interval();
        let last_address = self.config.sweep_last_address;
        self.with_session(|session| {
            let records = RegisterSweep::new(session, last_address, cancel).paced(interval, pacer);
            Ok(run_sweep(records, handler))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::modbus::diagnostic::{DriveState, FaultCode};

    #[test]
    fn test_report_rendering() {
        let report = ConnectionReport {
            timestamp: String::new(),
            frequency_hz: 50.0,
            current_a: 4.2,
            diagnosis: evaluate(0x0008, Some(9)),
        };
        assert_eq!(report.diagnosis.state, DriveState::Fault(FaultCode::Code(9)));
        let text = report.to_string();
        assert!(text.contains("Frequency: 50.00 Hz"), "{text}");
        assert!(text.contains("Current:   4.20 A"), "{text}");
        assert!(text.contains("Status:    0x0008"), "{text}");
        assert!(text.contains("MOT OVERTEMP"), "{text}");
    }
}
