//! Control-word commands and reference setpoints.
//!
//! The dispatcher is stateless: every call is exactly one register write on
//! an already-open session, with no read-back. The next status poll shows
//! whether the drive acted on it.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use super::{
    error::{DriveError, ValidationError},
    registers::{register, RegisterDef, RegisterName},
    session::Session,
    traits::ModbusTransport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ControlCommand {
    Stop,
    Start,
    EmergencyStop,
    ResetFault,
}

impl ControlCommand {
    /// Control word value written for this command.
    pub const fn code(self) -> u16 {
        match self {
            ControlCommand::Stop => 0x0476,
            ControlCommand::Start => 0x0477,
            ControlCommand::EmergencyStop => 0x0470,
            ControlCommand::ResetFault => 0x04F6,
        }
    }
}

/// Check a reference setpoint against `0..=max_output` and convert it to the
/// raw value for `target`. The fractional part is truncated. A value that
/// passes the range check but does not fit the register once scaled is
/// rejected rather than saturated.
pub fn validate_reference(
    target: &RegisterDef,
    value: f64,
    max_output: f64,
) -> Result<u16, ValidationError> {
    if !target.is_writable() {
        return Err(ValidationError::NotWritable(target.name.into()));
    }
    // Written this way so that NaN is rejected too
    if !(0.0..=max_output).contains(&value) {
        return Err(ValidationError::ReferenceOutOfRange {
            value,
            max: max_output,
        });
    }
    if (value * f64::from(target.scale)).trunc() > f64::from(u16::MAX) {
        return Err(ValidationError::ReferenceOverflow {
            value,
            scale: target.scale,
        });
    }
    Ok(target.to_raw(value))
}

/// Issues commands through a borrowed session.
pub struct Dispatcher<'s, T: ModbusTransport> {
    session: &'s mut Session<T>,
    max_output: f64,
}

impl<'s, T: ModbusTransport> Dispatcher<'s, T> {
    pub fn new(session: &'s mut Session<T>, max_output: f64) -> Self {
        Self {
            session,
            max_output,
        }
    }

    /// Write `command_code` to `control_word_addr`. One write, no verification.
    pub fn send_command(&mut self, control_word_addr: u16, command_code: u16) -> Result<(), DriveError> {
        self.session.write_register(control_word_addr, command_code)?;
        log::info!("Inverter command 0x{command_code:04X} sent to register {control_word_addr}");
        Ok(())
    }

    pub fn send(&mut self, command: ControlCommand) -> Result<(), DriveError> {
        let control_word = register(RegisterName::ControlWord);
        self.send_command(control_word.address, command.code())
    }

    pub fn start(&mut self) -> Result<(), DriveError> {
        self.send(ControlCommand::Start)
    }

    pub fn stop(&mut self) -> Result<(), DriveError> {
        self.send(ControlCommand::Stop)
    }

    pub fn emergency_stop(&mut self) -> Result<(), DriveError> {
        self.send(ControlCommand::EmergencyStop)
    }

    pub fn reset_fault(&mut self) -> Result<(), DriveError> {
        self.send(ControlCommand::ResetFault)
    }

    /// Set reference 1. Returns the raw value written.
    pub fn set_reference(&mut self, value: f64) -> Result<u16, DriveError> {
        self.set_reference_on(RegisterName::Reference1, value)
    }

    pub fn set_reference_on(&mut self, target: RegisterName, value: f64) -> Result<u16, DriveError> {
        let def = register(target);
        let raw = validate_reference(def, value, self.max_output)?;
        self.session.write_register(def.address, raw)?;
        log::info!("Reference {target} set to {raw} (requested {value})");
        Ok(raw)
    }
}
