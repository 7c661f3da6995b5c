//! Session lifecycle around one transport connection.
//!
//! A [`Session`] exists only while its transport is connected and closes it
//! exactly once: explicitly through [`Session::close`], or on drop when the
//! wrapped operation returns early or unwinds.

use super::{
    config::DriveConfig,
    core::RtuTransport,
    error::{DriveError, TransportError},
    traits::ModbusTransport,
};

/// Exclusive owner of a connected transport.
pub struct Session<T: ModbusTransport> {
    transport: T,
    open: bool,
}

impl<T: ModbusTransport> Session<T> {
    /// Connect the transport and wrap it. On failure nothing is closed,
    /// since nothing was opened.
    pub fn open(mut transport: T) -> Result<Self, DriveError> {
        transport
            .connect()
            .map_err(DriveError::ConnectionFailure)?;
        Ok(Self {
            transport,
            open: true,
        })
    }

    pub fn read_holding_registers(
        &mut self,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, DriveError> {
        let values = self
            .transport
            .read_holding_registers(start, count)
            .map_err(|source| DriveError::RegisterRead {
                address: start,
                source,
            })?;

        if values.len() != count as usize {
            return Err(DriveError::RegisterRead {
                address: start,
                source: TransportError::Protocol(format!(
                    "expected {count} registers, got {}",
                    values.len()
                )),
            });
        }
        Ok(values)
    }

    pub fn read_register(&mut self, address: u16) -> Result<u16, DriveError> {
        let values = self.read_holding_registers(address, 1)?;
        Ok(values[0])
    }

    pub fn write_register(&mut self, address: u16, value: u16) -> Result<(), DriveError> {
        self.transport
            .write_register(address, value)
            .map_err(|source| DriveError::RegisterWrite {
                address,
                value,
                source,
            })
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.open {
            self.open = false;
            self.transport.close();
            log::debug!("Session closed");
        }
    }
}

impl<T: ModbusTransport> Drop for Session<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Produces a fresh, unconnected transport for each session.
pub trait Connector {
    type Transport: ModbusTransport;

    fn acquire(&self, config: &DriveConfig) -> Result<Self::Transport, TransportError>;
}

/// Serial RTU transport built from the drive configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtuConnector;

impl Connector for RtuConnector {
    type Transport = RtuTransport;

    fn acquire(&self, config: &DriveConfig) -> Result<RtuTransport, TransportError> {
        Ok(RtuTransport::new(config.clone()))
    }
}

impl<F, T> Connector for F
where
    F: Fn(&DriveConfig) -> Result<T, TransportError>,
    T: ModbusTransport,
{
    type Transport = T;

    fn acquire(&self, config: &DriveConfig) -> Result<T, TransportError> {
        self(config)
    }
}

/// Run `op` inside a session on `transport`.
///
/// Connection failure is reported as [`DriveError::ConnectionFailure`] and
/// `op` is never invoked. Otherwise the transport is closed exactly once,
/// whatever `op` returns.
pub fn with_session<T, R, F>(transport: T, op: F) -> Result<R, DriveError>
where
    T: ModbusTransport,
    F: FnOnce(&mut Session<T>) -> Result<R, DriveError>,
{
    let mut session = Session::open(transport)?;
    let result = op(&mut session);
    session.close();
    result
}
