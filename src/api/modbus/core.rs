/// Modbus RTU master over a serial port
///
/// Framing and CRC are handled by rmodbus; this module only moves request
/// and response frames across the port, one exchange at a time.
use std::io::Write;

use super::{config::DriveConfig, error::TransportError, traits::ModbusTransport};
use crate::{
    api::utils::open_serial_port,
    protocol::modbus::{
        generate_pull_get_holdings_request, generate_pull_set_holding_request,
        parse_pull_get_holdings, parse_pull_set_holding, read_modbus_frame,
    },
};

/// Serial transport bound to the slave configured in [`DriveConfig`]
pub struct RtuTransport {
    config: DriveConfig,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl RtuTransport {
    pub fn new(config: DriveConfig) -> Self {
        Self { config, port: None }
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn exchange(&mut self, request_frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotConnected)?;

        // Drop any stale bytes left over from a previous timed-out exchange
        port.clear(serialport::ClearBuffer::Input)?;
        port.write_all(request_frame)?;
        port.flush()?;

        read_modbus_frame(&mut **port)
    }
}

impl ModbusTransport for RtuTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = open_serial_port(&self.config)?;
        log::info!(
            "Opened {} at {} baud (slave {})",
            self.config.port_name,
            self.config.baud_rate,
            self.config.slave_id
        );
        self.port = Some(port);
        Ok(())
    }

    fn read_holding_registers(
        &mut self,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        let (mut request, frame) =
            generate_pull_get_holdings_request(self.config.slave_id, start, count)?;
        let response = self.exchange(&frame)?;
        parse_pull_get_holdings(&mut request, &response, count)
    }

    fn write_register(&mut self, address: u16, value: u16) -> Result<(), TransportError> {
        let (mut request, frame) =
            generate_pull_set_holding_request(self.config.slave_id, address, value)?;
        let response = self.exchange(&frame)?;
        parse_pull_set_holding(&mut request, &response)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::info!("Closed {}", self.config.port_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_requires_connection() {
        let mut transport = RtuTransport::new(DriveConfig::default());
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.read_holding_registers(0, 2),
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            transport.write_register(0, 0x0476),
            Err(TransportError::NotConnected)
        ));
        // Closing an unopened transport is a no-op
        transport.close();
    }

    #[test]
    fn test_connect_to_missing_port_fails() {
        let config = DriveConfig {
            port_name: "/dev/vfdctl-does-not-exist".to_string(),
            ..DriveConfig::default()
        };
        let mut transport = RtuTransport::new(config);
        assert!(matches!(
            transport.connect(),
            Err(TransportError::Open { .. })
        ));
        assert!(!transport.is_connected());
    }
}
