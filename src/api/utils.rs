use crate::api::modbus::{DriveConfig, TransportError};

/// Open the drive's serial port with the configured line settings and
/// response timeout, enabling exclusive access on Unix systems.
pub fn open_serial_port(
    config: &DriveConfig,
) -> Result<Box<dyn serialport::SerialPort>, TransportError> {
    let port = config.port_name.as_str();
    let builder = serialport::new(port, config.baud_rate)
        .data_bits(config.serial_data_bits()?)
        .parity(config.parity.into())
        .stop_bits(config.serial_stop_bits()?)
        .flow_control(serialport::FlowControl::None)
        .timeout(config.timeout());

    #[cfg(unix)]
    {
        let mut handle = builder
            .open_native()
            .map_err(|source| TransportError::Open {
                port: port.to_string(),
                source,
            })?;
        handle
            .set_exclusive(true)
            .map_err(|source| TransportError::Open {
                port: port.to_string(),
                source,
            })?;
        Ok(Box::new(handle))
    }

    #[cfg(not(unix))]
    {
        builder.open().map_err(|source| TransportError::Open {
            port: port.to_string(),
            source,
        })
    }
}
