use std::io::{ErrorKind, Read};

use rmodbus::{guess_response_frame_len, ModbusProto};

use crate::api::modbus::TransportError;

// Slave address, function code and the first payload byte are enough to
// size any RTU response, exceptions included.
const HEADER_LEN: usize = 3;

/// Read one complete RTU response frame from `port`.
///
/// Relies on the port's own read timeout; a timeout at any point of the frame
/// is reported as [`TransportError::Timeout`].
pub fn read_modbus_frame(
    port: &mut dyn serialport::SerialPort,
) -> Result<Vec<u8>, TransportError> {
    let mut frame = vec![0u8; HEADER_LEN];
    read_exact_timed(port, &mut frame)?;

    let len = guess_response_frame_len(&frame, ModbusProto::Rtu)
        .map_err(|e| TransportError::Protocol(format!("{e:?}")))? as usize;
    if len < HEADER_LEN {
        return Err(TransportError::Protocol(format!(
            "invalid frame length {len}"
        )));
    }

    frame.resize(len, 0);
    read_exact_timed(port, &mut frame[HEADER_LEN..])?;

    log::debug!(
        "Received Modbus response: {}",
        frame
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    );

    Ok(frame)
}

fn read_exact_timed(
    port: &mut dyn serialport::SerialPort,
    buf: &mut [u8],
) -> Result<(), TransportError> {
    port.read_exact(buf).map_err(|err| match err.kind() {
        ErrorKind::TimedOut | ErrorKind::UnexpectedEof => TransportError::Timeout(port.timeout()),
        _ => TransportError::Io(err),
    })
}
