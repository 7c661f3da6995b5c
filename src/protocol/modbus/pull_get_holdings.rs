use rmodbus::{client::ModbusRequest, ModbusProto};

use crate::api::modbus::TransportError;

/// Build a frame to read holding registers (function 0x03)
pub fn generate_pull_get_holdings_request(
    id: u8,
    start_address: u16,
    count: u16,
) -> Result<(ModbusRequest, Vec<u8>), TransportError> {
    let mut request = ModbusRequest::new(id, ModbusProto::Rtu);
    let mut raw = Vec::new();
    request
        .generate_get_holdings(start_address, count, &mut raw)
        .map_err(|e| TransportError::Protocol(format!("{e:?}")))?;
    Ok((request, raw))
}

/// Validate a 0x03 response (CRC, exception, byte count) and decode it
pub fn parse_pull_get_holdings(
    request: &mut ModbusRequest,
    response: &[u8],
    count: u16,
) -> Result<Vec<u16>, TransportError> {
    request
        .parse_ok(response)
        .map_err(|e| TransportError::Protocol(format!("{e:?}")))?;

    if response.len() < 5 {
        return Err(TransportError::Protocol(format!(
            "response too short: {} bytes",
            response.len()
        )));
    }

    let byte_count = response[2] as usize;
    if byte_count != count as usize * 2 || response.len() != byte_count + 5 {
        return Err(TransportError::Protocol(format!(
            "byte count mismatch: expected {}, got {byte_count}",
            count as usize * 2
        )));
    }

    let values = response[3..response.len() - 2]
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect::<Vec<_>>();
    log::debug!("Received holding registers: {values:?}");

    Ok(values)
}
