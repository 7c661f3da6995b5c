use rmodbus::{client::ModbusRequest, ModbusProto};

use crate::api::modbus::TransportError;

/// Build a frame to write a single holding register (function 0x06)
pub fn generate_pull_set_holding_request(
    id: u8,
    address: u16,
    value: u16,
) -> Result<(ModbusRequest, Vec<u8>), TransportError> {
    let mut request = ModbusRequest::new(id, ModbusProto::Rtu);
    let mut raw = Vec::new();
    request
        .generate_set_holding(address, value, &mut raw)
        .map_err(|e| TransportError::Protocol(format!("{e:?}")))?;
    Ok((request, raw))
}

/// Check the echo of a 0x06 write
pub fn parse_pull_set_holding(
    request: &mut ModbusRequest,
    response: &[u8],
) -> Result<(), TransportError> {
    request
        .parse_ok(response)
        .map_err(|e| TransportError::Protocol(format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_request_frame() {
        let (_, raw) = generate_pull_set_holding_request(1, 0, 0x0477).unwrap();
        assert_eq!(raw.len(), 8);
        assert_eq!(&raw[..6], &[0x01, 0x06, 0x00, 0x00, 0x04, 0x77]);
    }
}
