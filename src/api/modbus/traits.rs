/// Core API traits - abstract interfaces without serial port dependencies
///
/// `ModbusTransport` is the request/response capability the drive layer is
/// built on. The handler traits receive the output of the polling iterators;
/// the CLI implements them for terminal rendering.
use super::{
    error::{DriveError, TransportError},
    polling::{StatusSample, SweepRecord},
};

/// Blocking Modbus master bound to one slave device.
///
/// Every call is a single exchange: the caller waits for the response or the
/// transport's fixed timeout. Implementations are not expected to retry.
pub trait ModbusTransport {
    fn connect(&mut self) -> Result<(), TransportError>;

    fn read_holding_registers(&mut self, start: u16, count: u16)
        -> Result<Vec<u16>, TransportError>;

    fn write_register(&mut self, address: u16, value: u16) -> Result<(), TransportError>;

    fn close(&mut self);
}

/// Consumer of status polling cycles
pub trait StatusHandler {
    fn handle_sample(&mut self, sample: &StatusSample);

    /// Called for a cycle whose reads failed. The loop continues afterwards.
    fn handle_skipped(&mut self, _error: &DriveError) {}
}

/// Consumer of bulk register dump records
pub trait SweepHandler {
    fn handle_record(&mut self, record: &SweepRecord);

    fn handle_failed(&mut self, _error: &DriveError) {}
}

impl<F: FnMut(&StatusSample)> StatusHandler for F {
    fn handle_sample(&mut self, sample: &StatusSample) {
        self(sample)
    }
}

impl<F: FnMut(&SweepRecord)> SweepHandler for F {
    fn handle_record(&mut self, record: &SweepRecord) {
        self(record)
    }
}

/// Logging handler that logs samples and records
pub struct LoggingHandler;

impl StatusHandler for LoggingHandler {
    fn handle_sample(&mut self, sample: &StatusSample) {
        log::info!("{sample}");
    }

    fn handle_skipped(&mut self, error: &DriveError) {
        log::warn!("Skipping status cycle: {error}");
    }
}

impl SweepHandler for LoggingHandler {
    fn handle_record(&mut self, record: &SweepRecord) {
        log::info!("{record}");
    }

    fn handle_failed(&mut self, error: &DriveError) {
        log::warn!("Sweep read failed: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::modbus::{
        diagnostic::evaluate,
        polling::{run_monitor, run_sweep},
    };

    #[test]
    fn test_logging_handler_consumes_everything() {
        let sample = StatusSample {
            timestamp: String::new(),
            frequency_raw: 1000,
            current_raw: 5,
            diagnosis: evaluate(0x0004, None),
        };
        let summary = run_monitor(
            vec![Ok(sample), Err(DriveError::FaultCodeUnavailable)],
            &mut LoggingHandler,
        );
        assert_eq!((summary.samples, summary.skipped), (1, 1));

        let record = SweepRecord {
            timestamp: String::new(),
            address: 4,
            value: 12,
            diagnosis: evaluate(0x0008, None),
        };
        let summary = run_sweep(vec![Ok(record)], &mut LoggingHandler);
        assert_eq!(summary.fault_at, Some(4));
    }

    #[test]
    fn test_closure_as_sweep_handler() {
        let records = (0..3u16).map(|address| {
            Ok(SweepRecord {
                timestamp: String::new(),
                address,
                value: address * 10,
                diagnosis: evaluate(0, None),
            })
        });
        let mut values = Vec::new();
        let summary = run_sweep(records, &mut |record: &SweepRecord| values.push(record.value));
        assert_eq!(summary.records, 3);
        assert_eq!(values, vec![0, 10, 20]);
    }
}
