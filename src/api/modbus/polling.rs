//! Status polling and bulk register dump as lazy iterators.
//!
//! Each `next()` performs one cycle of blocking exchanges and yields its
//! outcome; nothing here sleeps. Cadence is layered on with [`Paced`], so a
//! host can drive the iterators from a timer, a scheduler or a test harness.
//! A [`CancelToken`] is checked at the start of every cycle, which puts the
//! cancellation point at the inter-cycle boundary.

use serde::{Serialize, Serializer};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use super::{
    diagnostic::{evaluate, Diagnosis},
    error::DriveError,
    registers::{register, RegisterName},
    session::Session,
    traits::{ModbusTransport, StatusHandler, SweepHandler},
};

/// Shared stop flag, settable from another thread or a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// One successful status cycle.
///
/// Only the status word is read per cycle, so a faulted sample holds
/// [`FaultCode::Unavailable`](super::diagnostic::FaultCode::Unavailable) in
/// memory. Serialized output leaves the fault code out entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSample {
    pub timestamp: String,
    pub frequency_raw: u16,
    pub current_raw: u16,
    #[serde(serialize_with = "serialize_status_only")]
    pub diagnosis: Diagnosis,
}

impl StatusSample {
    pub fn frequency_hz(&self) -> f64 {
        register(RegisterName::Frequency).to_physical(self.frequency_raw)
    }

    pub fn current_a(&self) -> f64 {
        register(RegisterName::Current).to_physical(self.current_raw)
    }
}

/// Live status line, e.g. `Freq:  50.00 Hz | Amp:  4.20 A | Status: RUNNING`
impl fmt::Display for StatusSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Freq: {:6.2} Hz | Amp: {:5.2} A | Status: {:<15}",
            self.frequency_hz(),
            self.current_a(),
            self.diagnosis.to_string()
        )
    }
}

/// One address of the bulk register dump. Like [`StatusSample`], it carries
/// no fault code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRecord {
    pub timestamp: String,
    pub address: u16,
    pub value: u16,
    #[serde(serialize_with = "serialize_status_only")]
    pub diagnosis: Diagnosis,
}

impl fmt::Display for SweepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "register -> {} | data -> {} | {}",
            self.address, self.value, self.diagnosis
        )
    }
}

/// `{"status_word": 8, "state": "FAULT", "warning": false}`
fn serialize_status_only<S: Serializer>(
    diagnosis: &Diagnosis,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct StatusView {
        status_word: u16,
        state: &'static str,
        warning: bool,
    }

    StatusView {
        status_word: diagnosis.status_word,
        state: diagnosis.state.token(),
        warning: diagnosis.warning,
    }
    .serialize(serializer)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Read frequency + current and the status word once. The fault code is not
/// read here.
pub fn poll_status<T: ModbusTransport>(
    session: &mut Session<T>,
) -> Result<StatusSample, DriveError> {
    let frequency = register(RegisterName::Frequency);
    let current = register(RegisterName::Current);
    debug_assert_eq!(current.address, frequency.address + 1);

    let values = session.read_holding_registers(frequency.address, 2)?;
    let status_word = session.read_register(register(RegisterName::StatusWord).address)?;

    Ok(StatusSample {
        timestamp: now(),
        frequency_raw: values[0],
        current_raw: values[1],
        diagnosis: evaluate(status_word, None),
    })
}

/// Read one register plus the status word.
pub fn read_sweep_record<T: ModbusTransport>(
    session: &mut Session<T>,
    address: u16,
) -> Result<SweepRecord, DriveError> {
    let value = session.read_register(address)?;
    let status_word = session.read_register(register(RegisterName::StatusWord).address)?;

    Ok(SweepRecord {
        timestamp: now(),
        address,
        value,
        diagnosis: evaluate(status_word, None),
    })
}

/// Endless status polling. Failed cycles are yielded as `Err` and polling
/// goes on; only the cancel token ends the sequence.
pub struct StatusPoller<'s, T: ModbusTransport> {
    session: &'s mut Session<T>,
    cancel: CancelToken,
}

impl<'s, T: ModbusTransport> StatusPoller<'s, T> {
    pub fn new(session: &'s mut Session<T>, cancel: CancelToken) -> Self {
        Self { session, cancel }
    }
}

impl<T: ModbusTransport> Iterator for StatusPoller<'_, T> {
    type Item = Result<StatusSample, DriveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancel.is_cancelled() {
            log::info!("Status polling cancelled");
            return None;
        }
        Some(poll_status(self.session))
    }
}

/// Bulk dump over `0..=last_address`.
///
/// Ends right after yielding the first record whose state is FAULT. Failed
/// addresses are yielded as `Err` and the sweep moves on.
pub struct RegisterSweep<'s, T: ModbusTransport> {
    session: &'s mut Session<T>,
    cancel: CancelToken,
    next_address: Option<u16>,
    last_address: u16,
}

impl<'s, T: ModbusTransport> RegisterSweep<'s, T> {
    pub fn new(session: &'s mut Session<T>, last_address: u16, cancel: CancelToken) -> Self {
        Self {
            session,
            cancel,
            next_address: Some(0),
            last_address,
        }
    }
}

impl<T: ModbusTransport> Iterator for RegisterSweep<'_, T> {
    type Item = Result<SweepRecord, DriveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancel.is_cancelled() {
            log::info!("Register sweep cancelled");
            return None;
        }

        let address = self.next_address?;
        self.next_address = (address < self.last_address).then(|| address + 1);

        let item = read_sweep_record(self.session, address);
        if let Ok(record) = &item {
            if record.diagnosis.is_fault() {
                log::warn!("Drive reports FAULT at register {address}, stopping sweep");
                self.next_address = None;
            }
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next_address {
            Some(address) => (0, Some(usize::from(self.last_address - address) + 1)),
            None => (0, Some(0)),
        }
    }
}

/// Waits between cycles.
pub trait Pacer {
    fn pause(&mut self, interval: Duration);
}

/// Blocks the current thread for the interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Pacer for ThreadSleep {
    fn pause(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// Iterator adapter inserting a fixed delay before every item but the first.
///
/// No delay is taken once the inner iterator reports an upper bound of zero,
/// so a finished sweep ends without waiting. An unbounded sequence still
/// pauses before the pull that observes cancellation.
pub struct Paced<I, P> {
    inner: I,
    pacer: P,
    interval: Duration,
    started: bool,
}

impl<I: Iterator, P: Pacer> Iterator for Paced<I, P> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.started && self.inner.size_hint().1 != Some(0) {
            self.pacer.pause(self.interval);
        }
        self.started = true;
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pub trait PacedExt: Iterator + Sized {
    fn paced<P: Pacer>(self, interval: Duration, pacer: P) -> Paced<Self, P> {
        Paced {
            inner: self,
            pacer,
            interval,
            started: false,
        }
    }
}

impl<I: Iterator> PacedExt for I {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonitorSummary {
    pub samples: usize,
    pub skipped: usize,
}

/// Feed status cycles to `handler` until the sequence ends.
pub fn run_monitor<I, H>(cycles: I, handler: &mut H) -> MonitorSummary
where
    I: IntoIterator<Item = Result<StatusSample, DriveError>>,
    H: StatusHandler + ?Sized,
{
    let mut summary = MonitorSummary::default();
    for cycle in cycles {
        match cycle {
            Ok(sample) => {
                summary.samples += 1;
                handler.handle_sample(&sample);
            }
            Err(err) => {
                summary.skipped += 1;
                log::warn!("Status cycle skipped: {err}");
                handler.handle_skipped(&err);
            }
        }
    }
    summary
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub records: usize,
    pub failed: usize,
    /// Address at which a FAULT stopped the sweep.
    pub fault_at: Option<u16>,
}

/// Feed sweep records to `handler` until the sweep ends.
pub fn run_sweep<I, H>(records: I, handler: &mut H) -> SweepSummary
where
    I: IntoIterator<Item = Result<SweepRecord, DriveError>>,
    H: SweepHandler + ?Sized,
{
    let mut summary = SweepSummary::default();
    for item in records {
        match item {
            Ok(record) => {
                summary.records += 1;
                if record.diagnosis.is_fault() {
                    summary.fault_at = Some(record.address);
                }
                handler.handle_record(&record);
            }
            Err(err) => {
                summary.failed += 1;
                log::warn!("Sweep read failed: {err}");
                handler.handle_failed(&err);
            }
        }
    }
    summary
}
