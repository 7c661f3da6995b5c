#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet, VecDeque},
    rc::Rc,
    time::Duration,
};

use vfdctl::{Connector, DriveClient, DriveConfig, ModbusTransport, Pacer, TransportError};

pub const STATUS_WORD: u16 = 50;
pub const FAULT_CODE: u16 = 102;

/// One call observed by the scripted transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Connect,
    Read { start: u16, count: u16 },
    Write { address: u16, value: u16 },
    Close,
}

/// In-memory drive that records every call in a log shared by all clones.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    log: Rc<RefCell<Vec<Op>>>,
    registers: HashMap<u16, u16>,
    /// Values returned by successive status word reads; falls back to
    /// `registers[50]` once drained.
    status_script: Rc<RefCell<VecDeque<u16>>>,
    failing_addresses: HashSet<u16>,
    /// Zero-based indices of read calls that time out.
    failing_read_calls: HashSet<usize>,
    read_calls: Rc<Cell<usize>>,
    refuse_connect: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(mut self, address: u16, value: u16) -> Self {
        self.registers.insert(address, value);
        self
    }

    pub fn with_status_script(self, words: &[u16]) -> Self {
        self.status_script.borrow_mut().extend(words.iter().copied());
        self
    }

    pub fn with_failing_address(mut self, address: u16) -> Self {
        self.failing_addresses.insert(address);
        self
    }

    pub fn with_failing_read_call(mut self, index: usize) -> Self {
        self.failing_read_calls.insert(index);
        self
    }

    pub fn refusing_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    pub fn ops(&self) -> Vec<Op> {
        self.log.borrow().clone()
    }

    pub fn reads(&self) -> Vec<(u16, u16)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Read { start, count } => Some((start, count)),
                _ => None,
            })
            .collect()
    }

    pub fn writes(&self) -> Vec<(u16, u16)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write { address, value } => Some((address, value)),
                _ => None,
            })
            .collect()
    }

    pub fn closes(&self) -> usize {
        self.ops().iter().filter(|op| **op == Op::Close).count()
    }

    fn value_at(&self, address: u16) -> u16 {
        if address == STATUS_WORD {
            if let Some(word) = self.status_script.borrow_mut().pop_front() {
                return word;
            }
        }
        self.registers.get(&address).copied().unwrap_or(0)
    }
}

impl ModbusTransport for ScriptedTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.log.borrow_mut().push(Op::Connect);
        if self.refuse_connect {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }

    fn read_holding_registers(
        &mut self,
        start: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.log.borrow_mut().push(Op::Read { start, count });
        let call = self.read_calls.get();
        self.read_calls.set(call + 1);

        let failing = self.failing_read_calls.contains(&call)
            || (start..start + count).any(|a| self.failing_addresses.contains(&a));
        if failing {
            return Err(TransportError::Timeout(Duration::from_millis(2000)));
        }
        Ok((start..start + count).map(|a| self.value_at(a)).collect())
    }

    fn write_register(&mut self, address: u16, value: u16) -> Result<(), TransportError> {
        self.log.borrow_mut().push(Op::Write { address, value });
        if self.failing_addresses.contains(&address) {
            return Err(TransportError::Timeout(Duration::from_millis(2000)));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().push(Op::Close);
    }
}

/// Client whose sessions all run on clones of `transport`.
pub fn scripted_client(
    transport: &ScriptedTransport,
    config: DriveConfig,
) -> DriveClient<impl Connector<Transport = ScriptedTransport>> {
    let transport = transport.clone();
    DriveClient::with_connector(config, move |_: &DriveConfig| {
        Ok::<_, TransportError>(transport.clone())
    })
}

/// Pacer that never sleeps, counting the pauses it was asked for.
#[derive(Clone, Default)]
pub struct CountingPacer {
    pub pauses: Rc<Cell<usize>>,
}

impl Pacer for CountingPacer {
    fn pause(&mut self, _interval: Duration) {
        self.pauses.set(self.pauses.get() + 1);
    }
}
