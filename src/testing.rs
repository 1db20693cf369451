//! Test doubles shared by the device and control-surface tests.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::input::{AbsAxisInfo, Axis, InputSink, RegistrationError};
use crate::interface::Lis3dfInterface;
use crate::offset::{OffsetStore, StoreError, StoredOffset};
use crate::registers::{EXPECTED_WHO_AM_I, REG_OUT_X, REG_WHO_AM_I};
use crate::sample::{AxisOffset, Motion};

/// Polls `condition` until it holds or five seconds pass.
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BusFault;

type Gate = (Sender<()>, Receiver<()>);

#[derive(Debug, Default)]
struct BusLog {
    registers: HashMap<u8, u8>,
    writes: Vec<(u8, u8)>,
    reads: usize,
    fail_reads: bool,
    fail_writes: bool,
}

/// Register bus backed by a map, recording every write.
pub(crate) struct MockBus {
    log: Arc<Mutex<BusLog>>,
    gate: Option<Gate>,
}

/// Inspection handle for a [`MockBus`].
#[derive(Clone)]
pub(crate) struct BusHandle {
    log: Arc<Mutex<BusLog>>,
}

/// Releases a call parked by [`MockBus::gated`] or [`MemoryStore::gated`].
pub(crate) struct GateHandle {
    pub entered: Receiver<()>,
    pub release: Sender<()>,
}

impl MockBus {
    /// A bus whose identity register reports a LIS3DF.
    pub fn new() -> (Self, BusHandle) {
        let mut log = BusLog::default();
        log.registers.insert(REG_WHO_AM_I, EXPECTED_WHO_AM_I);
        let log = Arc::new(Mutex::new(log));
        let bus = Self {
            log: Arc::clone(&log),
            gate: None,
        };
        (bus, BusHandle { log })
    }

    /// Blocks the first `OUT_X` read until the test releases it.
    pub fn gated(mut self) -> (Self, GateHandle) {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        self.gate = Some((entered_tx, release_rx));
        (
            self,
            GateHandle {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }
}

impl Lis3dfInterface for MockBus {
    type Error = BusFault;

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), BusFault> {
        let mut log = self.log.lock().unwrap();
        if log.fail_writes {
            return Err(BusFault);
        }
        log.writes.push((register, value));
        log.registers.insert(register, value);
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, BusFault> {
        if register == REG_OUT_X {
            if let Some((entered, release)) = self.gate.take() {
                entered.send(()).unwrap();
                release.recv().unwrap();
            }
        }

        let mut log = self.log.lock().unwrap();
        log.reads += 1;
        if log.fail_reads {
            return Err(BusFault);
        }
        Ok(log.registers.get(&register).copied().unwrap_or(0))
    }
}

impl BusHandle {
    pub fn set(&self, register: u8, value: u8) {
        self.log.lock().unwrap().registers.insert(register, value);
    }

    pub fn writes_to(&self, register: u8) -> Vec<u8> {
        self.log
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|(reg, _)| *reg == register)
            .map(|(_, value)| *value)
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.log.lock().unwrap().writes.len()
    }

    pub fn reads(&self) -> usize {
        self.log.lock().unwrap().reads
    }

    pub fn fail_reads(&self, fail: bool) {
        self.log.lock().unwrap().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.log.lock().unwrap().fail_writes = fail;
    }
}

#[derive(Debug, Default)]
struct SinkLog {
    registered: bool,
    refuse: bool,
    pending: Motion,
    frames: Vec<Motion>,
}

/// Input sink recording registrations and completed frames.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
}

impl RecordingSink {
    pub fn refusing() -> Self {
        let sink = Self::default();
        sink.log.lock().unwrap().refuse = true;
        sink
    }

    pub fn is_registered(&self) -> bool {
        self.log.lock().unwrap().registered
    }

    pub fn frames(&self) -> Vec<Motion> {
        self.log.lock().unwrap().frames.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.log.lock().unwrap().frames.len()
    }
}

impl InputSink for RecordingSink {
    fn register(&mut self, axes: &[AbsAxisInfo]) -> Result<(), RegistrationError> {
        let mut log = self.log.lock().unwrap();
        if log.refuse || axes.len() != 3 {
            return Err(RegistrationError);
        }
        log.registered = true;
        Ok(())
    }

    fn unregister(&mut self) {
        self.log.lock().unwrap().registered = false;
    }

    fn report_abs(&mut self, axis: Axis, value: i32) {
        let mut log = self.log.lock().unwrap();
        match axis {
            Axis::X => log.pending.x = value,
            Axis::Y => log.pending.y = value,
            Axis::Z => log.pending.z = value,
        }
    }

    fn sync(&mut self) {
        let mut log = self.log.lock().unwrap();
        let frame = log.pending;
        log.frames.push(frame);
    }
}

#[derive(Debug, Default)]
struct StoreLog {
    value: Option<AxisOffset>,
    failure: Option<StoreError>,
    limit: Option<i16>,
    requests: Vec<AxisOffset>,
}

/// In-memory offset store; clones share state.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStore {
    log: Arc<Mutex<StoreLog>>,
    gate: Arc<Mutex<Option<Gate>>>,
}

impl MemoryStore {
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn with_offset(offset: AxisOffset) -> Self {
        let store = Self::default();
        store.log.lock().unwrap().value = Some(offset);
        store
    }

    pub fn fail_with(&self, failure: Option<StoreError>) {
        self.log.lock().unwrap().failure = failure;
    }

    /// Clamps every persisted component to `±limit`.
    pub fn limit(&self, limit: i16) {
        self.log.lock().unwrap().limit = Some(limit);
    }

    pub fn value(&self) -> Option<AxisOffset> {
        self.log.lock().unwrap().value
    }

    pub fn requests(&self) -> Vec<AxisOffset> {
        self.log.lock().unwrap().requests.clone()
    }

    /// Blocks the next `set` until the test releases it.
    pub fn gated(&self) -> GateHandle {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        *self.gate.lock().unwrap() = Some((entered_tx, release_rx));
        GateHandle {
            entered: entered_rx,
            release: release_tx,
        }
    }
}

impl OffsetStore for MemoryStore {
    fn get(&mut self) -> Result<StoredOffset, StoreError> {
        let log = self.log.lock().unwrap();
        if let Some(failure) = log.failure {
            return Err(failure);
        }
        Ok(log.value.map_or(StoredOffset::NotInitialized, StoredOffset::Value))
    }

    fn set(&mut self, offset: AxisOffset) -> Result<AxisOffset, StoreError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }

        let mut log = self.log.lock().unwrap();
        log.requests.push(offset);
        if let Some(failure) = log.failure {
            return Err(failure);
        }
        let confirmed = match log.limit {
            Some(limit) => AxisOffset::new(
                offset.x.clamp(-limit, limit),
                offset.y.clamp(-limit, limit),
                offset.z.clamp(-limit, limit),
            ),
            None => offset,
        };
        log.value = Some(confirmed);
        Ok(confirmed)
    }
}
