//! High-level LIS3DF device driver implementation.
//!
//! One [`Lis3df`] owns the device record for a single attached sensor. A coarse mutex guards
//! the whole record (bus, sink, flags, offset cache, filter) and is shared by the control path,
//! the power path and the background sampler. Starting and stopping the sampler is serialized
//! through a separate task slot that is always taken before the record lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::SampleFilter;
use crate::input::{ABS_AXES, Axis, InputSink};
use crate::interface::Lis3dfInterface;
use crate::interface::i2c::I2cInterface;
use crate::log::{debug, error, info, trace, warn};
use crate::offset::{OffsetStore, StoreError, StoredOffset};
use crate::registers::{
    CONTROL_REGISTERS,
    CtrlReg1,
    EXPECTED_WHO_AM_I,
    REG_OUT_X,
    REG_OUT_Y,
    REG_OUT_Z,
    REG_WHO_AM_I,
    Register,
};
use crate::sample::{AxisOffset, AxisSample};
use crate::sampler::{Periodic, SamplerTask, SamplingPeriod, TaskSlot};
use embedded_hal::i2c::I2c;

/// Observable mode of the device state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMode {
    /// Not logically enabled; the suspend flag may still be tracked.
    Disabled,
    /// Enabled and sampling.
    Active,
    /// Enabled but paused by power management.
    Suspended,
}

/// Copy of the guarded device record taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateSnapshot {
    /// Logically enabled by the control surface.
    pub enabled: bool,
    /// Paused by power management.
    pub suspended: bool,
    /// Cached calibration offset.
    pub offset: AxisOffset,
    /// Most recent filter output.
    pub last_filtered: AxisSample,
    /// Filter fill counter.
    pub filter_fill: usize,
}

impl StateSnapshot {
    /// Collapses the flags into the state machine mode.
    pub fn mode(&self) -> DeviceMode {
        match (self.enabled, self.suspended) {
            (false, _) => DeviceMode::Disabled,
            (true, false) => DeviceMode::Active,
            (true, true) => DeviceMode::Suspended,
        }
    }
}

struct DeviceState<IFACE, SINK> {
    interface: IFACE,
    sink: SINK,
    enabled: bool,
    suspended: bool,
    offset: AxisOffset,
    last_filtered: AxisSample,
    filter: SampleFilter,
}

impl<IFACE, SINK> DeviceState<IFACE, SINK> {
    fn is_sampling(&self) -> bool {
        self.enabled && !self.suspended
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            enabled: self.enabled,
            suspended: self.suspended,
            offset: self.offset,
            last_filtered: self.last_filtered,
            filter_fill: self.filter.filled(),
        }
    }
}

impl<IFACE, SINK> DeviceState<IFACE, SINK>
where
    IFACE: Lis3dfInterface,
    SINK: InputSink,
{
    fn write_control(&mut self, ctrl: CtrlReg1) {
        if self
            .interface
            .write_register(CtrlReg1::ADDRESS, u8::from(ctrl))
            .is_err()
        {
            warn!("CTRL_REG1 write failed");
        }
    }

    /// Reads one output byte; a failed read counts as zero.
    fn read_output(&mut self, register: u8) -> u8 {
        self.interface.read_register(register).unwrap_or_else(|_| {
            debug!("output register {} read failed", register);
            0
        })
    }

    /// One read-filter-publish cycle.
    fn sample(&mut self) {
        let out_x = self.read_output(REG_OUT_X);
        let out_y = self.read_output(REG_OUT_Y);
        let out_z = self.read_output(REG_OUT_Z);
        let sample = AxisSample::from_output_registers(out_x, out_y, out_z);

        let Some(average) = self.filter.push(sample) else {
            trace!("filter warming up: {}", self.filter.filled());
            return;
        };

        self.last_filtered = average;
        let motion = average.calibrated(self.offset);
        self.sink.report_abs(Axis::X, motion.x);
        self.sink.report_abs(Axis::Y, motion.y);
        self.sink.report_abs(Axis::Z, motion.z);
        self.sink.sync();
    }
}

struct Shared<IFACE, SINK> {
    state: Mutex<DeviceState<IFACE, SINK>>,
    period: SamplingPeriod,
    enable_word: CtrlReg1,
}

impl<IFACE, SINK> Shared<IFACE, SINK> {
    fn lock(&self) -> MutexGuard<'_, DeviceState<IFACE, SINK>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<IFACE, SINK> Periodic for Shared<IFACE, SINK>
where
    IFACE: Lis3dfInterface + Send + 'static,
    SINK: InputSink + Send + 'static,
{
    fn period(&self) -> Duration {
        self.period.get()
    }

    fn run_cycle(&self) -> bool {
        let mut state = self.lock();
        if !state.is_sampling() {
            return false;
        }
        state.sample();
        // Decided under the lock so a racing disable cannot buy an extra cycle.
        state.is_sampling()
    }
}

/// Driver core for one attached LIS3DF.
pub struct Lis3df<IFACE, SINK> {
    shared: Arc<Shared<IFACE, SINK>>,
    sampler: TaskSlot,
}

impl<IFACE, SINK> Lis3df<IFACE, SINK> {
    // ==================================================================
    // == Observation ====================================================
    // ==================================================================
    /// Copies out the guarded device record.
    pub fn snapshot(&self) -> StateSnapshot {
        self.shared.lock().snapshot()
    }

    /// Returns the logical enable flag.
    pub fn is_enabled(&self) -> bool {
        self.shared.lock().enabled
    }

    /// Whether a sampler task is currently scheduled.
    pub fn is_sampling(&self) -> bool {
        self.sampler
            .lock()
            .as_ref()
            .is_some_and(SamplerTask::is_running)
    }

    // ==================================================================
    // == Sampling Period ================================================
    // ==================================================================
    /// Current interval between sampler cycles.
    pub fn sampling_period(&self) -> Duration {
        self.shared.period.get()
    }

    /// Applies a requested delay in milliseconds and returns the effective period.
    ///
    /// The running sampler picks the new value up at its next reschedule.
    pub fn set_sampling_period(&self, requested_ms: u32) -> Duration {
        let period = self.shared.period.set_delay_ms(requested_ms);
        info!("sampling period set to {} ms", self.shared.period.millis());
        period
    }

    // ==================================================================
    // == Calibration Offset =============================================
    // ==================================================================
    /// Returns the cached calibration offset.
    pub fn axis_offset(&self) -> AxisOffset {
        self.shared.lock().offset
    }

    /// Refreshes the cache from `store`.
    ///
    /// A store that was never initialised is reset to zero. On failure the cache keeps its
    /// previous value.
    pub fn load_axis_offset<S: OffsetStore>(
        &self,
        store: &mut S,
    ) -> core::result::Result<AxisOffset, StoreError> {
        match store.get()? {
            StoredOffset::NotInitialized => {
                info!("offset store not initialised, persisting zero");
                self.reset_axis_offset(store)
            }
            StoredOffset::Value(offset) => {
                self.shared.lock().offset = offset;
                Ok(offset)
            }
        }
    }

    /// Adds `delta` to the cached offset and persists the sum.
    pub fn adjust_axis_offset<S: OffsetStore>(
        &self,
        store: &mut S,
        delta: AxisOffset,
    ) -> core::result::Result<AxisOffset, StoreError> {
        let requested = self.axis_offset().wrapping_add(delta);
        self.persist_axis_offset(store, requested)
    }

    /// Persists a zero offset.
    pub fn reset_axis_offset<S: OffsetStore>(
        &self,
        store: &mut S,
    ) -> core::result::Result<AxisOffset, StoreError> {
        self.persist_axis_offset(store, AxisOffset::ZERO)
    }

    // The store round-trip happens without the record lock; only the confirmed value is cached.
    fn persist_axis_offset<S: OffsetStore>(
        &self,
        store: &mut S,
        requested: AxisOffset,
    ) -> core::result::Result<AxisOffset, StoreError> {
        match store.set(requested) {
            Ok(confirmed) => {
                self.shared.lock().offset = confirmed;
                info!(
                    "axis offset stored: {} {} {}",
                    confirmed.x,
                    confirmed.y,
                    confirmed.z
                );
                Ok(confirmed)
            }
            Err(err) => {
                warn!("axis offset not stored");
                Err(err)
            }
        }
    }
}

impl<I2C, SINK, CommE> Lis3df<I2cInterface<I2C>, SINK>
where
    I2C: I2c<Error = CommE> + Send + 'static,
    SINK: InputSink + Send + 'static,
{
    // ==================================================================
    // == I2C Convenience Constructors ===================================
    // ==================================================================
    /// Convenience constructor for I2C transports.
    pub fn attach_i2c<S: OffsetStore>(
        i2c: I2C,
        address: u8,
        sink: SINK,
        store: &mut S,
        config: Config,
    ) -> Result<Self, CommE> {
        Self::attach(I2cInterface::new(i2c, address), sink, store, config)
    }
}

impl<IFACE, SINK, CommE> Lis3df<IFACE, SINK>
where
    IFACE: Lis3dfInterface<Error = CommE> + Send + 'static,
    SINK: InputSink + Send + 'static,
{
    // ==================================================================
    // == Attach & Detach ================================================
    // ==================================================================
    /// Probes the part, registers the input endpoint and loads the calibration offset.
    ///
    /// The device starts disabled. On failure everything acquired so far is released.
    pub fn attach<S: OffsetStore>(
        mut interface: IFACE,
        mut sink: SINK,
        store: &mut S,
        config: Config,
    ) -> Result<Self, CommE> {
        config.validate().map_err(|_| Error::InvalidConfig)?;

        match interface.read_register(REG_WHO_AM_I) {
            Ok(EXPECTED_WHO_AM_I) => {}
            Ok(id) => {
                warn!("unexpected WHO_AM_I value {}", id);
                return Err(Error::DeviceNotPresent);
            }
            Err(_) => {
                warn!("WHO_AM_I read failed");
                return Err(Error::DeviceNotPresent);
            }
        }

        sink.register(&ABS_AXES).map_err(|_| {
            warn!("input endpoint registration failed");
            Error::InputUnavailable
        })?;

        for register in CONTROL_REGISTERS {
            if let Err(err) = interface.write_register(register, 0x00) {
                warn!("clearing control register {} failed", register);
                sink.unregister();
                return Err(Error::Interface(err));
            }
        }

        let device = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(DeviceState {
                    interface,
                    sink,
                    enabled: false,
                    suspended: false,
                    offset: AxisOffset::ZERO,
                    last_filtered: AxisSample::ZERO,
                    filter: SampleFilter::new(),
                }),
                period: SamplingPeriod::from_millis(config.sampling_period_ms),
                enable_word: config.enable_word(),
            }),
            sampler: TaskSlot::default(),
        };

        if device.load_axis_offset(store).is_err() {
            warn!("initial offset load failed, using zero");
        }

        info!("LIS3DF attached");
        Ok(device)
    }

    /// Stops sampling, withdraws the input endpoint and returns the bus and sink.
    ///
    /// Draining the sampler releases its handle on the device record. If the record is still
    /// shared anyway, the device is handed back stopped and still attached.
    pub fn detach(self) -> core::result::Result<(IFACE, SINK), Self> {
        let Self { shared, sampler } = self;
        drop(sampler);

        let shared = Arc::try_unwrap(shared).map_err(|shared| {
            error!("device record still shared, detach refused");
            Self {
                shared,
                sampler: TaskSlot::default(),
            }
        })?;

        let DeviceState {
            interface,
            mut sink,
            ..
        } = shared.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        sink.unregister();
        info!("LIS3DF detached");
        Ok((interface, sink))
    }

    // ==================================================================
    // == State Machine ==================================================
    // ==================================================================
    /// `Disabled -> Active`: powers the axes on and starts the sampler.
    ///
    /// No-op when already enabled. While suspended the device is only marked enabled and
    /// [`resume`](Self::resume) powers it on.
    pub fn enable(&self) {
        let mut slot = self.sampler.lock();
        let start = {
            let mut state = self.shared.lock();
            if state.enabled {
                debug!("enable ignored, already enabled");
                return;
            }

            state.enabled = true;
            if state.suspended {
                info!("enabled while suspended, sampling starts on resume");
                false
            } else {
                state.write_control(self.shared.enable_word);
                state.filter.reset();
                true
            }
        };

        if start {
            self.start_sampler(&mut slot);
            info!("sampling enabled");
        }
    }

    /// `Enabled -> Disabled`: drains the sampler and powers the axes down.
    ///
    /// Blocks until an in-flight cycle completes. No-op when already disabled.
    pub fn disable(&self) {
        let mut slot = self.sampler.lock();
        Self::stop_sampler(&mut slot);

        let mut state = self.shared.lock();
        if !state.enabled {
            debug!("disable ignored, already disabled");
            return;
        }

        state.write_control(CtrlReg1::power_down());
        state.enabled = false;
        state.filter.reset();
        info!("sampling disabled");
    }

    /// Power-management pause. Keeps the logical enable flag.
    pub fn suspend(&self) {
        let mut slot = self.sampler.lock();
        Self::stop_sampler(&mut slot);

        let mut state = self.shared.lock();
        let was_suspended = core::mem::replace(&mut state.suspended, true);
        if state.enabled && !was_suspended {
            state.write_control(CtrlReg1::power_down());
            state.filter.reset();
        }
        info!("suspended, enabled: {}", state.enabled);
    }

    /// Power-management resume. Restarts sampling if the device is logically enabled.
    pub fn resume(&self) {
        let mut slot = self.sampler.lock();
        Self::stop_sampler(&mut slot);

        let restart = {
            let mut state = self.shared.lock();
            state.suspended = false;
            if state.enabled {
                state.write_control(self.shared.enable_word);
                state.filter.reset();
            }
            state.enabled
        };

        if restart {
            self.start_sampler(&mut slot);
        }
        info!("resumed, sampling: {}", restart);
    }

    /// Quiesces the device for system shutdown.
    pub fn shutdown(&self) {
        self.disable();
    }

    fn start_sampler(&self, slot: &mut Option<SamplerTask>) {
        Self::stop_sampler(slot);
        match SamplerTask::spawn(Arc::clone(&self.shared)) {
            Ok(task) => *slot = Some(task),
            Err(_) => error!("failed to spawn sampler thread"),
        }
    }

    fn stop_sampler(slot: &mut Option<SamplerTask>) {
        if let Some(task) = slot.take() {
            task.cancel();
        }
    }
}
