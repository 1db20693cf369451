//! Control surface consumed by the external command interface.
//!
//! Every operation runs under the session lock, so commands from the control path are
//! serialized against each other. The offset store lives behind the same lock and is only
//! called while the device record lock is released.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::Config;
use crate::device::Lis3df;
use crate::error::{Error, Result};
use crate::input::InputSink;
use crate::interface::Lis3dfInterface;
use crate::log::{debug, warn};
use crate::offset::OffsetStore;
use crate::sample::AxisOffset;

/// Static descriptor reported by `GET_DEVICE_INFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInfo {
    /// Sensor name.
    pub name: &'static str,
    /// Manufacturer name.
    pub vendor: &'static str,
    /// Full-scale range in g.
    pub max_range: u32,
    /// Counts per full-scale range.
    pub resolution: u32,
    /// Supply current in µA.
    pub power: u32,
}

/// Descriptor of the LIS3DF part.
pub const DEVICE_INFO: DeviceInfo = DeviceInfo {
    name: "Accelerometer Sensor",
    vendor: "ST Microelectronics",
    max_range: 2,
    resolution: 128,
    power: 700,
};

/// Wire codes of the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandCode {
    /// `SET_STATE`: enable or disable sampling.
    SetState = 1,
    /// `GET_STATE`: query the enable flag.
    GetState = 2,
    /// `GET_DEVICE_INFO`: query the part descriptor.
    GetDeviceInfo = 3,
    /// `SET_DELAY`: change the sampling period.
    SetDelay = 4,
    /// `SET_AXIS_OFFSET`: add a delta to the calibration offset.
    SetAxisOffset = 5,
    /// `SET_AXIS_OFFSET_INIT`: persist a zero offset.
    SetAxisOffsetInit = 6,
    /// `OPEN`: open the single session.
    Open = 7,
    /// `CLOSE`: close the session.
    Close = 8,
}

impl TryFrom<u8> for CommandCode {
    type Error = u8;

    fn try_from(value: u8) -> core::result::Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::SetState,
            2 => Self::GetState,
            3 => Self::GetDeviceInfo,
            4 => Self::SetDelay,
            5 => Self::SetAxisOffset,
            6 => Self::SetAxisOffsetInit,
            7 => Self::Open,
            8 => Self::Close,
            other => return Err(other),
        })
    }
}

/// Decoded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Enable (`true`) or disable sampling.
    SetState(bool),
    /// Query the enable flag.
    GetState,
    /// Query the part descriptor.
    GetDeviceInfo,
    /// Requested sampling delay in milliseconds.
    SetDelay(u32),
    /// Offset delta added to the current calibration.
    SetAxisOffset(AxisOffset),
    /// Persist a zero offset.
    SetAxisOffsetInit,
    /// Open the session.
    Open,
    /// Close the session.
    Close,
}

impl Command {
    /// Decodes a command code and its little-endian payload.
    ///
    /// Returns `None` for unknown codes and short payloads. Trailing bytes are ignored.
    pub fn decode(code: u8, payload: &[u8]) -> Option<Self> {
        let command = match CommandCode::try_from(code).ok()? {
            CommandCode::SetState => Self::SetState(*payload.first()? != 0),
            CommandCode::GetState => Self::GetState,
            CommandCode::GetDeviceInfo => Self::GetDeviceInfo,
            CommandCode::SetDelay => {
                let bytes = payload.get(..4)?.try_into().ok()?;
                Self::SetDelay(u32::from_le_bytes(bytes))
            }
            CommandCode::SetAxisOffset => {
                let bytes = payload.get(..6)?;
                let axis = |i: usize| i16::from_le_bytes([bytes[i], bytes[i + 1]]);
                Self::SetAxisOffset(AxisOffset::new(axis(0), axis(2), axis(4)))
            }
            CommandCode::SetAxisOffsetInit => Self::SetAxisOffsetInit,
            CommandCode::Open => Self::Open,
            CommandCode::Close => Self::Close,
        };
        Some(command)
    }

    /// Wire code of this command.
    pub fn code(&self) -> CommandCode {
        match self {
            Self::SetState(_) => CommandCode::SetState,
            Self::GetState => CommandCode::GetState,
            Self::GetDeviceInfo => CommandCode::GetDeviceInfo,
            Self::SetDelay(_) => CommandCode::SetDelay,
            Self::SetAxisOffset(_) => CommandCode::SetAxisOffset,
            Self::SetAxisOffsetInit => CommandCode::SetAxisOffsetInit,
            Self::Open => CommandCode::Open,
            Self::Close => CommandCode::Close,
        }
    }
}

/// Successful command outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The command carries no result.
    Done,
    /// Current enable flag.
    State(bool),
    /// Static part descriptor.
    DeviceInfo(DeviceInfo),
    /// Effective sampling period after clamping.
    Period(Duration),
    /// Offset confirmed by the store.
    Offset(AxisOffset),
}

struct Session<STORE> {
    opened: bool,
    store: STORE,
}

/// Command-facing wrapper around one [`Lis3df`].
pub struct ControlSurface<IFACE, SINK, STORE> {
    device: Lis3df<IFACE, SINK>,
    session: Mutex<Session<STORE>>,
}

impl<IFACE, SINK, STORE> ControlSurface<IFACE, SINK, STORE> {
    /// Wraps an attached device and its offset store.
    pub fn new(device: Lis3df<IFACE, SINK>, store: STORE) -> Self {
        Self {
            device,
            session: Mutex::new(Session {
                opened: false,
                store,
            }),
        }
    }

    /// The wrapped device, for the power-management path.
    pub fn device(&self) -> &Lis3df<IFACE, SINK> {
        &self.device
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.lock().opened
    }

    fn lock(&self) -> MutexGuard<'_, Session<STORE>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<IFACE, SINK, STORE, CommE> ControlSurface<IFACE, SINK, STORE>
where
    IFACE: Lis3dfInterface<Error = CommE> + Send + 'static,
    SINK: InputSink + Send + 'static,
    STORE: OffsetStore,
{
    /// Attaches the device and wraps it.
    pub fn attach(interface: IFACE, sink: SINK, mut store: STORE, config: Config) -> Result<Self, CommE> {
        let device = Lis3df::attach(interface, sink, &mut store, config)?;
        Ok(Self::new(device, store))
    }

    /// Detaches the device, returning the bus, sink and store.
    ///
    /// Hands the surface back unchanged when [`Lis3df::detach`] refuses.
    pub fn detach(self) -> core::result::Result<(IFACE, SINK, STORE), Self> {
        let Self { device, session } = self;
        let session = session.into_inner().unwrap_or_else(PoisonError::into_inner);
        match device.detach() {
            Ok((interface, sink)) => Ok((interface, sink, session.store)),
            Err(device) => Err(Self {
                device,
                session: Mutex::new(session),
            }),
        }
    }

    // ==================================================================
    // == Session ========================================================
    // ==================================================================
    /// Opens the single allowed session.
    pub fn open(&self) -> Result<(), CommE> {
        let mut session = self.lock();
        if session.opened {
            warn!("control surface already opened");
            return Err(Error::AlreadyOpen);
        }
        session.opened = true;
        Ok(())
    }

    /// Closes the session unconditionally.
    pub fn close(&self) {
        self.lock().opened = false;
    }

    // ==================================================================
    // == Commands =======================================================
    // ==================================================================
    /// Enables or disables sampling.
    pub fn set_state(&self, on: bool) {
        let _session = self.lock();
        if on {
            self.device.enable();
        } else {
            self.device.disable();
        }
    }

    /// Returns the logical enable flag.
    pub fn state(&self) -> bool {
        let _session = self.lock();
        self.device.is_enabled()
    }

    /// Returns the static part descriptor.
    pub fn device_info(&self) -> DeviceInfo {
        DEVICE_INFO
    }

    /// Sets the sampling delay and returns the effective period.
    pub fn set_delay(&self, requested_ms: u32) -> Duration {
        let _session = self.lock();
        self.device.set_sampling_period(requested_ms)
    }

    /// Adds `delta` to the cached offset and persists the sum.
    ///
    /// The cache follows the value confirmed by the store and is untouched on failure.
    pub fn set_axis_offset(&self, delta: AxisOffset) -> Result<AxisOffset, CommE> {
        let mut session = self.lock();
        self.device
            .adjust_axis_offset(&mut session.store, delta)
            .map_err(Error::from_store)
    }

    /// Persists a zero offset.
    pub fn reset_axis_offset(&self) -> Result<AxisOffset, CommE> {
        let mut session = self.lock();
        self.device
            .reset_axis_offset(&mut session.store)
            .map_err(Error::from_store)
    }

    /// Runs one decoded command.
    pub fn execute(&self, command: Command) -> Result<Reply, CommE> {
        debug!("command {}", command.code() as u8);
        let reply = match command {
            Command::SetState(on) => {
                self.set_state(on);
                Reply::Done
            }
            Command::GetState => Reply::State(self.state()),
            Command::GetDeviceInfo => Reply::DeviceInfo(self.device_info()),
            Command::SetDelay(ms) => Reply::Period(self.set_delay(ms)),
            Command::SetAxisOffset(delta) => Reply::Offset(self.set_axis_offset(delta)?),
            Command::SetAxisOffsetInit => Reply::Offset(self.reset_axis_offset()?),
            Command::Open => {
                self.open()?;
                Reply::Done
            }
            Command::Close => {
                self.close();
                Reply::Done
            }
        };
        Ok(reply)
    }

    /// Decodes and runs a raw command.
    pub fn execute_raw(&self, code: u8, payload: &[u8]) -> Result<Reply, CommE> {
        let Some(command) = Command::decode(code, payload) else {
            warn!("invalid command {}", code);
            return Err(Error::InvalidArgument);
        };
        self.execute(command)
    }
}
