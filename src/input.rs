//! Input event sink receiving calibrated motion frames.

use std::sync::mpsc::{Receiver, Sender, channel};

use crate::sample::Motion;

/// Absolute range advertised for every axis, in driver units.
pub const ABS_RANGE: i32 = 1_280_000;

/// Reported absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Absolute X axis.
    X,
    /// Absolute Y axis.
    Y,
    /// Absolute Z axis.
    Z,
}

/// Capability of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AbsAxisInfo {
    /// Axis being described.
    pub axis: Axis,
    /// Lowest reportable value.
    pub min: i32,
    /// Highest reportable value.
    pub max: i32,
    /// Noise filter width.
    pub fuzz: i32,
    /// Dead zone around zero.
    pub flat: i32,
}

/// Capabilities registered at attach.
pub const ABS_AXES: [AbsAxisInfo; 3] = [
    AbsAxisInfo { axis: Axis::X, min: -ABS_RANGE, max: ABS_RANGE, fuzz: 0, flat: 0 },
    AbsAxisInfo { axis: Axis::Y, min: -ABS_RANGE, max: ABS_RANGE, fuzz: 0, flat: 0 },
    AbsAxisInfo { axis: Axis::Z, min: -ABS_RANGE, max: ABS_RANGE, fuzz: 0, flat: 0 },
];

/// The endpoint refused the registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationError;

/// Downstream consumer of filtered samples.
///
/// A frame is one `report_abs` per axis followed by `sync`.
pub trait InputSink {
    /// Announces the axes this device will report.
    fn register(&mut self, axes: &[AbsAxisInfo]) -> Result<(), RegistrationError>;

    /// Withdraws the endpoint on detach or failed attach.
    fn unregister(&mut self) {}

    /// Reports one axis value of the current frame.
    fn report_abs(&mut self, axis: Axis, value: i32);

    /// Marks the end of a frame.
    fn sync(&mut self);
}

/// Sink forwarding each completed frame over an mpsc channel.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<Motion>,
    pending: Motion,
    registered: bool,
}

impl ChannelSink {
    /// Creates a sink and the receiver observing its frames.
    pub fn new() -> (Self, Receiver<Motion>) {
        let (tx, rx) = channel();
        let sink = Self {
            tx,
            pending: Motion::default(),
            registered: false,
        };
        (sink, rx)
    }

    /// Whether the endpoint is currently registered.
    pub fn is_registered(&self) -> bool {
        self.registered
    }
}

impl InputSink for ChannelSink {
    fn register(&mut self, _axes: &[AbsAxisInfo]) -> Result<(), RegistrationError> {
        self.registered = true;
        Ok(())
    }

    fn unregister(&mut self) {
        self.registered = false;
    }

    fn report_abs(&mut self, axis: Axis, value: i32) {
        match axis {
            Axis::X => self.pending.x = value,
            Axis::Y => self.pending.y = value,
            Axis::Z => self.pending.z = value,
        }
    }

    fn sync(&mut self) {
        // A dropped receiver only means nobody is listening.
        let _ = self.tx.send(self.pending);
    }
}
