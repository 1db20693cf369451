//! Axis value types shared by the sampler, filter and control surface.

/// One instantaneous or filtered 3-axis reading in driver units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisSample {
    /// X-axis reading.
    pub x: i16,
    /// Y-axis reading.
    pub y: i16,
    /// Z-axis reading.
    pub z: i16,
}

impl AxisSample {
    /// All axes zero.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates a sample from its three components.
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Builds the sample from the three output bytes.
    ///
    /// The sensor is mounted rotated: `OUT_X` feeds the reported Y axis and `OUT_Y` the
    /// reported X axis.
    pub fn from_output_registers(out_x: u8, out_y: u8, out_z: u8) -> Self {
        Self {
            x: scale_raw(out_y),
            y: scale_raw(out_x),
            z: scale_raw(out_z),
        }
    }

    /// Applies the calibration offset and the mounting sign convention.
    ///
    /// Only X is negated, before the offset is subtracted.
    pub fn calibrated(self, offset: AxisOffset) -> Motion {
        Motion {
            x: -i32::from(self.x) - i32::from(offset.x),
            y: i32::from(self.y) - i32::from(offset.y),
            z: i32::from(self.z) - i32::from(offset.z),
        }
    }
}

/// Per-axis calibration correction subtracted from filtered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisOffset {
    /// X-axis correction.
    pub x: i16,
    /// Y-axis correction.
    pub y: i16,
    /// Z-axis correction.
    pub z: i16,
}

impl AxisOffset {
    /// No correction.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates an offset from its three components.
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Component-wise sum, wrapping like the persisted 16-bit fields.
    pub fn wrapping_add(self, delta: Self) -> Self {
        Self {
            x: self.x.wrapping_add(delta.x),
            y: self.y.wrapping_add(delta.y),
            z: self.z.wrapping_add(delta.z),
        }
    }
}

/// Calibrated triple handed to the input sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Motion {
    /// Reported X value.
    pub x: i32,
    /// Reported Y value.
    pub y: i32,
    /// Reported Z value.
    pub z: i32,
}

/// Converts one two's-complement output byte into driver units.
#[inline]
pub fn scale_raw(raw: u8) -> i16 {
    // 8-bit left-justified reading, range [-128, 127] -> [-20000, 19843].
    ((i32::from(raw as i8) * 10_000) >> 6) as i16
}
