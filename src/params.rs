//! Strongly typed parameter enumerations for the LIS3DF driver.
//!
//! These enums map directly to datasheet field encodings and are used across
//! [`Config`](crate::config::Config) and the register bitfields. Prefer these
//! types over raw integers to keep configuration values valid and explicit.
//!
//! # Examples
//!
//! ```rust
//! use lis3df::params::OutputDataRate;
//!
//! let odr = OutputDataRate::Hz100;
//! assert_eq!(odr.hz(), 100);
//! ```

use modular_bitfield::prelude::Specifier;

/// Output data rate selections encoded in `CTRL_REG1.ODR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 4]
pub enum OutputDataRate {
    /// Power-down mode, no conversions.
    PowerDown = 0b0000,
    /// 1 Hz output data rate.
    Hz1 = 0b0001,
    /// 10 Hz output data rate.
    Hz10 = 0b0010,
    /// 25 Hz output data rate.
    Hz25 = 0b0011,
    /// 50 Hz output data rate.
    Hz50 = 0b0100,
    /// 100 Hz output data rate.
    Hz100 = 0b0101,
    /// 200 Hz output data rate.
    Hz200 = 0b0110,
    /// 400 Hz output data rate.
    Hz400 = 0b0111,
}

impl OutputDataRate {
    /// Returns the ODR in hertz; zero for power-down.
    pub const fn hz(self) -> u32 {
        match self {
            Self::PowerDown => 0,
            Self::Hz1 => 1,
            Self::Hz10 => 10,
            Self::Hz25 => 25,
            Self::Hz50 => 50,
            Self::Hz100 => 100,
            Self::Hz200 => 200,
            Self::Hz400 => 400,
        }
    }
}
