//! Register map definitions for the LIS3DF accelerometer.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::params::OutputDataRate;

/// Register address of `WHO_AM_I`.
pub const REG_WHO_AM_I: u8 = 0x0F;
/// Register address of `CTRL_REG1`.
pub const REG_CTRL_REG1: u8 = 0x20;
/// Register address of `CTRL_REG2`.
pub const REG_CTRL_REG2: u8 = 0x21;
/// Register address of `CTRL_REG3`.
pub const REG_CTRL_REG3: u8 = 0x22;
/// Register address of `CTRL_REG4`.
pub const REG_CTRL_REG4: u8 = 0x23;
/// Register address of `CTRL_REG5`.
pub const REG_CTRL_REG5: u8 = 0x24;
/// Register address of `CTRL_REG6`.
pub const REG_CTRL_REG6: u8 = 0x25;
/// Register address of `STATUS_REG`.
pub const REG_STATUS: u8 = 0x27;
/// Register address of `OUT_X`.
pub const REG_OUT_X: u8 = 0x29;
/// Register address of `OUT_Y`.
pub const REG_OUT_Y: u8 = 0x2B;
/// Register address of `OUT_Z`.
pub const REG_OUT_Z: u8 = 0x2D;
/// Register address of `INT1_CFG`.
pub const REG_INT1_CFG: u8 = 0x30;
/// Register address of `INT1_SRC`.
pub const REG_INT1_SRC: u8 = 0x31;
/// Register address of `INT1_THS`.
pub const REG_INT1_THS: u8 = 0x32;
/// Register address of `INT1_DURATION`.
pub const REG_INT1_DURATION: u8 = 0x33;
/// Register address of `INT2_CFG`.
pub const REG_INT2_CFG: u8 = 0x34;
/// Register address of `INT2_SRC`.
pub const REG_INT2_SRC: u8 = 0x35;
/// Register address of `INT2_THS`.
pub const REG_INT2_THS: u8 = 0x36;
/// Register address of `INT2_DURATION`.
pub const REG_INT2_DURATION: u8 = 0x37;

/// Value reported by `WHO_AM_I` on a genuine part.
pub const EXPECTED_WHO_AM_I: u8 = 0x33;

/// Control registers cleared to their power-down defaults during attach.
pub const CONTROL_REGISTERS: [u8; 6] = [
    REG_CTRL_REG1,
    REG_CTRL_REG2,
    REG_CTRL_REG3,
    REG_CTRL_REG4,
    REG_CTRL_REG5,
    REG_CTRL_REG6,
];

/// Minimal metadata exposed by every register value type.
pub trait Register {
    /// Raw storage backing the register payload.
    type Raw: Copy;
    /// Register address as documented in the datasheet.
    const ADDRESS: u8;
    /// Optional reset/default value defined by the datasheet.
    const RESET_VALUE: Option<Self::Raw>;
}

/// Bitfield representation of the `CTRL_REG1` register (address `0x20`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtrlReg1 {
    // X-axis enable (bit 0).
    pub xen: bool,
    // Y-axis enable (bit 1).
    pub yen: bool,
    // Z-axis enable (bit 2).
    pub zen: bool,
    // Low-power mode enable (bit 3).
    pub lpen: bool,
    // Output data rate selection (bits 7:4).
    pub odr: OutputDataRate,
}

impl CtrlReg1 {
    /// All axes disabled and conversions stopped.
    pub fn power_down() -> Self {
        Self::new().with_odr(OutputDataRate::PowerDown)
    }

    /// All three axes enabled at the given output data rate.
    pub fn all_axes(odr: OutputDataRate, low_power: bool) -> Self {
        Self::new()
            .with_xen(true)
            .with_yen(true)
            .with_zen(true)
            .with_lpen(low_power)
            .with_odr(odr)
    }
}

impl From<u8> for CtrlReg1 {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<CtrlReg1> for u8 {
    fn from(value: CtrlReg1) -> Self {
        value.into_bytes()[0]
    }
}

impl Register for CtrlReg1 {
    type Raw = u8;
    const ADDRESS: u8 = REG_CTRL_REG1;
    const RESET_VALUE: Option<Self::Raw> = Some(0x00);
}
