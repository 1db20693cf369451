//! I2C interface implementation built on top of `embedded-hal` `I2c`.

use embedded_hal::i2c::I2c;

use super::Lis3dfInterface;

/// 7-bit bus address with SA0 pulled high.
pub const DEFAULT_ADDRESS: u8 = 0x19;

/// I2C-based interface implementation for the LIS3DF driver.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Creates a new interface talking to the device at `address`.
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Returns the 7-bit address used for every transaction.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Provides mutable access to the wrapped I2C bus.
    pub fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Consumes the interface and returns the owned I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Lis3dfInterface for I2cInterface<I2C>
where
    I2C: I2c,
{
    type Error = I2C::Error;

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        self.i2c.write(self.address, &[register, value])
    }

    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.i2c.write_read(self.address, &[register], &mut value)?;
        Ok(value[0])
    }
}

#[cfg(test)]
mod tests {
    use super::{I2cInterface, DEFAULT_ADDRESS};
    use crate::interface::Lis3dfInterface;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn read_register_issues_write_read() {
        let expectations = [I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x0F],
            vec![0x33],
        )];
        let mut bus = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(bus.clone(), DEFAULT_ADDRESS);

        assert_eq!(interface.read_register(0x0F).unwrap(), 0x33);
        bus.done();
    }

    #[test]
    fn write_register_sends_address_then_value() {
        let expectations = [I2cTransaction::write(DEFAULT_ADDRESS, vec![0x20, 0x57])];
        let mut bus = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(bus.clone(), DEFAULT_ADDRESS);

        interface.write_register(0x20, 0x57).unwrap();
        bus.done();
    }

    #[test]
    fn bus_errors_are_passed_through() {
        let expectations = [
            I2cTransaction::write_read(0x18, vec![0x29], vec![0x00]).with_error(ErrorKind::Other)
        ];
        let mut bus = I2cMock::new(&expectations);
        let mut interface = I2cInterface::new(bus.clone(), 0x18);

        assert_eq!(interface.read_register(0x29), Err(ErrorKind::Other));
        assert_eq!(interface.address(), 0x18);
        bus.done();
    }
}
