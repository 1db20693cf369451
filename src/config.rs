//! Configuration primitives for the LIS3DF driver.

use crate::params::OutputDataRate;
use crate::registers::CtrlReg1;
use crate::sampler::{DEFAULT_PERIOD_MS, MIN_PERIOD_MS};

/// User-facing configuration for the LIS3DF sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Output data rate programmed on enable and resume.
    pub odr: OutputDataRate,
    /// Low-power conversion mode (`CTRL_REG1.LPen`).
    pub low_power: bool,
    /// Initial sampling period of the polling loop, in milliseconds.
    pub sampling_period_ms: u32,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration can drive the sampler.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.odr == OutputDataRate::PowerDown {
            return Err(ConfigError::PowerDownRate);
        }

        if self.sampling_period_ms < MIN_PERIOD_MS {
            return Err(ConfigError::PeriodTooShort);
        }

        Ok(())
    }

    /// `CTRL_REG1` word written when sampling is (re)started.
    pub fn enable_word(&self) -> CtrlReg1 {
        CtrlReg1::all_axes(self.odr, self.low_power)
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the output data rate.
    pub fn odr(mut self, odr: OutputDataRate) -> Self {
        self.config.odr = odr;
        self
    }

    /// Selects low-power conversions.
    pub fn low_power(mut self, low_power: bool) -> Self {
        self.config.low_power = low_power;
        self
    }

    /// Overrides the initial sampling period.
    pub fn sampling_period_ms(mut self, period_ms: u32) -> Self {
        self.config.sampling_period_ms = period_ms;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            odr: OutputDataRate::Hz100,
            low_power: false,
            sampling_period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Power-down was selected as the sampling data rate.
    #[error("power-down is not a sampling data rate")]
    PowerDownRate,
    /// Initial period is below the sampler floor.
    #[error("sampling period below the sampler floor")]
    PeriodTooShort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_enables_all_axes_at_100hz() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(u8::from(config.enable_word()), 0x57);
        assert_eq!(config.sampling_period_ms, 50);
    }

    #[test]
    fn builder_rejects_power_down_and_short_periods() {
        let config = Config::new().odr(OutputDataRate::PowerDown).build();
        assert_eq!(config.validate(), Err(ConfigError::PowerDownRate));

        let config = Config::new().sampling_period_ms(4).build();
        assert_eq!(config.validate(), Err(ConfigError::PeriodTooShort));
    }

    #[test]
    fn low_power_sets_lpen() {
        let config = Config::new().odr(OutputDataRate::Hz50).low_power(true).build();
        assert_eq!(u8::from(config.enable_word()), 0x4F);
    }
}
