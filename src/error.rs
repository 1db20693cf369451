//! Error handling primitives for the LIS3DF driver.

use crate::offset::StoreError;

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    #[error("bus interface error: {0:?}")]
    Interface(E),
    /// The provided configuration parameters are invalid.
    #[error("invalid configuration")]
    InvalidConfig,
    /// The identity register did not report a LIS3DF.
    #[error("device not present")]
    DeviceNotPresent,
    /// The input endpoint refused registration.
    #[error("input endpoint registration failed")]
    InputUnavailable,
    /// The control surface already has an open session.
    #[error("control surface already open")]
    AlreadyOpen,
    /// Unknown command or malformed command payload.
    #[error("invalid argument")]
    InvalidArgument,
    /// The offset store could not be reached.
    #[error("offset store unavailable")]
    StoreUnavailable,
    /// The offset store answered with an error or a malformed reply.
    #[error("offset store rejected the request")]
    StoreRejected,
}

impl<E> Error<E> {
    /// Maps an offset store failure onto the driver error space.
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => Self::StoreUnavailable,
            StoreError::Rejected => Self::StoreRejected,
        }
    }
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_through_display() {
        let err: Error<u8> = Error::Interface(7);
        assert_eq!(err.to_string(), "bus interface error: 7");
        assert_eq!(
            Error::<u8>::from_store(StoreError::Rejected).to_string(),
            "offset store rejected the request"
        );
    }

    #[test]
    fn bus_errors_convert_into_interface_variant() {
        fn fails() -> Result<(), u8> {
            Err::<(), u8>(3)?;
            Ok(())
        }
        assert_eq!(fails(), Err(Error::Interface(3)));
    }
}
