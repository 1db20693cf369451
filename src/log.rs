//! Logging shims.
//!
//! Routes to `defmt` when the `defmt` feature is enabled, to `tracing` when the `tracing`
//! feature is enabled, and compiles to nothing otherwise. Keep format strings to plain `{}`
//! placeholders so both backends accept them.

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::trace!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::trace!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::debug!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::info!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($arg)*);
    }};
}

// Named with a trailing underscore: a bare `warn` re-export clashes with the built-in
// `#[warn]` attribute.
macro_rules! warn_ {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::warn!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($arg)*);
    }};
}

macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::error!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        tracing::error!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($arg)*);
    }};
}

pub(crate) use {debug, error, info, trace, warn_ as warn};
