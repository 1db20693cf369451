//! Calibration offset persistence.
//!
//! The driver only caches the offset; the [`OffsetStore`] is the source of truth and every
//! change goes through it first.

use crate::sample::AxisOffset;

/// Reply token for a store that has never persisted an offset.
pub const NOT_INITIALIZED_REPLY: &str = "NV_NOTACTIVE_S";
/// Reply token for a rejected request.
pub const ERROR_REPLY: &str = "ERROR";

/// Failure talking to the offset store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The store could not be reached.
    #[error("offset store unreachable")]
    Unavailable,
    /// The store refused the request or answered with garbage.
    #[error("offset store rejected the request")]
    Rejected,
}

/// Result of reading the persisted offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoredOffset {
    /// The persisted value.
    Value(AxisOffset),
    /// Nothing has been persisted yet.
    NotInitialized,
}

/// Request/response service persisting the 3-axis calibration offset.
///
/// Calls are synchronous and may block.
pub trait OffsetStore {
    /// Reads the persisted offset.
    fn get(&mut self) -> Result<StoredOffset, StoreError>;

    /// Persists `offset` and returns the value the store confirmed.
    fn set(&mut self, offset: AxisOffset) -> Result<AxisOffset, StoreError>;
}

/// Request kinds understood by the remote offset service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OffsetRequest {
    /// Read the persisted offset.
    Get,
    /// Persist the offset carried in the payload.
    Set,
}

/// Text request/response channel to the remote offset service.
pub trait OffsetRpc {
    /// Sends `request` with its text payload and returns the reply text.
    fn call(&mut self, request: OffsetRequest, payload: &str) -> Result<String, StoreError>;
}

/// [`OffsetStore`] speaking the `"X Y Z"` text protocol over an [`OffsetRpc`].
#[derive(Debug)]
pub struct RpcOffsetStore<R> {
    rpc: R,
}

impl<R> RpcOffsetStore<R> {
    /// Wraps an RPC channel.
    pub const fn new(rpc: R) -> Self {
        Self { rpc }
    }

    /// Returns the wrapped channel.
    pub fn release(self) -> R {
        self.rpc
    }
}

impl<R: OffsetRpc> OffsetStore for RpcOffsetStore<R> {
    fn get(&mut self) -> Result<StoredOffset, StoreError> {
        let reply = self.rpc.call(OffsetRequest::Get, "")?;
        parse_reply(&reply)
    }

    fn set(&mut self, offset: AxisOffset) -> Result<AxisOffset, StoreError> {
        let reply = self.rpc.call(OffsetRequest::Set, &format_offset(offset))?;
        match parse_reply(&reply)? {
            StoredOffset::Value(confirmed) => Ok(confirmed),
            StoredOffset::NotInitialized => Err(StoreError::Rejected),
        }
    }
}

/// Encodes an offset as the request payload.
pub fn format_offset(offset: AxisOffset) -> String {
    format!("{} {} {}", offset.x, offset.y, offset.z)
}

/// Decodes a reply from the offset service.
pub fn parse_reply(reply: &str) -> Result<StoredOffset, StoreError> {
    let reply = reply.trim_end_matches('\0').trim();
    if reply == NOT_INITIALIZED_REPLY {
        return Ok(StoredOffset::NotInitialized);
    }
    if reply == ERROR_REPLY {
        return Err(StoreError::Rejected);
    }

    let mut fields = reply.split_whitespace().map(str::parse::<i16>);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => Ok(StoredOffset::Value(AxisOffset::new(x, y, z))),
        _ => Err(StoreError::Rejected),
    }
}
