//! Identity and time source for outgoing messages.
//!
//! Every message carries a 16-byte identifier, a nanosecond timestamp, and
//! the id of the emitting process. [`SystemIdentity`] draws these from a
//! random UUIDv4, the wall clock, and the operating system.
//! [`FixedIdentity`] returns the same values on every call so frames can be
//! compared byte for byte in tests.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::message::UUID_SIZE;

/// Identity stamped onto a single message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: [u8; UUID_SIZE],
    pub timestamp_ns: i64,
    pub pid: i32,
}

/// Failures raised while producing an [`Identity`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentitySourceError {
    /// The clock reading cannot be represented as `i64` nanoseconds.
    #[error("clock reading {0} is outside the representable nanosecond range")]
    ClockOutOfRange(DateTime<Utc>),
    /// An identifier of the wrong width was supplied.
    #[error("message identifier must be 16 bytes, got {0}")]
    InvalidIdentifier(usize),
}

/// Supplies the identifier, timestamp, and process id for each message.
pub trait IdentitySource: Send + Sync {
    /// Produce the identity for the next message.
    fn next_identity(&self) -> Result<Identity, IdentitySourceError>;
}

/// Production identity source.
#[derive(Clone, Debug)]
pub struct SystemIdentity {
    pid: i32,
}

impl SystemIdentity {
    pub fn new() -> Self {
        Self { pid: current_pid() }
    }
}

impl Default for SystemIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentitySource for SystemIdentity {
    fn next_identity(&self) -> Result<Identity, IdentitySourceError> {
        Ok(Identity {
            id: *Uuid::new_v4().as_bytes(),
            timestamp_ns: timestamp_nanos(Utc::now())?,
            pid: self.pid,
        })
    }
}

/// Identity source returning the same identity on every call.
#[derive(Clone, Debug)]
pub struct FixedIdentity {
    identity: Identity,
}

impl FixedIdentity {
    /// Build a fixed source from raw parts.
    pub fn new(
        id: [u8; UUID_SIZE],
        timestamp: DateTime<Utc>,
        pid: i32,
    ) -> Result<Self, IdentitySourceError> {
        Ok(Self {
            identity: Identity {
                id,
                timestamp_ns: timestamp_nanos(timestamp)?,
                pid,
            },
        })
    }

    /// Build a fixed source from an identifier slice, validating its width.
    pub fn from_slice(
        id: &[u8],
        timestamp: DateTime<Utc>,
        pid: i32,
    ) -> Result<Self, IdentitySourceError> {
        let id: [u8; UUID_SIZE] = id
            .try_into()
            .map_err(|_| IdentitySourceError::InvalidIdentifier(id.len()))?;
        Self::new(id, timestamp, pid)
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }
}

impl IdentitySource for FixedIdentity {
    fn next_identity(&self) -> Result<Identity, IdentitySourceError> {
        Ok(self.identity)
    }
}

impl<S: IdentitySource + ?Sized> IdentitySource for Box<S> {
    fn next_identity(&self) -> Result<Identity, IdentitySourceError> {
        (**self).next_identity()
    }
}

/// Convert a clock reading to signed nanoseconds since the UNIX epoch.
///
/// Readings before 1970 give negative values, as the wire field is signed.
pub fn timestamp_nanos(time: DateTime<Utc>) -> Result<i64, IdentitySourceError> {
    time.timestamp_nanos_opt()
        .ok_or(IdentitySourceError::ClockOutOfRange(time))
}

/// Id of the current process, saturating at `i32::MAX`.
pub fn current_pid() -> i32 {
    i32::try_from(std::process::id()).unwrap_or(i32::MAX)
}
