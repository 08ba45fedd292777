//! Protobuf emitter writing framed log messages to a byte sink.
//!
//! [`ProtobufEmitter`] turns one log call into one frame: it checks out
//! scratch state from a shared [`MessagePool`](crate::pool::MessagePool),
//! stamps the message with an identity, encodes it, and hands the bytes to
//! the sink in a single write. Failures are returned to the caller; nothing
//! is retried, and no partial frame reaches the sink from an encoding
//! failure.

mod config;
mod protobuf;


use std::io;

use thiserror::Error;

use crate::{frame::FrameError, identity::IdentitySourceError};

pub use config::{BuildError, EmitterBuilder, EmitterConfig};
pub use protobuf::{NO_FIELDS, ProtobufEmitter};

/// Errors returned by [`ProtobufEmitter`].
#[derive(Debug, Error)]
pub enum EmitError {
    /// The frame could not be built; nothing was written.
    #[error("error encoding protobuf log message: {0}")]
    Encoding(#[from] FrameError),
    /// Writing to the sink failed or stopped short of the frame length.
    #[error("error sending protobuf log message: {0}")]
    Transport(#[source] io::Error),
    /// The identity source failed; nothing was written.
    #[error("error generating protobuf log message identity: {0}")]
    Identity(#[from] IdentitySourceError),
    /// The emitter has been closed.
    #[error("emitter is closed")]
    Closed,
}

impl EmitError {
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, Self::Encoding(FrameError::PayloadTooLarge { .. }))
    }

    pub fn is_header_too_large(&self) -> bool {
        matches!(self, Self::Encoding(FrameError::HeaderTooLarge { .. }))
    }

    /// Whether resending the same record could succeed.
    ///
    /// Only transport failures qualify, and only once the caller has dealt
    /// with the connection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
