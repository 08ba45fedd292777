//! Framed, length-delimited protobuf log message emitter.
//!
//! Log records are encoded with the Heka message schema and wrapped in a
//! small binary frame so a collector can split them back out of a byte
//! stream. [`ProtobufEmitter`] is the entry point; it writes one frame per
//! call to any [`std::io::Write`] sink.

pub mod emitter;
pub mod event;
pub mod frame;
pub mod identity;
pub mod level;
pub mod message;
pub mod pool;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

pub use emitter::{
    BuildError, EmitError, EmitterBuilder, EmitterConfig, NO_FIELDS, ProtobufEmitter,
};
pub use event::{ExtraData, LogEvent, merge_extra};
pub use frame::{
    DecodedFrame, FrameDecodeError, FrameError, FrameLimits, FrameReader, decode_frame,
    marshal_frame,
};
pub use identity::{FixedIdentity, Identity, IdentitySource, IdentitySourceError, SystemIdentity};
pub use level::Severity;
pub use message::{Field, Header, Message, ValueType};
pub use pool::{MessagePool, PoolStats, PooledScratch, Scratch};
