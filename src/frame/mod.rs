//! Framing of protobuf-encoded log messages.
//!
//! A frame is laid out as:
//!
//! ```text
//! 0x1E | header_len (1 byte) | header | 0x1F | message
//! ```
//!
//! The header records the encoded message length so a reader can split a
//! byte stream back into messages. [`marshal_frame`] writes frames into a
//! reusable buffer and [`decode_frame`] / [`FrameReader`] read them back.
//! Size limits are checked before any byte is written, so a failed encode
//! never produces a partial frame.

mod decode;
mod encode;


use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{DEFAULT_MAX_MESSAGE_SIZE, MAX_HEADER_SIZE};

pub use decode::{DecodedFrame, FrameReader, decode_frame};
pub use encode::marshal_frame;

/// Size ceilings enforced when encoding and decoding frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLimits {
    /// Largest encoded header accepted. Values above 255 are treated as 255.
    pub max_header_size: usize,
    /// Largest encoded message accepted.
    pub max_message_size: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_header_size: MAX_HEADER_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl FrameLimits {
    /// Header ceiling after clamping to what the length byte can describe.
    pub fn header_ceiling(&self) -> usize {
        self.max_header_size.min(MAX_HEADER_SIZE)
    }
}

/// Failures raised while encoding a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The encoded message exceeds the configured maximum.
    #[error("message size {size} exceeds maximum size {max}")]
    PayloadTooLarge { size: usize, max: usize },
    /// The encoded header does not fit the length prefix or configured maximum.
    #[error("header size {size} exceeds maximum size {max}")]
    HeaderTooLarge { size: usize, max: usize },
    /// The protobuf encoder rejected the message.
    #[error("protobuf encoding failed: {0}")]
    Encode(#[from] prost::EncodeError),
}

/// Failures raised while decoding a frame.
#[derive(Debug, Error)]
pub enum FrameDecodeError {
    #[error("expected record separator 0x1e, found {0:#04x}")]
    MissingRecordSeparator(u8),
    #[error("expected unit separator 0x1f, found {0:#04x}")]
    MissingUnitSeparator(u8),
    #[error("frame truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("header size {size} exceeds maximum size {max}")]
    HeaderTooLarge { size: usize, max: usize },
    #[error("message size {size} exceeds maximum size {max}")]
    MessageTooLarge { size: usize, max: usize },
    #[error("malformed protobuf: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
