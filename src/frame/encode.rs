//! Frame encoder.

use prost::Message as _;

use crate::message::{HEADER_FRAMING_SIZE, Header, Message, RECORD_SEPARATOR, UNIT_SEPARATOR};

use super::{FrameError, FrameLimits};

/// Encode `header` and `message` into `out` as a single frame.
///
/// The message is measured first and its length stored in
/// `header.message_length`. `out` is cleared and reused; it only grows when
/// its capacity is smaller than the frame. The returned slice borrows `out`.
pub fn marshal_frame<'a>(
    header: &mut Header,
    message: &Message,
    out: &'a mut Vec<u8>,
    limits: FrameLimits,
) -> Result<&'a [u8], FrameError> {
    let message_size = message.encoded_len();
    let too_large = || FrameError::PayloadTooLarge {
        size: message_size,
        max: limits.max_message_size,
    };
    if message_size > limits.max_message_size {
        return Err(too_large());
    }
    header.message_length = u32::try_from(message_size).map_err(|_| too_large())?;

    let header_size = header.encoded_len();
    let header_max = limits.header_ceiling();
    let header_len_byte = u8::try_from(header_size)
        .ok()
        .filter(|_| header_size <= header_max)
        .ok_or(FrameError::HeaderTooLarge {
            size: header_size,
            max: header_max,
        })?;

    let total_size = HEADER_FRAMING_SIZE + header_size + message_size;
    out.clear();
    out.reserve(total_size);
    out.push(RECORD_SEPARATOR);
    out.push(header_len_byte);
    header.encode(out)?;
    out.push(UNIT_SEPARATOR);
    message.encode(out)?;
    debug_assert_eq!(out.len(), total_size);
    Ok(out.as_slice())
}
