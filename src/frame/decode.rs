//! Frame decoder used by collectors and round-trip checks.

use std::io::{self, Read};

use prost::Message as _;

use crate::message::{
    HEADER_DELIMITER_SIZE, HEADER_FRAMING_SIZE, Header, Message, RECORD_SEPARATOR,
    UNIT_SEPARATOR,
};

use super::{FrameDecodeError, FrameLimits};

/// A frame split back into its parts.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFrame {
    pub header: Header,
    pub message: Message,
    /// Bytes consumed from the input, framing included.
    pub frame_len: usize,
}

fn ensure_len(buf: &[u8], needed: usize) -> Result<(), FrameDecodeError> {
    if buf.len() < needed {
        return Err(FrameDecodeError::Truncated {
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

/// Validate the record separator and return the header length.
fn parse_prefix(
    prefix: [u8; HEADER_DELIMITER_SIZE],
    limits: &FrameLimits,
) -> Result<usize, FrameDecodeError> {
    if prefix[0] != RECORD_SEPARATOR {
        return Err(FrameDecodeError::MissingRecordSeparator(prefix[0]));
    }
    let header_size = usize::from(prefix[1]);
    let max = limits.header_ceiling();
    if header_size > max {
        return Err(FrameDecodeError::HeaderTooLarge {
            size: header_size,
            max,
        });
    }
    Ok(header_size)
}

/// Decode the header and return it with the announced message length.
///
/// `bytes` holds the header followed by the unit separator.
fn parse_header(
    bytes: &[u8],
    limits: &FrameLimits,
) -> Result<(Header, usize), FrameDecodeError> {
    let (header_bytes, separator) = bytes.split_at(bytes.len().saturating_sub(1));
    match separator.first() {
        Some(&UNIT_SEPARATOR) => {}
        Some(&other) => return Err(FrameDecodeError::MissingUnitSeparator(other)),
        None => {
            return Err(FrameDecodeError::Truncated {
                needed: 1,
                available: 0,
            });
        }
    }
    let header = Header::decode(header_bytes)?;
    let message_size = header.message_length as usize;
    if message_size > limits.max_message_size {
        return Err(FrameDecodeError::MessageTooLarge {
            size: message_size,
            max: limits.max_message_size,
        });
    }
    Ok((header, message_size))
}

/// Decode the first frame in `buf`.
///
/// Trailing bytes after the frame are ignored; `frame_len` tells the caller
/// where the next frame starts.
pub fn decode_frame(buf: &[u8], limits: FrameLimits) -> Result<DecodedFrame, FrameDecodeError> {
    ensure_len(buf, HEADER_DELIMITER_SIZE)?;
    let header_size = parse_prefix([buf[0], buf[1]], &limits)?;
    let message_start = HEADER_FRAMING_SIZE + header_size;
    ensure_len(buf, message_start)?;
    let (header, message_size) =
        parse_header(&buf[HEADER_DELIMITER_SIZE..message_start], &limits)?;
    let frame_len = message_start + message_size;
    ensure_len(buf, frame_len)?;
    let message = Message::decode(&buf[message_start..frame_len])?;
    Ok(DecodedFrame {
        header,
        message,
        frame_len,
    })
}

/// Reads successive frames from a byte stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    limits: FrameLimits,
    buf: Vec<u8>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, FrameLimits::default())
    }

    pub fn with_limits(reader: R, limits: FrameLimits) -> Self {
        Self {
            reader,
            limits,
            buf: Vec::new(),
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between frames. A
    /// stream ending inside a frame yields an `UnexpectedEof` I/O error.
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FrameDecodeError> {
        let mut prefix = [0u8; HEADER_DELIMITER_SIZE];
        if !fill_or_eof(&mut self.reader, &mut prefix)? {
            return Ok(None);
        }
        let header_size = parse_prefix(prefix, &self.limits)?;

        self.buf.clear();
        self.buf.resize(header_size + 1, 0);
        self.reader.read_exact(&mut self.buf)?;
        let (header, message_size) = parse_header(&self.buf, &self.limits)?;

        self.buf.clear();
        self.buf.resize(message_size, 0);
        self.reader.read_exact(&mut self.buf)?;
        let message = Message::decode(self.buf.as_slice())?;
        Ok(Some(DecodedFrame {
            header,
            message,
            frame_len: HEADER_FRAMING_SIZE + header_size + message_size,
        }))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<DecodedFrame, FrameDecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

/// Fill `buf` completely, or return `false` if the stream is already at EOF.
fn fill_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}
