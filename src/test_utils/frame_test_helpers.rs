//! Reference frame used to pin the wire format.

use chrono::{TimeZone, Utc};

use crate::{
    emitter::{EmitterBuilder, ProtobufEmitter},
    identity::FixedIdentity,
};

use super::sinks::SharedSink;

/// Identifier `d1c7c768-b1be-4c70-93a6-9b52910d4baa`.
pub const HOWDY_ID: [u8; 16] = [
    0xd1, 0xc7, 0xc7, 0x68, 0xb1, 0xbe, 0x4c, 0x70, 0x93, 0xa6, 0x9b, 0x52, 0x91, 0x0d, 0x4b, 0xaa,
];

/// Frame for INFO "test"/"Howdy" with fields a=b, c=d, e=f emitted by
/// logger `test-json-emitter` on `example.com`, env version `2`, pid 1234,
/// at 2009-11-10 23:00:00 UTC.
pub const HOWDY_FRAME: &[u8] = &[
    0x1e, 0x02, // header length
    0x08, 0x75, // header: message_length = 117
    0x1f, // message
    0x0a, 0x10, 0xd1, 0xc7, 0xc7, 0x68, 0xb1, 0xbe, 0x4c, 0x70, 0x93, 0xa6, 0x9b, 0x52, 0x91,
    0x0d, 0x4b, 0xaa, 0x10, 0x80, 0xc0, 0xe1, 0xd8, 0xda, 0xfd, 0xbb, 0xba, 0x11, 0x1a, 0x04,
    0x74, 0x65, 0x73, 0x74, 0x22, 0x11, 0x74, 0x65, 0x73, 0x74, 0x2d, 0x6a, 0x73, 0x6f, 0x6e,
    0x2d, 0x65, 0x6d, 0x69, 0x74, 0x74, 0x65, 0x72, 0x28, 0x06, 0x32, 0x05, 0x48, 0x6f, 0x77,
    0x64, 0x79, 0x3a, 0x01, 0x32, 0x40, 0xd2, 0x09, 0x4a, 0x0b, 0x65, 0x78, 0x61, 0x6d, 0x70,
    0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d, 0x52, 0x0a, 0x0a, 0x01, 0x61, 0x10, 0x00, 0x1a, 0x00,
    0x22, 0x01, 0x62, 0x52, 0x0a, 0x0a, 0x01, 0x63, 0x10, 0x00, 0x1a, 0x00, 0x22, 0x01, 0x64,
    0x52, 0x0a, 0x0a, 0x01, 0x65, 0x10, 0x00, 0x1a, 0x00, 0x22, 0x01, 0x66,
];

/// Identity matching [`HOWDY_FRAME`].
pub fn howdy_identity() -> FixedIdentity {
    let at = Utc
        .timestamp_opt(1_257_894_000, 0)
        .single()
        .expect("reference timestamp is valid");
    FixedIdentity::new(HOWDY_ID, at, 1234).expect("reference identity is valid")
}

/// Emitter configured like the one that produced [`HOWDY_FRAME`].
pub fn howdy_emitter(sink: SharedSink) -> ProtobufEmitter<SharedSink> {
    EmitterBuilder::new()
        .with_env_version("2")
        .with_hostname("example.com")
        .with_logger_name("test-json-emitter")
        .with_identity(howdy_identity())
        .build(sink)
        .expect("reference emitter configuration is valid")
}
