//! Property-based tests for frame encoding.
//!
//! These tests generate random records and check that every frame decodes
//! back to the record that produced it and that field order never changes
//! the encoded bytes.

use heka_emitter::{
    FrameLimits, FrameReader, Severity, decode_frame,
    test_utils::{SharedSink, howdy_emitter},
};
use proptest::prelude::*;

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Emergency),
        Just(Severity::Error),
        Just(Severity::Warning),
        Just(Severity::Info),
        Just(Severity::Debug),
    ]
}

proptest! {
    #[test]
    fn prop_frames_round_trip(
        severity in severity(),
        ref message_type in "[a-z.]{0,12}",
        ref payload in "\\PC{0,200}",
        ref fields in proptest::collection::btree_map("[a-z_]{1,8}", "\\PC{0,16}", 0..6),
    ) {
        let sink = SharedSink::new();
        let mut emitter = howdy_emitter(sink.clone());
        emitter.emit(severity, message_type, payload, fields).expect("emit");

        let bytes = sink.contents();
        let decoded = decode_frame(&bytes, FrameLimits::default()).expect("decode");
        prop_assert_eq!(decoded.frame_len, bytes.len());
        let message = decoded.message;
        prop_assert_eq!(message.severity(), i32::from(severity));
        prop_assert_eq!(message.r#type(), message_type.as_str());
        prop_assert_eq!(message.payload(), payload.as_str());
        let decoded_fields: Vec<_> = message
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value_string[0].clone()))
            .collect();
        let expected: Vec<_> = fields.clone().into_iter().collect();
        prop_assert_eq!(decoded_fields, expected);
    }

    #[test]
    fn prop_field_order_is_irrelevant(
        ref fields in proptest::collection::vec(("[a-z]{1,4}", "[a-z]{0,4}"), 0..8),
    ) {
        let forward = SharedSink::new();
        let backward = SharedSink::new();
        howdy_emitter(forward.clone())
            .emit(Severity::Notice, "t", "p", fields.iter().cloned())
            .expect("emit forward");
        howdy_emitter(backward.clone())
            .emit(Severity::Notice, "t", "p", fields.iter().rev().cloned())
            .expect("emit backward");
        prop_assert_eq!(forward.contents(), backward.contents());
    }

    #[test]
    fn prop_stream_splits_into_frames(
        ref payloads in proptest::collection::vec("\\PC{0,64}", 1..8),
    ) {
        let sink = SharedSink::new();
        let mut emitter = howdy_emitter(sink.clone());
        for payload in payloads {
            emitter.emit(Severity::Info, "t", payload, [("k", "v")]).expect("emit");
        }
        let bytes = sink.contents();
        let read: Vec<String> = FrameReader::new(bytes.as_slice())
            .map(|frame| frame.map(|f| f.message.payload().to_owned()))
            .collect::<Result<_, _>>()
            .expect("frames decode");
        prop_assert_eq!(&read, payloads);
    }
}
