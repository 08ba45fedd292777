//! End-to-end tests: emit frames and read them back as a collector would.

use std::{
    sync::{Arc, Barrier},
    thread,
};

use heka_emitter::{
    EmitterBuilder, FrameLimits, FrameReader, MessagePool, Severity, decode_frame,
    test_utils::{HOWDY_FRAME, SharedSink, howdy_emitter, howdy_identity},
};
use itertools::Itertools;
use rstest::rstest;

const FIELDS: [(&str, &str); 3] = [("c", "d"), ("a", "b"), ("e", "f")];

#[rstest]
fn field_order_does_not_change_bytes() {
    for order in FIELDS.iter().copied().permutations(FIELDS.len()) {
        let sink = SharedSink::new();
        let mut emitter = howdy_emitter(sink.clone());
        emitter
            .emit(Severity::Info, "test", "Howdy", order.clone())
            .expect("emit");
        assert_eq!(sink.contents(), HOWDY_FRAME, "field order {order:?}");
    }
}

#[rstest]
fn collector_reads_back_every_frame() {
    let sink = SharedSink::new();
    let mut emitter = EmitterBuilder::new()
        .with_env_version("0.8")
        .with_hostname("web-1")
        .with_logger_name("checkout")
        .build(sink.clone())
        .expect("build");
    let severities = [Severity::Debug, Severity::Warning, Severity::Critical];
    for (n, severity) in severities.iter().enumerate() {
        emitter
            .emit(*severity, "request", &format!("request {n}"), [("n", n.to_string())])
            .expect("emit");
    }
    emitter.close().expect("close");

    let bytes = sink.contents();
    let frames: Vec<_> = FrameReader::new(bytes.as_slice())
        .collect::<Result<_, _>>()
        .expect("frames decode");
    assert_eq!(frames.len(), severities.len());
    for (n, (frame, severity)) in frames.iter().zip(severities).enumerate() {
        let message = &frame.message;
        assert_eq!(message.severity(), i32::from(severity));
        assert_eq!(message.payload(), format!("request {n}"));
        assert_eq!(message.logger(), "checkout");
        assert_eq!(message.env_version(), "0.8");
        assert_eq!(message.string_field("n"), Some(n.to_string().as_str()));
    }
    assert!(frames.iter().map(|f| &f.message.uuid).all_unique());
}

#[rstest]
fn emitters_share_a_pool_across_threads() {
    const THREADS: usize = 6;
    const EMITS: usize = 50;
    let pool = Arc::new(MessagePool::with_limits(2, 1024));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let sink = SharedSink::new();
                let mut emitter = EmitterBuilder::new()
                    .with_env_version("1")
                    .with_hostname("host")
                    .with_logger_name(format!("worker-{n}"))
                    .with_pool(pool)
                    .build(sink.clone())
                    .expect("build");
                barrier.wait();
                for i in 0..EMITS {
                    let fields = [("thread", n.to_string()), ("i", i.to_string())];
                    emitter
                        .emit(Severity::Info, "tick", "beat", fields)
                        .expect("emit");
                }
                (n, sink.contents())
            })
        })
        .collect();

    for handle in handles {
        let (n, bytes) = handle.join().expect("worker thread panicked");
        let frames: Vec<_> = FrameReader::new(bytes.as_slice())
            .collect::<Result<_, _>>()
            .expect("frames decode");
        assert_eq!(frames.len(), EMITS);
        for (i, frame) in frames.iter().enumerate() {
            let message = &frame.message;
            assert_eq!(message.logger(), format!("worker-{n}"));
            assert_eq!(message.fields.len(), 2, "fields leaked between emits");
            assert_eq!(message.string_field("thread"), Some(n.to_string().as_str()));
            assert_eq!(message.string_field("i"), Some(i.to_string().as_str()));
        }
    }
    let stats = pool.stats();
    assert_eq!(stats.created + stats.reused, (THREADS * EMITS) as u64);
    assert!(pool.idle_count() <= 2);
}

#[rstest]
fn reference_frame_decodes_to_its_inputs() {
    let decoded = decode_frame(HOWDY_FRAME, FrameLimits::default()).expect("decode");
    let message = decoded.message;
    let identity = howdy_identity().identity();
    assert_eq!(decoded.header.message_length, 117);
    assert_eq!(decoded.frame_len, HOWDY_FRAME.len());
    assert_eq!(message.uuid, identity.id);
    assert_eq!(message.timestamp, identity.timestamp_ns);
    assert_eq!(message.pid(), 1234);
    assert_eq!(message.r#type(), "test");
    assert_eq!(message.hostname(), "example.com");
    let fields: Vec<_> = message
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.value_string[0].as_str()))
        .collect();
    assert_eq!(fields, [("a", "b"), ("c", "d"), ("e", "f")]);
}
