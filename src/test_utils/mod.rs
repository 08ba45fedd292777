//! Helpers shared by unit tests and, through the `test-util` feature, by the
//! integration tests.
//!
//! Provides in-memory sinks that record what the emitter writes or fail on
//! demand, plus the fixed identity and expected bytes of the reference
//! "Howdy" frame.

pub mod frame_test_helpers;
pub mod sinks;

pub use frame_test_helpers::{HOWDY_FRAME, howdy_emitter, howdy_identity};
pub use sinks::{FailingSink, FailureMode, SharedSink};
