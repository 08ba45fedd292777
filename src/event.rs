//! Log event representation accepted by the emitter.
//!
//! A [`LogEvent`] captures one record as handed over by the surrounding
//! logging library. Additional context arrives as [`ExtraData`] values which
//! are folded into the event's string fields by [`merge_extra`].

use std::{borrow::Cow, collections::BTreeMap, error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::level::Severity;

/// Field name under which an attached error is recorded.
pub const ERROR_FIELD: &str = "error";

/// Extra data attached to a log call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtraData {
    /// A single key/value pair.
    String { key: String, value: String },
    /// The rendered message of an error.
    Error(String),
    /// A set of key/value pairs.
    Map(BTreeMap<String, String>),
}

impl ExtraData {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::String {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Capture an error by its `Display` output.
    pub fn error(err: &(dyn Error + '_)) -> Self {
        Self::Error(err.to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtraData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Fold `extra` into `fields`.
///
/// Later values overwrite earlier ones with the same key. Errors are stored
/// under [`ERROR_FIELD`].
pub fn merge_extra(fields: &mut BTreeMap<String, String>, extra: ExtraData) {
    match extra {
        ExtraData::String { key, value } => {
            fields.insert(key, value);
        }
        ExtraData::Error(message) => {
            fields.insert(ERROR_FIELD.to_owned(), message);
        }
        ExtraData::Map(map) => fields.extend(map),
    }
}

/// One log record to be emitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEvent {
    pub severity: Severity,
    pub message_type: String,
    pub payload: String,
    /// Overrides the emitter's logger name when set.
    pub logger: Option<String>,
    pub fields: BTreeMap<String, String>,
    /// Rendered error attached to the record.
    pub error: Option<String>,
}

impl LogEvent {
    pub fn new(severity: Severity, message_type: &str, payload: &str) -> Self {
        Self {
            severity,
            message_type: message_type.to_owned(),
            payload: payload.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_error(mut self, err: &(dyn Error + '_)) -> Self {
        self.error = Some(err.to_string());
        self
    }

    /// Merge `extra` into the event. Error data replaces any stored error.
    pub fn with_extra(mut self, extra: ExtraData) -> Self {
        match extra {
            ExtraData::Error(message) => self.error = Some(message),
            other => merge_extra(&mut self.fields, other),
        }
        self
    }

    /// Fields to encode: the event fields plus the error, if any.
    ///
    /// Returns the fields borrowed when there is no error to add.
    pub fn encoded_fields(&self) -> Cow<'_, BTreeMap<String, String>> {
        match &self.error {
            None => Cow::Borrowed(&self.fields),
            Some(message) => {
                let mut fields = self.fields.clone();
                merge_extra(&mut fields, ExtraData::Error(message.clone()));
                Cow::Owned(fields)
            }
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.severity, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl Error for Boom {}

    #[rstest]
    fn merge_inserts_each_variant() {
        let mut fields = BTreeMap::new();
        merge_extra(&mut fields, ExtraData::string("a", "1"));
        merge_extra(&mut fields, [("b", "2"), ("a", "3")].into_iter().collect());
        merge_extra(&mut fields, ExtraData::error(&Boom));
        assert_eq!(fields.get("a").map(String::as_str), Some("3"));
        assert_eq!(fields.get("b").map(String::as_str), Some("2"));
        assert_eq!(fields.get(ERROR_FIELD).map(String::as_str), Some("boom"));
    }

    #[rstest]
    fn later_error_wins() {
        let event = LogEvent::new(Severity::Error, "t", "p")
            .with_extra(ExtraData::Error("first".into()))
            .with_extra(ExtraData::Error("second".into()));
        assert_eq!(event.error.as_deref(), Some("second"));
    }

    #[rstest]
    fn encoded_fields_borrow_without_error() {
        let event = LogEvent::new(Severity::Info, "t", "p").with_field("k", "v");
        assert!(matches!(event.encoded_fields(), Cow::Borrowed(_)));
    }

    #[rstest]
    fn encoded_fields_include_error() {
        let event = LogEvent::new(Severity::Error, "t", "p")
            .with_field("k", "v")
            .with_error(&Boom);
        let fields = event.encoded_fields();
        assert_eq!(fields.get(ERROR_FIELD).map(String::as_str), Some("boom"));
        assert_eq!(fields.get("k").map(String::as_str), Some("v"));
    }

    #[rstest]
    fn event_survives_json_round_trip() {
        let event = LogEvent::new(Severity::Notice, "audit", "login")
            .with_logger("auth")
            .with_field("user", "42")
            .with_error(&Boom);
        let json = serde_json::to_string(&event).expect("serialise");
        assert!(json.contains(r#""severity":"NOTICE""#));
        let back: LogEvent = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, event);
    }

    #[rstest]
    fn event_loads_with_defaults() {
        let event: LogEvent =
            serde_json::from_str(r#"{"severity":"ERROR","message_type":"t","payload":"p"}"#)
                .expect("deserialise");
        assert_eq!(event, LogEvent::new(Severity::Error, "t", "p"));
    }

    #[rstest]
    fn display_shows_severity_and_payload() {
        let event = LogEvent::new(Severity::Warning, "t", "disk low");
        assert_eq!(event.to_string(), "WARNING - disk low");
    }
}
