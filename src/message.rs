//! Protocol buffer schema for framed log messages.
//!
//! Field numbers follow the Heka message schema so frames can be consumed by
//! existing collectors. The structs are derived with `prost` using proto2
//! labels: `required` fields are always written, and `optional` fields are
//! written whenever they are `Some`, even when they hold the default value.

use crate::identity::Identity;

/// First byte of every frame.
pub const RECORD_SEPARATOR: u8 = 0x1E;
/// Byte separating the header from the message.
pub const UNIT_SEPARATOR: u8 = 0x1F;
/// Record separator plus the header length byte.
pub const HEADER_DELIMITER_SIZE: usize = 2;
/// All framing bytes surrounding the header.
pub const HEADER_FRAMING_SIZE: usize = HEADER_DELIMITER_SIZE + 1;
/// Largest header the single length byte can describe.
pub const MAX_HEADER_SIZE: usize = 255;
/// Default ceiling for an encoded message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;
/// Width of the message identifier.
pub const UUID_SIZE: usize = 16;

/// Frame header describing the message that follows it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(uint32, required, tag = "1")]
    pub message_length: u32,
}

/// Encoding of the values held by a [`Field`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ValueType {
    String = 0,
    Bytes = 1,
    Integer = 2,
    Double = 3,
    Bool = 4,
}

/// A named, typed value attached to a message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Field {
    #[prost(string, required, tag = "1")]
    pub name: String,
    #[prost(enumeration = "ValueType", optional, tag = "2")]
    pub value_type: Option<i32>,
    #[prost(string, optional, tag = "3")]
    pub representation: Option<String>,
    #[prost(string, repeated, tag = "4")]
    pub value_string: Vec<String>,
    #[prost(bytes = "vec", repeated, tag = "5")]
    pub value_bytes: Vec<Vec<u8>>,
    #[prost(int64, repeated, packed = "true", tag = "6")]
    pub value_integer: Vec<i64>,
    #[prost(double, repeated, packed = "true", tag = "7")]
    pub value_double: Vec<f64>,
    #[prost(bool, repeated, packed = "true", tag = "8")]
    pub value_bool: Vec<bool>,
}

impl Field {
    /// Single-valued string field with an empty representation.
    pub fn string(name: &str, value: &str) -> Self {
        Self {
            name: name.to_owned(),
            value_type: Some(ValueType::String as i32),
            representation: Some(String::new()),
            value_string: vec![value.to_owned()],
            ..Default::default()
        }
    }
}

/// A structured log record.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Message {
    #[prost(bytes = "vec", required, tag = "1")]
    pub uuid: Vec<u8>,
    #[prost(int64, required, tag = "2")]
    pub timestamp: i64,
    #[prost(string, optional, tag = "3")]
    pub r#type: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub logger: Option<String>,
    #[prost(int32, optional, tag = "5", default = "7")]
    pub severity: Option<i32>,
    #[prost(string, optional, tag = "6")]
    pub payload: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub env_version: Option<String>,
    #[prost(int32, optional, tag = "8")]
    pub pid: Option<i32>,
    #[prost(string, optional, tag = "9")]
    pub hostname: Option<String>,
    #[prost(message, repeated, tag = "10")]
    pub fields: Vec<Field>,
}

/// Overwrite `slot` with `value`, reusing the existing allocation.
fn assign(slot: &mut Option<String>, value: &str) {
    let buf = slot.get_or_insert_with(String::new);
    buf.clear();
    buf.push_str(value);
}

/// Empty `slot` while keeping its allocation for the next message.
fn blank(slot: &mut Option<String>) {
    if let Some(buf) = slot.as_mut() {
        buf.clear();
    }
}

impl Message {
    /// Stamp the identifier, timestamp, and pid from `identity`.
    pub fn set_identity(&mut self, identity: &Identity) {
        self.uuid.clear();
        self.uuid.extend_from_slice(&identity.id);
        self.timestamp = identity.timestamp_ns;
        self.pid = Some(identity.pid);
    }

    pub fn set_type(&mut self, message_type: &str) {
        assign(&mut self.r#type, message_type);
    }

    pub fn set_logger(&mut self, logger: &str) {
        assign(&mut self.logger, logger);
    }

    pub fn set_severity(&mut self, severity: i32) {
        self.severity = Some(severity);
    }

    pub fn set_payload(&mut self, payload: &str) {
        assign(&mut self.payload, payload);
    }

    pub fn set_env_version(&mut self, env_version: &str) {
        assign(&mut self.env_version, env_version);
    }

    pub fn set_hostname(&mut self, hostname: &str) {
        assign(&mut self.hostname, hostname);
    }

    /// Append a single-valued string field.
    pub fn add_string_field(&mut self, name: &str, value: &str) {
        self.fields.push(Field::string(name, value));
    }

    /// Order fields by name so equal field sets encode to equal bytes.
    ///
    /// Ties on the name fall back to the string values, which keeps the
    /// output independent of insertion order even for repeated names.
    pub fn sort_fields(&mut self) {
        self.fields.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.value_string.cmp(&b.value_string))
        });
    }

    /// Clear every field before the message is reused.
    ///
    /// String slots keep their allocations; the field list is emptied so no
    /// names or values from the previous record survive.
    pub fn reset(&mut self) {
        self.uuid.clear();
        self.timestamp = 0;
        blank(&mut self.r#type);
        blank(&mut self.logger);
        self.severity = None;
        blank(&mut self.payload);
        blank(&mut self.env_version);
        self.pid = None;
        blank(&mut self.hostname);
        self.fields.clear();
    }

    /// Drop allocations that have grown past `limit` bytes.
    ///
    /// The field list is measured by its slot capacity, so call this after
    /// [`reset`](Self::reset).
    pub fn release_oversized(&mut self, limit: usize) {
        if self.fields.capacity() * std::mem::size_of::<Field>() > limit {
            self.fields = Vec::new();
        }
        for slot in [
            &mut self.r#type,
            &mut self.logger,
            &mut self.payload,
            &mut self.env_version,
            &mut self.hostname,
        ] {
            if slot.as_ref().is_some_and(|buf| buf.capacity() > limit) {
                *slot = None;
            }
        }
    }

    /// Look up the first string value of the field called `name`.
    pub fn string_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .and_then(|field| field.value_string.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;
    use rstest::rstest;

    #[rstest]
    fn header_encodes_length_only() {
        let header = Header {
            message_length: 117,
        };
        assert_eq!(header.encode_to_vec(), vec![0x08, 0x75]);
    }

    #[rstest]
    fn string_field_carries_type_and_representation() {
        let field = Field::string("a", "b");
        assert_eq!(
            field.encode_to_vec(),
            vec![0x0a, 0x01, 0x61, 0x10, 0x00, 0x1a, 0x00, 0x22, 0x01, 0x62]
        );
        assert_eq!(field.value_type(), ValueType::String);
    }

    #[rstest]
    fn sort_fields_orders_by_name() {
        let mut msg = Message::default();
        msg.add_string_field("c", "d");
        msg.add_string_field("a", "b");
        msg.add_string_field("e", "f");
        msg.sort_fields();
        let names: Vec<_> = msg.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "e"]);
    }

    #[rstest]
    fn sort_fields_breaks_ties_on_value() {
        let mut first = Message::default();
        first.add_string_field("k", "2");
        first.add_string_field("k", "1");
        first.sort_fields();

        let mut second = Message::default();
        second.add_string_field("k", "1");
        second.add_string_field("k", "2");
        second.sort_fields();

        assert_eq!(first.encode_to_vec(), second.encode_to_vec());
    }

    #[rstest]
    fn reset_clears_fields_and_text() {
        let mut msg = Message::default();
        msg.set_logger("svc");
        msg.set_payload("hello");
        msg.set_severity(3);
        msg.add_string_field("user", "42");
        msg.reset();

        assert!(msg.fields.is_empty());
        assert_eq!(msg.logger(), "");
        assert_eq!(msg.payload(), "");
        assert_eq!(msg.severity(), 7);
        assert!(msg.uuid.is_empty());
    }

    #[rstest]
    fn string_field_lookup() {
        let mut msg = Message::default();
        msg.add_string_field("user", "42");
        assert_eq!(msg.string_field("user"), Some("42"));
        assert_eq!(msg.string_field("missing"), None);
    }
}
