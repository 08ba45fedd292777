//! The emitter type exported by the crate.

use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
};

use crate::{
    event::LogEvent,
    frame::FrameLimits,
    identity::{IdentitySource, SystemIdentity},
    level::Severity,
    pool::MessagePool,
};

use super::EmitError;

/// Empty field set for [`ProtobufEmitter::emit`].
pub const NO_FIELDS: [(&str, &str); 0] = [];

/// Emits framed, protobuf-encoded log messages to a sink.
///
/// Each successful [`emit`](Self::emit) performs exactly one `write` on the
/// sink. The emitter does not serialise writes across emitters: several
/// emitters sharing one underlying connection (for example through cloned
/// `TcpStream` handles) may interleave their frames unless the caller holds
/// a lock around `emit` or the sink serialises writes itself. Writes block
/// on the sink without a timeout; wrap the sink to bound them.
pub struct ProtobufEmitter<W: Write> {
    sink: Option<W>,
    env_version: String,
    hostname: String,
    logger_name: String,
    limits: FrameLimits,
    pool: Arc<MessagePool>,
    identity: Arc<dyn IdentitySource>,
}

impl<W: Write> ProtobufEmitter<W> {
    /// Create an emitter with a private pool and the system identity source.
    pub fn new(
        sink: W,
        env_version: impl Into<String>,
        hostname: impl Into<String>,
        logger_name: impl Into<String>,
    ) -> Self {
        Self::from_parts(
            sink,
            env_version.into(),
            hostname.into(),
            logger_name.into(),
            FrameLimits::default(),
            Arc::new(MessagePool::new()),
            Arc::new(SystemIdentity::new()),
        )
    }

    pub(super) fn from_parts(
        sink: W,
        env_version: String,
        hostname: String,
        logger_name: String,
        limits: FrameLimits,
        pool: Arc<MessagePool>,
        identity: Arc<dyn IdentitySource>,
    ) -> Self {
        Self {
            sink: Some(sink),
            env_version,
            hostname,
            logger_name,
            limits,
            pool,
            identity,
        }
    }

    /// Encode one record and write it to the sink.
    ///
    /// Fields are sorted by name before encoding, so the same field set
    /// yields the same bytes whatever order it is supplied in.
    pub fn emit<I, K, V>(
        &mut self,
        severity: Severity,
        message_type: &str,
        payload: &str,
        fields: I,
    ) -> Result<(), EmitError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.emit_record(severity, message_type, payload, None, fields)
    }

    /// Emit a [`LogEvent`], folding its error into the `error` field.
    pub fn emit_event(&mut self, event: &LogEvent) -> Result<(), EmitError> {
        let fields = event.encoded_fields();
        self.emit_record(
            event.severity,
            &event.message_type,
            &event.payload,
            event.logger.as_deref(),
            fields.iter(),
        )
    }

    fn emit_record<I, K, V>(
        &mut self,
        severity: Severity,
        message_type: &str,
        payload: &str,
        logger: Option<&str>,
        fields: I,
    ) -> Result<(), EmitError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let Some(sink) = self.sink.as_mut() else {
            return Err(EmitError::Closed);
        };
        let mut scratch = self.pool.acquire();
        let identity = self.identity.next_identity()?;

        let msg = &mut scratch.message;
        msg.set_identity(&identity);
        msg.set_type(message_type);
        msg.set_logger(logger.unwrap_or(&self.logger_name));
        msg.set_severity(severity.into());
        msg.set_payload(payload);
        msg.set_env_version(&self.env_version);
        msg.set_hostname(&self.hostname);
        for (name, value) in fields {
            msg.add_string_field(name.as_ref(), value.as_ref());
        }
        msg.sort_fields();

        let frame = scratch.encode_frame(self.limits)?;
        write_frame(sink, frame)
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> Result<(), EmitError> {
        let sink = self.sink.as_mut().ok_or(EmitError::Closed)?;
        sink.flush().map_err(EmitError::Transport)
    }

    /// Flush and release the sink. Calling `close` again is a no-op.
    pub fn close(&mut self) -> Result<(), EmitError> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        sink.flush().map_err(EmitError::Transport)
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// Take the sink back without flushing it. Returns `None` once closed.
    pub fn into_inner(mut self) -> Option<W> {
        self.sink.take()
    }

    pub fn limits(&self) -> FrameLimits {
        self.limits
    }
}

/// Hand `frame` to the sink in one `write` call.
fn write_frame<W: Write>(sink: &mut W, frame: &[u8]) -> Result<(), EmitError> {
    let written = loop {
        match sink.write(frame) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            result => break result.map_err(EmitError::Transport)?,
        }
    };
    if written != frame.len() {
        return Err(EmitError::Transport(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("short write: {written} of {} frame bytes", frame.len()),
        )));
    }
    Ok(())
}

impl<W: Write> Drop for ProtobufEmitter<W> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("ProtobufEmitter: flush on drop failed: {err}");
        }
    }
}

impl<W: Write> fmt::Debug for ProtobufEmitter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtobufEmitter")
            .field("logger_name", &self.logger_name)
            .field("env_version", &self.env_version)
            .field("hostname", &self.hostname)
            .field("limits", &self.limits)
            .field("closed", &self.is_closed())
            .finish()
    }
}
