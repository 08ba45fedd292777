//! Construction-time configuration for [`ProtobufEmitter`].
//!
//! [`EmitterBuilder`] collects the logger identity, frame limits, pool, and
//! identity source, validates them, and builds an emitter around a sink.
//! [`EmitterConfig`] is the serialisable subset so the surrounding logging
//! library can load emitter settings from its own configuration files.

use std::{fmt, io::Write, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    frame::FrameLimits,
    identity::{IdentitySource, SystemIdentity},
    message::MAX_HEADER_SIZE,
    pool::{DEFAULT_MAX_RETAINED_CAPACITY, DEFAULT_POOL_MAX_IDLE, MessagePool},
};

use super::ProtobufEmitter;

/// Errors that may occur while building an emitter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid emitter configuration: {0}")]
    InvalidConfig(String),
}

/// Serialisable emitter settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub env_version: Option<String>,
    pub hostname: Option<String>,
    pub logger_name: Option<String>,
    #[serde(flatten)]
    pub limits: FrameLimits,
    pub pool_max_idle: usize,
    pub pool_max_retained_capacity: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            env_version: None,
            hostname: None,
            logger_name: None,
            limits: FrameLimits::default(),
            pool_max_idle: DEFAULT_POOL_MAX_IDLE,
            pool_max_retained_capacity: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! string_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: impl Into<String>) -> Self {
            self.config.$field = Some(value.into());
            self
        }
    };
}

/// Builder for constructing [`ProtobufEmitter`] instances.
#[derive(Clone, Default)]
pub struct EmitterBuilder {
    config: EmitterConfig,
    pool: Option<Arc<MessagePool>>,
    identity: Option<Arc<dyn IdentitySource>>,
}

impl EmitterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously loaded configuration.
    pub fn from_config(config: EmitterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    string_setter!(
        #[doc = "Set the environment version stamped on each message."]
        with_env_version,
        env_version
    );
    string_setter!(
        #[doc = "Set the hostname stamped on each message."]
        with_hostname,
        hostname
    );
    string_setter!(
        #[doc = "Set the default logger name."]
        with_logger_name,
        logger_name
    );

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.config.limits.max_message_size = size;
        self
    }

    pub fn with_max_header_size(mut self, size: usize) -> Self {
        self.config.limits.max_header_size = size;
        self
    }

    /// Share `pool` with other emitters instead of building a private one.
    pub fn with_pool(mut self, pool: Arc<MessagePool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Replace the system identity source, e.g. with a
    /// [`FixedIdentity`](crate::identity::FixedIdentity) in tests.
    pub fn with_identity(mut self, identity: impl IdentitySource + 'static) -> Self {
        self.identity = Some(Arc::new(identity));
        self
    }

    fn validate(&self) -> Result<(), BuildError> {
        let config = &self.config;
        for (value, field) in [
            (&config.env_version, "env_version"),
            (&config.hostname, "hostname"),
        ] {
            if value.is_none() {
                return Err(BuildError::InvalidConfig(format!("{field} must be set")));
            }
        }
        if config.logger_name.as_deref().is_none_or(str::is_empty) {
            return Err(BuildError::InvalidConfig(
                "logger_name must be set and non-empty".into(),
            ));
        }
        ensure_positive!(config.limits.max_message_size, "max_message_size")?;
        if u32::try_from(config.limits.max_message_size).is_err() {
            return Err(BuildError::InvalidConfig(format!(
                "max_message_size must not exceed {}",
                u32::MAX
            )));
        }
        ensure_positive!(config.limits.max_header_size, "max_header_size")?;
        if config.limits.max_header_size > MAX_HEADER_SIZE {
            return Err(BuildError::InvalidConfig(format!(
                "max_header_size must not exceed {MAX_HEADER_SIZE}"
            )));
        }
        if self.pool.is_none() {
            ensure_positive!(config.pool_max_idle, "pool_max_idle")?;
            ensure_positive!(config.pool_max_retained_capacity, "pool_max_retained_capacity")?;
        }
        Ok(())
    }

    /// Validate the settings and build an emitter writing to `sink`.
    pub fn build<W: Write>(self, sink: W) -> Result<ProtobufEmitter<W>, BuildError> {
        self.validate()?;
        let Self {
            config,
            pool,
            identity,
        } = self;
        let pool = pool.unwrap_or_else(|| {
            Arc::new(MessagePool::with_limits(
                config.pool_max_idle,
                config.pool_max_retained_capacity,
            ))
        });
        let identity = identity.unwrap_or_else(|| Arc::new(SystemIdentity::new()));
        Ok(ProtobufEmitter::from_parts(
            sink,
            config.env_version.unwrap_or_default(),
            config.hostname.unwrap_or_default(),
            config.logger_name.unwrap_or_default(),
            config.limits,
            pool,
            identity,
        ))
    }
}

impl fmt::Debug for EmitterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterBuilder")
            .field("config", &self.config)
            .field("shared_pool", &self.pool.is_some())
            .field("custom_identity", &self.identity.is_some())
            .finish()
    }
}
