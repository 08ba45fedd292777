//! Syslog severity levels carried in the `severity` field of each message.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Syslog severities, most severe first.
///
/// The numeric value is written to the wire unchanged, so the discriminants
/// must not be reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(i32)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Info
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EMERGENCY" | "EMERG" => Ok(Self::Emergency),
            "ALERT" => Ok(Self::Alert),
            "CRITICAL" | "CRIT" => Ok(Self::Critical),
            "ERROR" | "ERR" => Ok(Self::Error),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "NOTICE" => Ok(Self::Notice),
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            _ => Err(()),
        }
    }
}

impl TryFrom<i32> for Severity {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, i32> {
        Ok(match value {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            7 => Self::Debug,
            other => return Err(other),
        })
    }
}

impl From<Severity> for i32 {
    fn from(severity: Severity) -> Self {
        severity as i32
    }
}

impl Severity {
    pub fn parse_or_info(s: &str) -> Self {
        s.parse().unwrap_or(Self::Info)
    }

    /// Upper-case syslog name of the severity.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "EMERGENCY",
            Self::Alert => "ALERT",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("info", Severity::Info)]
    #[case("WARN", Severity::Warning)]
    #[case("warning", Severity::Warning)]
    #[case("crit", Severity::Critical)]
    #[case("Emergency", Severity::Emergency)]
    fn parses_names(#[case] input: &str, #[case] expected: Severity) {
        assert_eq!(input.parse::<Severity>(), Ok(expected));
    }

    #[rstest]
    fn unknown_name_falls_back_to_info() {
        assert_eq!(Severity::parse_or_info("loud"), Severity::Info);
    }

    #[rstest]
    fn wire_values_follow_syslog() {
        assert_eq!(i32::from(Severity::Emergency), 0);
        assert_eq!(i32::from(Severity::Info), 6);
        assert_eq!(i32::from(Severity::Debug), 7);
        assert_eq!(Severity::try_from(3), Ok(Severity::Error));
        assert_eq!(Severity::try_from(8), Err(8));
    }
}
