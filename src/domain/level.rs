use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest severity number defined by the OTel log data model (TRACE).
pub const SEVERITY_NUMBER_MIN: i32 = 1;
/// Highest severity number defined by the OTel log data model (FATAL4).
pub const SEVERITY_NUMBER_MAX: i32 = 24;

/// Syslog severity carried in the GELF `level` field.
///
/// Lower values are more severe. This is distinct from `app::config::LogLevel`,
/// which configures the exporter's own tracing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GelfLevel {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Informational = 6,
    Debug = 7,
}

impl GelfLevel {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Maps an OTel severity number onto the syslog scale.
    ///
    /// OTel severity numbers:
    /// - 1-4: TRACE, 5-8: DEBUG -> debug
    /// - 9-12: INFO -> informational
    /// - 13-16: WARN -> warning
    /// - 17-20: ERROR -> error
    /// - 21-22: FATAL, FATAL2 -> critical
    /// - 23: FATAL3 -> alert
    /// - 24: FATAL4 -> emergency
    ///
    /// Numbers outside 1..=24 (including 0, "unspecified") clamp to the nearest
    /// boundary.
    pub fn from_severity_number(severity_number: i32) -> Self {
        match severity_number.clamp(SEVERITY_NUMBER_MIN, SEVERITY_NUMBER_MAX) {
            1..=8 => GelfLevel::Debug,
            9..=12 => GelfLevel::Informational,
            13..=16 => GelfLevel::Warning,
            17..=20 => GelfLevel::Error,
            21..=22 => GelfLevel::Critical,
            23 => GelfLevel::Alert,
            _ => GelfLevel::Emergency,
        }
    }
}

impl From<i32> for GelfLevel {
    fn from(severity_number: i32) -> Self {
        GelfLevel::from_severity_number(severity_number)
    }
}

impl fmt::Display for GelfLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GelfLevel::Emergency => "emergency",
            GelfLevel::Alert => "alert",
            GelfLevel::Critical => "critical",
            GelfLevel::Error => "error",
            GelfLevel::Warning => "warning",
            GelfLevel::Notice => "notice",
            GelfLevel::Informational => "informational",
            GelfLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}
