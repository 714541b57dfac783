//! Human-readable size and transfer-rate formatting

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid size format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

/// Byte count that deserializes from either an integer or a string like `"64KB"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        if digits.is_empty() {
            return Err(ParseError::InvalidFormat(s.clone()));
        }

        let value: u64 = digits.parse()?;
        let multiplier = match unit.trim() {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => KIB,
            "M" | "MB" | "MIB" => MIB,
            "G" | "GB" | "GIB" => GIB,
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };

        Ok(ByteSize(value * multiplier))
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ByteSizeVisitor;

        impl serde::de::Visitor<'_> for ByteSizeVisitor {
            type Value = ByteSize;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte size as string (e.g. \"64KB\") or integer")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ByteSize(v))
            }

            // The `config` crate hands integers over as i64.
            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(ByteSize)
                    .map_err(|_| E::custom("byte size must not be negative"))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<ByteSize>().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ByteSizeVisitor)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            n if n >= GIB && n % GIB == 0 => write!(f, "{}GB", n / GIB),
            n if n >= MIB && n % MIB == 0 => write!(f, "{}MB", n / MIB),
            n if n >= KIB && n % KIB == 0 => write!(f, "{}KB", n / KIB),
            n => write!(f, "{}B", n),
        }
    }
}

/// Format a transfer rate in bytes per second, e.g. `1.5 MB/s`.
///
/// Non-finite or non-positive rates have no meaningful rendering and yield `None`.
pub fn format_speed(bytes_per_sec: f64) -> Option<String> {
    const UNITS: &[&str] = &["B/s", "KB/s", "MB/s", "GB/s"];

    if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
        return None;
    }

    let mut value = bytes_per_sec;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    Some(format!("{:.1} {}", value, UNITS[unit]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sizes() {
        assert_eq!("512".parse::<ByteSize>().unwrap().as_u64(), 512);
        assert_eq!("64KB".parse::<ByteSize>().unwrap().as_u64(), 64 * 1024);
        assert_eq!("1m".parse::<ByteSize>().unwrap().as_u64(), 1024 * 1024);
        assert_eq!(" 2 GiB ".parse::<ByteSize>().unwrap().as_u64(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("KB".parse::<ByteSize>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("10XB".parse::<ByteSize>(), Err(ParseError::InvalidUnit(_))));
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct Limits {
            a: ByteSize,
            b: ByteSize,
        }
        let parsed: Limits = serde_json::from_str(r#"{"a": "64KB", "b": 2048}"#).unwrap();
        assert_eq!(parsed.a.as_u64(), 64 * 1024);
        assert_eq!(parsed.b.as_u64(), 2048);
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteSize(64 * 1024).to_string(), "64KB");
        assert_eq!(ByteSize(1024 * 1024).to_string(), "1MB");
        assert_eq!(ByteSize(1500).to_string(), "1500B");
    }

    #[test]
    fn test_format_speed_units() {
        assert_eq!(format_speed(512.0).as_deref(), Some("512.0 B/s"));
        assert_eq!(format_speed(1536.0).as_deref(), Some("1.5 KB/s"));
        assert_eq!(format_speed(3.0 * 1024.0 * 1024.0).as_deref(), Some("3.0 MB/s"));
    }

    #[test]
    fn test_format_speed_rejects_unknown_rates() {
        assert_eq!(format_speed(0.0), None);
        assert_eq!(format_speed(-4.0), None);
        assert_eq!(format_speed(f64::NAN), None);
    }
}
