//! Helpers for converting and parsing decibel levels.

use serde::de::{Error as DeError, Visitor};
use serde::Deserializer;
use std::fmt;

/// Convert a dB value to linear gain.
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude to dB. Silence maps to a very low finite value.
pub fn linear_to_db(value: f32) -> f32 {
    let v = value.abs().max(f32::MIN_POSITIVE);
    20.0 * v.log10()
}

/// Deserialize a dB level given either as a number or a string like `"-20db"`.
pub fn deserialize_db<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    struct DbVisitor;

    impl<'de> Visitor<'de> for DbVisitor {
        type Value = f32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number of decibels or a string like \"-20db\"")
        }

        fn visit_f64<E: DeError>(self, value: f64) -> Result<Self::Value, E> {
            Ok(value as f32)
        }

        fn visit_i64<E: DeError>(self, value: i64) -> Result<Self::Value, E> {
            Ok(value as f32)
        }

        fn visit_u64<E: DeError>(self, value: u64) -> Result<Self::Value, E> {
            Ok(value as f32)
        }

        fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
            parse_db_str(value)
                .ok_or_else(|| DeError::custom(format!("invalid level \"{}\"", value)))
        }
    }

    deserializer.deserialize_any(DbVisitor)
}

fn parse_db_str(value: &str) -> Option<f32> {
    let lower = value.trim().to_ascii_lowercase();
    let number = lower.strip_suffix("db").unwrap_or(&lower).trim();
    if number.is_empty() {
        return None;
    }
    number.parse::<f32>().ok()
}
