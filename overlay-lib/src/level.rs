//! Linear and dB gain values, as accepted in job files and on the command line.

use serde::de::{Error as DeError, Visitor};
use serde::Deserializer;
use std::fmt;

/// Convert a dB value to linear gain.
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Parse a gain given either as a plain linear multiplier (`"0.5"`) or with a
/// dB suffix (`"-6db"`), returning the linear value.
pub fn parse_gain(value: &str) -> Option<f64> {
    if let Some(db) = parse_db_suffix(value) {
        return Some(db_to_linear(db));
    }
    parse_number(value)
}

/// Deserialize a linear gain value that may be expressed in dB.
pub fn deserialize_linear_gain<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct GainVisitor;

    impl<'de> Visitor<'de> for GainVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a string like \"6db\"")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            Ok(value as f64)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            Ok(value as f64)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            parse_gain(value)
                .ok_or_else(|| DeError::custom(format!("invalid gain value \"{}\"", value)))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            self.visit_str(&value)
        }
    }

    deserializer.deserialize_any(GainVisitor)
}

fn parse_db_suffix(value: &str) -> Option<f64> {
    let lower = value.trim().to_ascii_lowercase();
    let db_part = lower.strip_suffix("db")?;
    db_part.trim().parse::<f64>().ok()
}

fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
