//! Lenient field decoders for records written by older clients, where ids were
//! millisecond numbers and ratings were form strings ("3").

use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
    Float(f64),
}

impl StringOrNumber {
    fn into_text(self) -> String {
        match self {
            StringOrNumber::Str(s) => s.trim().to_string(),
            StringOrNumber::Int(n) => n.to_string(),
            StringOrNumber::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        }
    }
}

/// Accepts `"TRADE-..."`, `1718000000000` or `"1718000000000"`.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(StringOrNumber::deserialize(deserializer)?.into_text())
}

/// Parses numbers that may have been stored as strings.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let text = StringOrNumber::deserialize(deserializer)?.into_text();
    text.parse::<T>().map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "id_string")]
        id: String,
        #[serde(deserialize_with = "lenient")]
        mood: u8,
    }

    #[test]
    fn test_numeric_id_and_string_rating() {
        let sample: Sample = serde_json::from_str(r#"{"id": 1718000000000, "mood": "4"}"#).unwrap();
        assert_eq!(sample.id, "1718000000000");
        assert_eq!(sample.mood, 4);
    }

    #[test]
    fn test_float_rating_with_zero_fraction() {
        let sample: Sample = serde_json::from_str(r#"{"id": "abc", "mood": 2.0}"#).unwrap();
        assert_eq!(sample.id, "abc");
        assert_eq!(sample.mood, 2);
    }

    #[test]
    fn test_garbage_rating_is_rejected() {
        let result: Result<Sample, _> = serde_json::from_str(r#"{"id": "abc", "mood": "happy"}"#);
        assert!(result.is_err());
    }
}
