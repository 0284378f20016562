//! Lenient scalar deserializers for corpus documents.
//!
//! OSSEM YAML is hand-edited: event ids show up as integers, sample values as
//! numbers or nulls, and uncovered ATT&CK data sources as a literal `0`. These
//! helpers read all of them into the string/rating shapes the domain uses.

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }

    fn is_falsy(&self) -> bool {
        match self {
            Scalar::Text(s) => matches!(s.trim(), "" | "0"),
            Scalar::Int(i) => *i == 0,
            Scalar::Float(f) => *f == 0.0,
            Scalar::Bool(b) => !*b,
        }
    }
}

/// Any scalar as a string; null becomes the empty string
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

/// Any scalar as an optional string; only null is absent
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

/// A label that is absent when null, empty, `0` or `false`
pub fn label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .filter(|scalar| !scalar.is_falsy())
        .map(Scalar::into_text))
}

/// A small non-negative integer rating; accepts integers, integral floats and numeric strings
pub fn rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Scalar::Int(i)) => u8::try_from(i)
            .map_err(|_| de::Error::custom(format!("rating {} is out of range", i))),
        Some(Scalar::Float(f)) if f.fract() == 0.0 && (0.0..=255.0).contains(&f) => Ok(f as u8),
        Some(Scalar::Float(f)) => Err(de::Error::custom(format!("rating {} is not a whole number", f))),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse::<u8>()
            .map_err(|e| de::Error::custom(format!("rating '{}' is not a number: {}", s, e))),
        Some(Scalar::Bool(b)) => Err(de::Error::custom(format!("rating cannot be a boolean ({})", b))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Record {
        #[serde(default, deserialize_with = "string")]
        text: String,
        #[serde(default, deserialize_with = "label")]
        source: Option<String>,
        #[serde(default, deserialize_with = "rating")]
        rating: u8,
    }

    #[test]
    fn test_integer_event_ids_read_as_text() {
        let record: Record = serde_yaml::from_str("text: 4688").unwrap();
        assert_eq!(record.text, "4688");
    }

    #[test]
    fn test_null_reads_as_empty_text() {
        let record: Record = serde_yaml::from_str("text: null").unwrap();
        assert_eq!(record.text, "");
    }

    #[test]
    fn test_zero_data_source_is_absent() {
        let record: Record = serde_yaml::from_str("source: 0").unwrap();
        assert_eq!(record.source, None);

        let record: Record = serde_yaml::from_str("source: ''").unwrap();
        assert_eq!(record.source, None);

        let record: Record = serde_yaml::from_str("source: ' 0 '").unwrap();
        assert_eq!(record.source, None);

        let record: Record = serde_yaml::from_str("source: Process").unwrap();
        assert_eq!(record.source.as_deref(), Some("Process"));
    }

    #[test]
    fn test_rating_accepts_numeric_strings() {
        let record: Record = serde_yaml::from_str("rating: '4'").unwrap();
        assert_eq!(record.rating, 4);

        let record: Record = serde_yaml::from_str("rating: 3").unwrap();
        assert_eq!(record.rating, 3);
    }

    #[test]
    fn test_rating_rejects_negative_values() {
        let result: Result<Record, _> = serde_yaml::from_str("rating: -1");
        assert!(result.is_err());
    }
}
