//! Record wire format and content-addressed hashes.

use crate::config::{EngineConfig, SHORT_HASH_LENGTH};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Non-secret data carried alongside a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Free-form challenge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

/// The transportable unit printed on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// KDF salt.
    #[serde(with = "base64_field")]
    pub salt: Vec<u8>,
    /// Record iv (GCM nonce and HKDF salt).
    #[serde(with = "base64_field")]
    pub iv: Vec<u8>,
    /// Header slots.
    #[serde(with = "base64_field")]
    pub headers: Vec<u8>,
    /// Sealed data region.
    #[serde(with = "base64_field")]
    pub data: Vec<u8>,
    /// Label and challenge.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Record {
    /// Size of the header and data regions.
    pub fn size(&self) -> usize {
        self.headers.len() + self.data.len()
    }
}

/// Full and short content hash of a serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordHash {
    /// Hex SHA-256 of the serialized record.
    pub full: String,
    /// Prefix of `full` printed on the card.
    pub short: String,
}

/// Serializes records to and from their canonical text form.
#[derive(Debug, Clone)]
pub struct PayloadCodec {
    capacity: usize,
    header_size: usize,
    max_label_length: usize,
}

impl PayloadCodec {
    /// Create a codec enforcing the limits of `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            capacity: config.capacity,
            header_size: config.header_size,
            max_label_length: config.max_label_length,
        }
    }

    /// Serialize a record to pretty-printed JSON.
    pub fn serialize(&self, record: &Record) -> Result<String> {
        Ok(serde_json::to_string_pretty(record)?)
    }

    /// Parse scanned text into a record.
    ///
    /// Anything that is not a complete record within this codec's limits
    /// is `MalformedPayload`.
    pub fn deserialize(&self, text: &str) -> Result<Record> {
        let record: Record = serde_json::from_str(text.trim())
            .map_err(|e| Error::MalformedPayload(e.to_string()))?;

        for (name, field) in [
            ("salt", &record.salt),
            ("iv", &record.iv),
            ("headers", &record.headers),
            ("data", &record.data),
        ] {
            if field.is_empty() {
                return Err(Error::MalformedPayload(format!("missing {}", name)));
            }
        }
        if record.headers.len() > self.header_size {
            return Err(Error::MalformedPayload(format!(
                "headers exceed {} bytes",
                self.header_size
            )));
        }
        if record.data.len() > self.capacity {
            return Err(Error::MalformedPayload(format!(
                "data exceeds {} bytes",
                self.capacity
            )));
        }
        if let Some(label) = &record.metadata.label {
            if label.chars().count() > self.max_label_length {
                return Err(Error::MalformedPayload(format!(
                    "label exceeds {} characters",
                    self.max_label_length
                )));
            }
        }

        Ok(record)
    }

    /// Hash a record.
    pub fn hash(&self, record: &Record) -> Result<RecordHash> {
        let text = self.serialize(record)?;
        Ok(hash_text(&text))
    }
}

/// Hash serialized record text.
pub fn hash_text(text: &str) -> RecordHash {
    let full = hex::encode(Sha256::digest(text.as_bytes()));
    let short = full[..SHORT_HASH_LENGTH].to_string();
    RecordHash { full, short }
}

mod base64_field {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        BASE64.decode(text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> PayloadCodec {
        PayloadCodec::new(&EngineConfig::default())
    }

    fn sample() -> Record {
        Record {
            salt: vec![1; 16],
            iv: vec![2; 12],
            headers: vec![3; 48],
            data: vec![4; 1024],
            metadata: Metadata {
                label: Some("Wallet".to_string()),
                challenge: None,
            },
        }
    }

    #[test]
    fn test_serialize_deserialize() {
        let codec = codec();
        let record = sample();

        let text = codec.serialize(&record).unwrap();
        assert!(text.contains("\"salt\": \"AQEBAQEBAQEBAQEBAQEBAQ==\""));
        assert!(!text.contains("challenge"));

        assert_eq!(codec.deserialize(&text).unwrap(), record);
        assert_eq!(record.size(), 48 + 1024);
    }

    #[test]
    fn test_metadata_is_optional() {
        let text = r#"{"salt":"AQ==","iv":"Ag==","headers":"Aw==","data":"BA=="}"#;
        let record = codec().deserialize(text).unwrap();

        assert_eq!(record.metadata, Metadata::default());
        assert_eq!(record.data, vec![4]);
    }

    #[test]
    fn test_rejects_noise() {
        let codec = codec();

        for text in [
            "",
            "https://example.com",
            "{}",
            "[1, 2, 3]",
            r#"{"salt":"AQ==","iv":"Ag==","headers":"Aw=="}"#,
            r#"{"salt":"","iv":"Ag==","headers":"Aw==","data":"BA=="}"#,
            r#"{"salt":"not base64!","iv":"Ag==","headers":"Aw==","data":"BA=="}"#,
        ] {
            assert!(
                matches!(codec.deserialize(text), Err(Error::MalformedPayload(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_rejects_oversized_fields() {
        let codec = codec();
        let mut record = sample();
        record.data = vec![0; 1025];
        let text = codec.serialize(&record).unwrap();

        assert!(matches!(
            codec.deserialize(&text),
            Err(Error::MalformedPayload(_))
        ));

        let mut record = sample();
        record.metadata.label = Some("x".repeat(65));
        let text = codec.serialize(&record).unwrap();

        assert!(codec.deserialize(&text).is_err());
    }

    #[test]
    fn test_hash_is_content_addressed() {
        let codec = codec();
        let record = sample();

        let a = codec.hash(&record).unwrap();
        let b = codec.hash(&record.clone()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.full.len(), 64);
        assert_eq!(a.short.len(), SHORT_HASH_LENGTH);
        assert!(a.full.starts_with(&a.short));

        let mut other = sample();
        other.data[0] ^= 1;
        assert_ne!(codec.hash(&other).unwrap(), a);
    }
}
