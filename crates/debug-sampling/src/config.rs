// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Allow-list model and its wire codec.
//!
//! The payload is simple JSON:
//!
//! ```json
//! {"configs": [{"csid": "client-7", "deadline": 1767225600}]}
//! ```
//!
//! `deadline` is an absolute UNIX timestamp in seconds. A session may sample
//! debug info while `now < deadline`.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};

/// One client session allowed to sample debug info until `deadline`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowListEntry {
    /// Client session identifier.
    pub csid: String,

    /// Absolute UNIX time in seconds (exclusive).
    pub deadline: i64,
}

impl AllowListEntry {
    /// Create an entry.
    pub fn new(csid: impl Into<String>, deadline: i64) -> Self {
        Self {
            csid: csid.into(),
            deadline,
        }
    }

    /// Whether this entry still grants access at `now_secs`.
    #[inline]
    pub fn is_active_at(&self, now_secs: i64) -> bool {
        now_secs < self.deadline
    }
}

/// Full allow-list currently in effect.
///
/// Immutable once decoded; an update replaces the whole value. Duplicate
/// csids are accepted as-is and resolved when the snapshot is indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default)]
    pub configs: Vec<AllowListEntry>,
}

impl SamplingConfig {
    /// Build a config from entries, keeping their order.
    pub fn new(configs: Vec<AllowListEntry>) -> Self {
        Self { configs }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: AllowListEntry) {
        self.configs.push(entry);
    }

    /// Builder-style [`push`](Self::push).
    pub fn with_entry(mut self, csid: impl Into<String>, deadline: i64) -> Self {
        self.configs.push(AllowListEntry::new(csid, deadline));
        self
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &AllowListEntry> {
        self.configs.iter()
    }
}

/// Decode a raw payload.
///
/// Empty (or whitespace-only) input, invalid JSON and entries with an empty
/// csid are rejected.
pub fn decode(bytes: &[u8]) -> Result<SamplingConfig, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    let config: SamplingConfig = serde_json::from_slice(bytes)?;

    if let Some(index) = config.configs.iter().position(|e| e.csid.is_empty()) {
        return Err(DecodeError::InvalidEntry {
            index,
            reason: "empty csid".to_string(),
        });
    }

    Ok(config)
}

/// Encode a config into the wire payload accepted by [`decode`].
pub fn encode(config: &SamplingConfig) -> Result<String, serde_json::Error> {
    serde_json::to_string(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_entry() {
        let config = decode(br#"{"configs":[{"csid":"test-csid","deadline":123}]}"#).unwrap();
        assert_eq!(config.len(), 1);
        assert_eq!(config.configs[0], AllowListEntry::new("test-csid", 123));
    }

    #[test]
    fn test_decode_keeps_order_and_duplicates() {
        let payload = br#"{"configs":[
            {"csid":"b","deadline":5},
            {"csid":"a","deadline":1},
            {"csid":"b","deadline":9}
        ]}"#;
        let config = decode(payload).unwrap();
        let csids: Vec<&str> = config.entries().map(|e| e.csid.as_str()).collect();
        assert_eq!(csids, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_decode_missing_list_is_empty_config() {
        let config = decode(b"{}").unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        assert!(matches!(decode(b""), Err(DecodeError::Empty)));
        assert!(matches!(decode(b"  \n\t"), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        assert!(matches!(decode(b"asd"), Err(DecodeError::Malformed(_))));
        assert!(matches!(
            decode(br#"{"configs":[{"csid":"a"}]}"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode(br#"{"configs":[{"csid":"a","deadline":"soon"}]}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_empty_csid() {
        let err = decode(br#"{"configs":[{"csid":"a","deadline":1},{"csid":"","deadline":2}]}"#)
            .unwrap_err();
        match err {
            DecodeError::InvalidEntry { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_encode_is_accepted_by_decode() {
        let config = SamplingConfig::default()
            .with_entry("test-csid", 1)
            .with_entry("test-csid-2", 3);
        assert_eq!(decode(encode(&config).unwrap().as_bytes()).unwrap(), config);
    }

    #[test]
    fn test_entry_deadline_is_exclusive() {
        let entry = AllowListEntry::new("a", 123);
        assert!(entry.is_active_at(120));
        assert!(entry.is_active_at(122));
        assert!(!entry.is_active_at(123));
        assert!(!entry.is_active_at(124));
    }
}
