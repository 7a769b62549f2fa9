//! Data models for captured headlines.
//!
//! This module defines the values that flow from the extractor into the ledger:
//! - [`Headline`]: The text of a section's top link (empty when nothing matched)
//! - [`DailyRecord`]: Everything captured on one calendar date
//!
//! A [`DailyRecord`] is serialized untagged so the persisted ledger stays a plain
//! `date -> string` or `date -> {section: string}` JSON document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extracted link text for a section. An empty string means "not found".
pub type Headline = String;

/// The headlines captured for a single calendar date.
///
/// # Variants
///
/// * `Single` - One headline for the whole page (single-target deployments)
/// * `Sections` - One headline per tracked section name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DailyRecord {
    /// A flat headline string.
    Single(Headline),
    /// Section name mapped to its top headline.
    Sections(BTreeMap<String, Headline>),
}

impl DailyRecord {
    /// Number of non-empty headlines in the record.
    pub fn found_count(&self) -> usize {
        match self {
            DailyRecord::Single(h) => usize::from(!h.is_empty()),
            DailyRecord::Sections(map) => map.values().filter(|h| !h.is_empty()).count(),
        }
    }

    /// Look up the headline for `section`. A `Single` record answers for any name.
    pub fn headline(&self, section: &str) -> Option<&str> {
        match self {
            DailyRecord::Single(h) => Some(h.as_str()),
            DailyRecord::Sections(map) => map.get(section).map(String::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_record_serialization() {
        let mut map = BTreeMap::new();
        map.insert("News".to_string(), "A".to_string());
        map.insert("Sports".to_string(), String::new());
        let record = DailyRecord::Sections(map);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"News":"A","Sports":""}"#);
    }

    #[test]
    fn test_single_record_serialization() {
        let record = DailyRecord::Single("Photo essay: Spring Fling".to_string());
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#""Photo essay: Spring Fling""#);
    }

    #[test]
    fn test_record_deserialization_picks_variant() {
        let flat: DailyRecord = serde_json::from_str(r#""Top story""#).unwrap();
        assert_eq!(flat, DailyRecord::Single("Top story".to_string()));

        let nested: DailyRecord = serde_json::from_str(r#"{"News": "B"}"#).unwrap();
        assert_eq!(nested.headline("News"), Some("B"));
        assert_eq!(nested.headline("Opinion"), None);
    }

    #[test]
    fn test_found_count() {
        let mut map = BTreeMap::new();
        map.insert("News".to_string(), "A".to_string());
        map.insert("Sports".to_string(), String::new());
        assert_eq!(DailyRecord::Sections(map).found_count(), 1);
        assert_eq!(DailyRecord::Single(String::new()).found_count(), 0);
    }

    #[test]
    fn test_record_rejects_other_json_shapes() {
        assert!(serde_json::from_str::<DailyRecord>("42").is_err());
        assert!(serde_json::from_str::<DailyRecord>(r#"{"News": 1}"#).is_err());
    }
}
