//! Persisted data shapes

use crate::locator::LocatorPair;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A saved pair of locators for one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorRecord {
    /// Empty for records saved before ids existed
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
}

impl LocatorRecord {
    /// Turn a candidate into a record with a fresh id
    pub fn from_pair(pair: LocatorPair) -> Self {
        Self {
            id: fresh_id(),
            xpath: pair.xpath,
            css: pair.css,
        }
    }

    /// Whether this record locates the same element as `candidate`
    ///
    /// Either locator matching is enough.
    pub fn overlaps(&self, candidate: &LocatorPair) -> bool {
        self.xpath == candidate.xpath || self.css == candidate.css
    }

    /// Give an id-less record a fresh id; returns whether one was assigned
    pub fn ensure_id(&mut self) -> bool {
        if !self.id.is_empty() {
            return false;
        }
        self.id = fresh_id();
        true
    }

    /// The locators without the id
    pub fn pair(&self) -> LocatorPair {
        LocatorPair {
            xpath: self.xpath.clone(),
            css: self.css.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BucketRepr {
    Many(Vec<LocatorRecord>),
    One(LocatorRecord),
}

impl From<BucketRepr> for HostBucket {
    fn from(repr: BucketRepr) -> Self {
        let records = match repr {
            BucketRepr::Many(records) => records,
            BucketRepr::One(record) => vec![record],
        };
        Self { records }
    }
}

impl From<HostBucket> for Vec<LocatorRecord> {
    fn from(bucket: HostBucket) -> Self {
        bucket.records
    }
}

/// Ordered locator records for one hostname; index 0 is tried first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BucketRepr", into = "Vec<LocatorRecord>")]
pub struct HostBucket {
    records: Vec<LocatorRecord>,
}

impl HostBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[LocatorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record shares the candidate's XPath or CSS selector
    pub fn contains_duplicate(&self, candidate: &LocatorPair) -> bool {
        self.records.iter().any(|r| r.overlaps(candidate))
    }

    /// Append at the lowest priority
    pub fn push(&mut self, record: LocatorRecord) {
        self.records.push(record);
    }

    /// Assign ids to records stored without one
    pub fn assign_missing_ids(&mut self) -> bool {
        self.records
            .iter_mut()
            .fold(false, |assigned, record| record.ensure_id() || assigned)
    }

    /// Remove a record by id, keeping the others in order
    pub fn remove(&mut self, id: &str) -> Option<LocatorRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }
}

impl FromIterator<LocatorRecord> for HostBucket {
    fn from_iter<I: IntoIterator<Item = LocatorRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Hostname to bucket mapping stored under `siteSelectors`
pub type SiteSelectors = BTreeMap<String, HostBucket>;

/// A user-authored text snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSnippet {
    #[serde(default)]
    pub id: String,
    pub content: String,
}

impl TextSnippet {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            content: content.into(),
        }
    }

    /// Give an id-less snippet a fresh id; returns whether one was assigned
    pub fn ensure_id(&mut self) -> bool {
        if !self.id.is_empty() {
            return false;
        }
        self.id = fresh_id();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_legacy_single_record_bucket() {
        let sites: SiteSelectors = serde_json::from_value(json!({
            "a.test": {"id": "1", "xpath": "/html/body/input"},
            "b.test": [{"id": "2", "css": "#q"}, {"id": "3", "css": "#r"}]
        }))
        .unwrap();

        assert_eq!(sites["a.test"].len(), 1);
        assert_eq!(sites["a.test"].records()[0].xpath.as_deref(), Some("/html/body/input"));
        assert_eq!(sites["b.test"].len(), 2);

        // always written back as an array
        let value = serde_json::to_value(&sites).unwrap();
        assert!(value["a.test"].is_array());
    }

    #[test]
    fn test_duplicate_is_either_locator() {
        let bucket: HostBucket = vec![LocatorRecord::from_pair(LocatorPair::new("/x", "#x"))]
            .into_iter()
            .collect();

        assert!(bucket.contains_duplicate(&LocatorPair::new("/x", "#other")));
        assert!(bucket.contains_duplicate(&LocatorPair::new("/other", "#x")));
        assert!(!bucket.contains_duplicate(&LocatorPair::new("/y", "#y")));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut bucket = HostBucket::new();
        for n in 0..4 {
            bucket.push(LocatorRecord {
                id: n.to_string(),
                xpath: Some(format!("/p{n}")),
                css: None,
            });
        }
        assert!(bucket.remove("1").is_some());
        assert!(bucket.remove("missing").is_none());
        let ids: Vec<_> = bucket.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "2", "3"]);
    }

    #[test]
    fn test_missing_id_is_assigned_once() {
        let mut snippet: TextSnippet = serde_json::from_value(json!({"content": "hi"})).unwrap();
        assert!(snippet.id.is_empty());
        assert!(snippet.ensure_id());
        assert_eq!(uuid::Uuid::parse_str(&snippet.id).unwrap().get_version_num(), 4);

        let kept = snippet.id.clone();
        assert!(!snippet.ensure_id());
        assert_eq!(snippet.id, kept);
    }

    #[test]
    fn test_bucket_assigns_only_missing_ids() {
        let mut bucket: HostBucket = serde_json::from_value(json!([
            {"id": "keep", "xpath": "/a"},
            {"css": "#b"}
        ]))
        .unwrap();

        assert!(bucket.assign_missing_ids());
        assert_eq!(bucket.records()[0].id, "keep");
        assert!(!bucket.records()[1].id.is_empty());
        assert!(!bucket.assign_missing_ids());
    }
}
