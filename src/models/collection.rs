use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::comment::{CommentDetail, CommentRecord};

/// Comment records in page-fetch order, unique by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    records: Vec<CommentRecord>,
    ids: HashSet<String>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection, dropping records without an id and later duplicates.
    pub fn from_records(records: impl IntoIterator<Item = CommentRecord>) -> Self {
        let mut collection = Self::new();
        for record in records {
            let id = record.id.clone();
            if !collection.push(record) {
                tracing::warn!("Dropping invalid or duplicate record {:?}", id);
            }
        }
        collection
    }

    /// Appends a record unless its id is empty or already present.
    pub fn push(&mut self, record: CommentRecord) -> bool {
        if record.id.is_empty() || self.ids.contains(&record.id) {
            return false;
        }
        self.ids.insert(record.id.clone());
        self.records.push(record);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CommentRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommentRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CommentRecord> {
        self.records.get(index)
    }

    pub fn merge_detail(&mut self, index: usize, detail: CommentDetail) -> bool {
        self.records
            .get_mut(index)
            .map(|record| record.merge(detail))
            .unwrap_or(false)
    }

    pub fn truncate(&mut self, len: usize) {
        for record in self.records.drain(len.min(self.records.len())..) {
            self.ids.remove(&record.id);
        }
    }

    pub fn attach_docket_links(&mut self) {
        for record in &mut self.records {
            record.attach_docket_link();
        }
    }

    pub fn enriched_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_enriched()).count()
    }

    pub fn snapshot(&self) -> SnapshotView<'_> {
        SnapshotView {
            total_count: self.records.len(),
            comments: &self.records,
        }
    }
}

/// Borrowed form of the persisted document, used for writing.
#[derive(Debug, Serialize)]
pub struct SnapshotView<'a> {
    #[serde(rename = "Number of Comments")]
    pub total_count: usize,
    #[serde(rename = "Comments")]
    pub comments: &'a [CommentRecord],
}

/// Owned form of the persisted document, used for loading.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "Number of Comments", default)]
    pub total_count: usize,
    #[serde(rename = "Comments", default)]
    pub comments: Vec<CommentRecord>,
}

impl From<Snapshot> for Collection {
    fn from(snapshot: Snapshot) -> Self {
        if snapshot.total_count != snapshot.comments.len() {
            tracing::warn!(
                "Snapshot declares {} comments but holds {}",
                snapshot.total_count,
                snapshot.comments.len()
            );
        }
        Collection::from_records(snapshot.comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommentSummary;

    fn record(id: &str) -> CommentRecord {
        CommentRecord::from(CommentSummary {
            id: id.to_string(),
            posted_date: None,
            title: None,
            agency_id: None,
            document_type: None,
            last_modified_date: None,
        })
    }

    #[test]
    fn test_push_rejects_duplicates_and_empty_ids() {
        let mut c = Collection::new();
        assert!(c.push(record("A-B-1")));
        assert!(!c.push(record("A-B-1")));
        assert!(!c.push(record("")));
        assert!(c.push(record("A-B-2")));
        let ids: Vec<_> = c.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A-B-1", "A-B-2"]);
    }

    #[test]
    fn test_truncate_releases_ids() {
        let mut c = Collection::from_records((1..=5).map(|i| record(&format!("A-B-{}", i))));
        c.truncate(3);
        assert_eq!(c.len(), 3);
        assert!(!c.contains("A-B-4"));
        assert!(c.push(record("A-B-4")));
    }

    #[test]
    fn test_snapshot_document_shape() {
        let c = Collection::from_records(vec![record("A-B-1"), record("A-B-2")]);
        let value = serde_json::to_value(c.snapshot()).unwrap();
        assert_eq!(value["Number of Comments"], 2);
        assert_eq!(value["Comments"][1]["id"], "A-B-2");

        let loaded: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(Collection::from(loaded), c);
    }
}
