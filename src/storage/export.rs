use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Collection, CommentRecord};
use crate::storage::progress::write_json_atomic;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentRow<'a> {
    id: &'a str,
    posted_date: &'a str,
    title: &'a str,
    agency_id: &'a str,
    document_type: &'a str,
    last_modified_date: &'a str,
    docket_link: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailRow<'a> {
    id: &'a str,
    comment_on_document_id: &'a str,
    comment: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    organization: &'a str,
    email: &'a str,
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

impl<'a> From<&'a CommentRecord> for CommentRow<'a> {
    fn from(r: &'a CommentRecord) -> Self {
        Self {
            id: &r.id,
            posted_date: text(&r.posted_date),
            title: text(&r.title),
            agency_id: text(&r.agency_id),
            document_type: text(&r.document_type),
            last_modified_date: text(&r.last_modified_date),
            docket_link: text(&r.docket_link),
        }
    }
}

impl<'a> From<&'a CommentRecord> for DetailRow<'a> {
    fn from(r: &'a CommentRecord) -> Self {
        Self {
            id: &r.id,
            comment_on_document_id: text(&r.comment_on_document_id),
            comment: text(&r.full_text),
            first_name: text(&r.first_name),
            last_name: text(&r.last_name),
            organization: text(&r.organization),
            email: text(&r.email),
        }
    }
}

/// Writes the final dataset document.
pub fn write_dataset(path: &Path, collection: &Collection) -> Result<()> {
    write_json_atomic(path, &collection.snapshot())?;
    tracing::info!("{} comments saved to {}", collection.len(), path.display());
    Ok(())
}

/// One row per comment. Returns the number of rows written.
pub fn export_comments_csv(path: &Path, collection: &Collection) -> Result<usize> {
    if collection.is_empty() {
        tracing::warn!("No comments to export.");
        return Ok(0);
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in collection.iter() {
        writer.serialize(CommentRow::from(record))?;
    }
    writer.flush()?;
    tracing::info!("Exported {} comments to {}", collection.len(), path.display());
    Ok(collection.len())
}

/// One row per enriched comment. Returns the number of rows written.
pub fn export_details_csv(path: &Path, collection: &Collection) -> Result<usize> {
    let enriched: Vec<_> = collection.iter().filter(|r| r.is_enriched()).collect();
    if enriched.is_empty() {
        tracing::warn!("No details to export.");
        return Ok(0);
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in &enriched {
        writer.serialize(DetailRow::from(*record))?;
    }
    writer.flush()?;
    tracing::info!("Exported {} details to {}", enriched.len(), path.display());
    Ok(enriched.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentDetail, CommentSummary};

    fn sample() -> Collection {
        let mut c = Collection::from_records(["USDA-2024-0011-0001", "USDA-2024-0011-0002"].map(|id| {
            CommentRecord::from(CommentSummary {
                id: id.to_string(),
                posted_date: Some("2024-06-01T04:00:00Z".to_string()),
                title: Some("Comment, with comma".to_string()),
                agency_id: Some("USDA".to_string()),
                document_type: Some("Public Submission".to_string()),
                last_modified_date: None,
            })
        }));
        c.attach_docket_links();
        c.merge_detail(
            1,
            CommentDetail {
                full_text: Some("Sensors for soil \"moisture\".".to_string()),
                organization: Some("Farm Lab".to_string()),
                ..Default::default()
            },
        );
        c
    }

    #[test]
    fn test_comment_and_detail_csv() {
        let dir = tempfile::tempdir().unwrap();
        let comments = dir.path().join("comments.csv");
        let details = dir.path().join("details.csv");
        let c = sample();

        assert_eq!(export_comments_csv(&comments, &c).unwrap(), 2);
        assert_eq!(export_details_csv(&details, &c).unwrap(), 1);

        let mut reader = csv::Reader::from_path(&comments).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        assert_eq!(&headers[6], "docketLink");
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "Comment, with comma");
        assert_eq!(&rows[0][6], "https://www.regulations.gov/docket/USDA-2024-0011");

        let mut reader = csv::Reader::from_path(&details).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "USDA-2024-0011-0002");
        assert_eq!(&rows[0][2], "Sensors for soil \"moisture\".");
    }

    #[test]
    fn test_empty_collection_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comments.csv");
        assert_eq!(export_comments_csv(&path, &Collection::new()).unwrap(), 0);
        assert!(!path.exists());
    }
}
