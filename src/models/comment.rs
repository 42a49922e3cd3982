use serde::{Deserialize, Serialize};

pub const DOCKET_URL_BASE: &str = "https://www.regulations.gov/docket";

/// A listing row as returned while paging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub id: String,
    pub posted_date: Option<String>,
    pub title: Option<String>,
    pub agency_id: Option<String>,
    pub document_type: Option<String>,
    pub last_modified_date: Option<String>,
}

/// Per-comment detail fetched during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDetail {
    pub id: Option<String>,
    pub comment_on_document_id: Option<String>,
    #[serde(rename = "comment")]
    pub full_text: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub email: Option<String>,
}

/// Summary plus whatever detail has been merged in so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_on_document_id: Option<String>,
    #[serde(
        default,
        rename = "comment",
        alias = "fullText",
        skip_serializing_if = "Option::is_none"
    )]
    pub full_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docket_link: Option<String>,
}

impl From<CommentSummary> for CommentRecord {
    fn from(summary: CommentSummary) -> Self {
        Self {
            id: summary.id,
            posted_date: summary.posted_date,
            title: summary.title,
            agency_id: summary.agency_id,
            document_type: summary.document_type,
            last_modified_date: summary.last_modified_date,
            comment_on_document_id: None,
            full_text: None,
            first_name: None,
            last_name: None,
            organization: None,
            email: None,
            docket_link: None,
        }
    }
}

impl CommentRecord {
    /// A record with full text has been enriched and is never fetched again.
    pub fn is_enriched(&self) -> bool {
        has_text(&self.full_text)
    }

    /// Copies populated detail fields onto the record. Empty values never
    /// replace existing ones. Returns false if the detail belongs to another id.
    pub fn merge(&mut self, detail: CommentDetail) -> bool {
        if let Some(ref detail_id) = detail.id {
            if !detail_id.is_empty() && detail_id != &self.id {
                tracing::warn!(
                    "Detail id {} does not match comment {}, ignoring",
                    detail_id,
                    self.id
                );
                return false;
            }
        }

        fill(&mut self.comment_on_document_id, detail.comment_on_document_id);
        fill(&mut self.full_text, detail.full_text);
        fill(&mut self.first_name, detail.first_name);
        fill(&mut self.last_name, detail.last_name);
        fill(&mut self.organization, detail.organization);
        fill(&mut self.email, detail.email);
        true
    }

    pub fn attach_docket_link(&mut self) {
        if self.docket_link.is_none() {
            self.docket_link = docket_link(&self.id);
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            *slot = Some(value);
        }
    }
}

/// `EPA-HQ-OAR-2023-0123-0045` → `EPA-HQ-OAR-2023-0123`. Ids with fewer than
/// three hyphen-delimited segments have no docket.
pub fn docket_id(comment_id: &str) -> Option<String> {
    let parts: Vec<&str> = comment_id.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    Some(parts[..parts.len() - 1].join("-"))
}

pub fn docket_link(comment_id: &str) -> Option<String> {
    docket_id(comment_id).map(|docket| format!("{}/{}", DOCKET_URL_BASE, docket))
}
