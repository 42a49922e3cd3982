use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Collection, CommentRecord};

pub const UNSPECIFIED_ORGANIZATION: &str = "Not specified";

/// A comment as shown for review: only comments with a title and full text qualify.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    pub id: String,
    pub title: String,
    pub comment: String,
    pub organization: String,
    pub agency: String,
    pub posted_date: Option<NaiveDate>,
    pub document_type: String,
    pub docket_link: Option<String>,
}

impl ReviewComment {
    pub fn from_record(record: &CommentRecord) -> Option<Self> {
        let title = non_blank(&record.title)?;
        let comment = non_blank(&record.full_text)?;
        Some(Self {
            id: record.id.clone(),
            title,
            comment,
            organization: non_blank(&record.organization)
                .unwrap_or_else(|| UNSPECIFIED_ORGANIZATION.to_string()),
            agency: record.agency_id.clone().unwrap_or_default(),
            posted_date: record.posted_date.as_deref().and_then(parse_date),
            document_type: record.document_type.clone().unwrap_or_default(),
            docket_link: record.docket_link.clone(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Accepts RFC 3339 timestamps (`2024-03-01T05:00:00Z`) or plain dates.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .or_else(|| value.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub search: Option<String>,
    pub agencies: Vec<String>,
    pub organizations: Vec<String>,
    pub posted_after: Option<NaiveDate>,
    pub posted_before: Option<NaiveDate>,
}

impl CommentFilter {
    pub fn with_dates(mut self, after: Option<&str>, before: Option<&str>) -> Result<Self> {
        self.posted_after = after.map(parse_bound).transpose()?;
        self.posted_before = before.map(parse_bound).transpose()?;
        Ok(self)
    }

    pub fn matches(&self, comment: &ReviewComment) -> bool {
        if let Some(ref term) = self.search {
            let term = term.to_lowercase();
            if !term.is_empty()
                && !comment.title.to_lowercase().contains(&term)
                && !comment.comment.to_lowercase().contains(&term)
                && !comment.organization.to_lowercase().contains(&term)
            {
                return false;
            }
        }

        if !self.agencies.is_empty()
            && !self.agencies.iter().any(|a| a.eq_ignore_ascii_case(&comment.agency))
        {
            return false;
        }

        if !self.organizations.is_empty()
            && !self.organizations.iter().any(|o| o == &comment.organization)
        {
            return false;
        }

        if self.posted_after.is_some() || self.posted_before.is_some() {
            let Some(date) = comment.posted_date else {
                return false;
            };
            if self.posted_after.is_some_and(|after| date < after) {
                return false;
            }
            if self.posted_before.is_some_and(|before| date > before) {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, collection: &Collection) -> Vec<ReviewComment> {
        collection
            .iter()
            .filter_map(ReviewComment::from_record)
            .filter(|c| self.matches(c))
            .collect()
    }
}

fn parse_bound(value: &str) -> Result<NaiveDate> {
    parse_date(value).ok_or_else(|| Error::Config(format!("invalid date: {:?}", value)))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub total_comments: usize,
    pub unique_agencies: usize,
    pub unique_organizations: usize,
    pub by_agency: BTreeMap<String, usize>,
}

impl DatasetStats {
    pub fn from_comments(comments: &[ReviewComment]) -> Self {
        let mut by_agency = BTreeMap::new();
        let mut organizations = BTreeSet::new();
        for comment in comments {
            *by_agency.entry(comment.agency.clone()).or_insert(0) += 1;
            organizations.insert(comment.organization.as_str());
        }
        Self {
            total_comments: comments.len(),
            unique_agencies: by_agency.len(),
            unique_organizations: organizations.len(),
            by_agency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommentSummary;

    fn record(id: &str, agency: &str, date: &str, text: Option<&str>, org: Option<&str>) -> CommentRecord {
        let mut r = CommentRecord::from(CommentSummary {
            id: id.to_string(),
            posted_date: Some(date.to_string()),
            title: Some(format!("Comment {}", id)),
            agency_id: Some(agency.to_string()),
            document_type: Some("Public Submission".to_string()),
            last_modified_date: None,
        });
        r.full_text = text.map(str::to_string);
        r.organization = org.map(str::to_string);
        r
    }

    fn dataset() -> Collection {
        Collection::from_records(vec![
            record("NIST-2024-0001-0001", "NIST", "2024-01-10T05:00:00Z", Some("Quantum sensing for GPS"), Some("IonQ")),
            record("DOE-2024-0002-0001", "DOE", "2024-03-05T05:00:00Z", Some("Grid timing"), None),
            record("DOE-2024-0002-0002", "DOE", "2024-05-20T04:00:00Z", Some("Tech transfer"), Some("MIT")),
            record("FCC-2024-0003-0001", "FCC", "2024-02-01T05:00:00Z", None, Some("AT&T")),
        ])
    }

    #[test]
    fn test_only_commented_records_are_reviewable() {
        let all = CommentFilter::default().apply(&dataset());
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].organization, UNSPECIFIED_ORGANIZATION);
        assert_eq!(all[0].posted_date, NaiveDate::from_ymd_opt(2024, 1, 10));
    }

    #[test]
    fn test_search_and_agency_filters() {
        let filter = CommentFilter {
            search: Some("QUANTUM".to_string()),
            ..Default::default()
        };
        let hits = filter.apply(&dataset());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "NIST-2024-0001-0001");

        let filter = CommentFilter {
            agencies: vec!["doe".to_string()],
            organizations: vec!["MIT".to_string()],
            ..Default::default()
        };
        let hits = filter.apply(&dataset());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "DOE-2024-0002-0002");
    }

    #[test]
    fn test_date_range() {
        let filter = CommentFilter::default()
            .with_dates(Some("2024-02-01"), Some("2024-03-31"))
            .unwrap();
        let hits = filter.apply(&dataset());
        let ids: Vec<_> = hits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["DOE-2024-0002-0001"]);

        assert!(CommentFilter::default().with_dates(Some("last week"), None).is_err());
    }

    #[test]
    fn test_stats() {
        let comments = CommentFilter::default().apply(&dataset());
        let stats = DatasetStats::from_comments(&comments);
        assert_eq!(stats.total_comments, 3);
        assert_eq!(stats.unique_agencies, 2);
        assert_eq!(stats.unique_organizations, 3);
        assert_eq!(stats.by_agency.get("DOE"), Some(&2));
    }
}
