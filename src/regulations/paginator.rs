use crate::config::validate_page_size;
use crate::error::{Error, Result};
use crate::models::{CommentRecord, CommentSummary, Collection};
use crate::regulations::client::RegulationsClient;

#[derive(Debug, Clone)]
pub struct PageRequest {
    pub query: String,
    pub page_number: u32,
    pub page_size: u32,
    pub sort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<CommentSummary>,
    /// Entries the API returned, including any dropped for lacking an id.
    pub returned: usize,
    pub has_more: bool,
}

/// Continuation rule, first match wins: an empty page ends paging, then an
/// explicit `hasNextPage: false`, then a page shorter than `page_size`.
pub fn has_more(returned: usize, page_size: u32, has_next_page: Option<bool>) -> bool {
    if returned == 0 {
        return false;
    }
    if has_next_page == Some(false) {
        return false;
    }
    returned >= page_size as usize
}

/// Result of walking the listing. Pages gathered before a failure stay in
/// the collection; the failure itself is reported in `error`.
#[derive(Debug, Default)]
pub struct PagingOutcome {
    pub pages: u32,
    pub added: usize,
    pub error: Option<Error>,
}

pub struct Paginator<'a> {
    client: &'a RegulationsClient,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a RegulationsClient) -> Self {
        Self { client }
    }

    /// Fetches pages 1, 2, ... in order, appending new ids to `collection`
    /// until the continuation rule says stop, `max_items` new ids have been
    /// added, or a page request fails. Records already in `collection` are
    /// never dropped.
    pub async fn fetch_all(
        &self,
        query: &str,
        page_size: u32,
        sort: Option<&str>,
        max_items: Option<usize>,
        collection: &mut Collection,
    ) -> Result<PagingOutcome> {
        validate_page_size(page_size)?;

        let mut outcome = PagingOutcome::default();
        let existing = collection.len();
        let mut request = PageRequest {
            query: query.to_string(),
            page_number: 1,
            page_size,
            sort: sort.map(str::to_string),
        };

        loop {
            tracing::info!("Fetching comments page {}...", request.page_number);

            let page = match self.client.fetch_page(&request).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(
                        "Failed to fetch page {}: {} ({} comments collected so far)",
                        request.page_number,
                        e,
                        collection.len()
                    );
                    outcome.error = Some(e);
                    break;
                }
            };
            outcome.pages += 1;

            if page.returned == 0 {
                tracing::info!("No more comments found. Stopping at page {}.", request.page_number);
                break;
            }

            for summary in page.records {
                if collection.push(CommentRecord::from(summary)) {
                    outcome.added += 1;
                }
            }
            tracing::info!(
                "Found {} comments on page {}. Subtotal: {}.",
                page.returned,
                request.page_number,
                collection.len()
            );

            if let Some(max) = max_items {
                if outcome.added >= max {
                    collection.truncate(existing + max);
                    outcome.added = max;
                    tracing::info!("Reached the limit of {} new comments", max);
                    break;
                }
            }

            if !page.has_more {
                break;
            }
            request.page_number += 1;
        }

        Ok(outcome)
    }
}
