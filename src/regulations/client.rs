use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{CommentDetail, CommentSummary};
use crate::regulations::paginator::{has_more, Page, PageRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RegulationsClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<Resource<SummaryAttributes>>,
    #[serde(default)]
    meta: PageMeta,
}

#[derive(Deserialize)]
struct DetailResponse {
    data: Resource<DetailAttributes>,
}

#[derive(Deserialize)]
struct Resource<A> {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attributes: Option<A>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PageMeta {
    has_next_page: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SummaryAttributes {
    posted_date: Option<String>,
    title: Option<String>,
    agency_id: Option<String>,
    document_type: Option<String>,
    last_modified_date: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DetailAttributes {
    comment_on_document_id: Option<String>,
    comment: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    organization: Option<String>,
    email: Option<String>,
}

impl RegulationsClient {
    pub fn with_base_url(api_key: &str, base_url: impl Into<String>) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config("API key is empty".to_string()));
        }

        let mut key = header::HeaderValue::from_str(api_key)?;
        key.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("X-Api-Key", key);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.api+json"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("regcomments/0.1"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches one listing page. Non-success statuses surface as `FetchFailed`.
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        let url = format!("{}/comments", self.base_url);
        let mut params = vec![
            ("filter[searchTerm]", request.query.clone()),
            ("page[size]", request.page_size.to_string()),
            ("page[number]", request.page_number.to_string()),
        ];
        if let Some(ref sort) = request.sort {
            params.push(("sort", sort.clone()));
        }

        tracing::debug!("Fetching page {} for {:?}", request.page_number, request.query);
        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::FetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let list: ListResponse = response
            .json()
            .await
            .map_err(|e| Error::ParseError(format!("comment listing: {}", e)))?;

        let returned = list.data.len();
        let more = has_more(returned, request.page_size, list.meta.has_next_page);

        let records = list
            .data
            .into_iter()
            .filter_map(|item| {
                let id = item.id.filter(|id| !id.is_empty());
                if id.is_none() {
                    tracing::warn!("Skipping listing entry without an id");
                }
                let attrs = item.attributes.unwrap_or_default();
                id.map(|id| CommentSummary {
                    id,
                    posted_date: attrs.posted_date,
                    title: attrs.title,
                    agency_id: attrs.agency_id,
                    document_type: attrs.document_type,
                    last_modified_date: attrs.last_modified_date,
                })
            })
            .collect();

        Ok(Page {
            records,
            returned,
            has_more: more,
        })
    }

    /// Single detail request with no retry. 429 maps to `RateLimited`.
    pub async fn fetch_detail_once(&self, id: &str) -> Result<CommentDetail> {
        let url = format!("{}/comments/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::FetchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let detail: DetailResponse = response.json().await?;
        let attrs = detail.data.attributes.unwrap_or_default();
        Ok(CommentDetail {
            id: detail.data.id,
            comment_on_document_id: attrs.comment_on_document_id,
            full_text: attrs.comment,
            first_name: attrs.first_name,
            last_name: attrs.last_name,
            organization: attrs.organization,
            email: attrs.email,
        })
    }
}
