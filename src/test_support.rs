//! Shared fixtures for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::regulations::Sleeper;

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

pub fn comment_id(docket: &str, sequence: usize) -> String {
    format!("{}-{:04}", docket, sequence)
}

/// A listing page with `count` comments numbered from `start`.
pub fn listing_body(docket: &str, start: usize, count: usize, has_next: Option<bool>) -> Value {
    let agency = docket.split('-').next().unwrap_or("EPA");
    let data: Vec<Value> = (start..start + count)
        .map(|i| {
            json!({
                "id": comment_id(docket, i),
                "type": "comments",
                "attributes": {
                    "postedDate": "2024-03-01T05:00:00Z",
                    "title": format!("Comment {} on quantum sensing", i),
                    "agencyId": agency,
                    "documentType": "Public Submission",
                    "lastModifiedDate": "2024-03-02T10:00:00Z"
                }
            })
        })
        .collect();

    let mut meta = json!({ "totalElements": count });
    if let Some(next) = has_next {
        meta["hasNextPage"] = json!(next);
    }
    json!({ "data": data, "meta": meta })
}

pub fn detail_body(id: &str) -> Value {
    json!({
        "data": {
            "id": id,
            "type": "comments",
            "attributes": {
                "commentOnDocumentId": "NIST-2024-0001-0001",
                "comment": format!("Full text of {}", id),
                "firstName": "Grace",
                "lastName": "Hopper",
                "organization": "Quantum Sensing Consortium",
                "email": null
            }
        }
    })
}
