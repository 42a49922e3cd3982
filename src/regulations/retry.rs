use std::time::Duration;

use async_trait::async_trait;

use crate::config::RetryPolicy;
use crate::error::Error;
use crate::models::CommentDetail;
use crate::regulations::client::RegulationsClient;

/// Where backoff and throttle delays are spent.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Detail lookups with bounded exponential backoff. Failures never escape:
/// an exhausted budget or a non-retryable response yields `None`.
pub struct DetailFetcher<'a> {
    client: &'a RegulationsClient,
    policy: &'a RetryPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(client: &'a RegulationsClient, policy: &'a RetryPolicy, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            client,
            policy,
            sleeper,
        }
    }

    pub async fn fetch_detail(&self, id: &str) -> Option<CommentDetail> {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 0..max_attempts {
            let err = match self.client.fetch_detail_once(id).await {
                Ok(detail) => {
                    if attempt > 0 {
                        tracing::info!("Fetched {} after {} attempts", id, attempt + 1);
                    }
                    return Some(detail);
                }
                Err(e) => e,
            };

            let Some(kind) = err.retry_kind() else {
                tracing::warn!(
                    "{}",
                    Error::DetailUnavailable {
                        id: id.to_string(),
                        reason: err.to_string(),
                    }
                );
                return None;
            };

            if attempt + 1 == max_attempts {
                tracing::warn!("{} on final attempt {}/{}", err, attempt + 1, max_attempts);
                break;
            }

            let delay = self.policy.delay_for(kind, attempt);
            tracing::warn!(
                "{}. Waiting {:?} before retry {}/{}...",
                err,
                delay,
                attempt + 1,
                max_attempts
            );
            self.sleeper.sleep(delay).await;
        }

        tracing::warn!(
            "{}",
            Error::DetailUnavailable {
                id: id.to_string(),
                reason: format!("gave up after {} attempts", max_attempts),
            }
        );
        None
    }
}
