use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result, RetryKind};

pub const DEFAULT_API_URL: &str = "https://api.regulations.gov/v4";
pub const DEFAULT_QUERY: &str = "quantum AND tech";
/// Largest `page[size]` the comments API accepts.
pub const MAX_PAGE_SIZE: u32 = 250;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub query: String,
    pub page_size: u32,
    pub max_comments: Option<usize>,
    pub sort: Option<String>,
    pub checkpoint_every: usize,
    pub request_delay: Duration,
    pub max_retries: u32,
    pub output_path: PathBuf,
    pub progress_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "API_KEY not set. Request a key from api.data.gov and add it to .env.reg"
                        .to_string(),
                )
            })?;

        let api_base_url = lookup("REGULATIONS_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let query = lookup("REGULATIONS_QUERY").unwrap_or_else(|| DEFAULT_QUERY.to_string());

        let page_size = parse_or(&lookup, "PAGE_SIZE", MAX_PAGE_SIZE)?;
        validate_page_size(page_size)?;

        let max_comments = match lookup("MAX_COMMENTS") {
            Some(v) => Some(parse_value("MAX_COMMENTS", &v)?),
            None => None,
        };

        let sort = lookup("SORT").filter(|v| !v.is_empty());

        let checkpoint_every = parse_or(&lookup, "CHECKPOINT_EVERY", 25usize)?;
        if checkpoint_every == 0 {
            return Err(Error::Config("CHECKPOINT_EVERY must be at least 1".to_string()));
        }

        let request_delay = Duration::from_millis(parse_or(&lookup, "REQUEST_DELAY_MS", 1000u64)?);

        let max_retries = parse_or(&lookup, "MAX_RETRIES", 5u32)?;
        if max_retries == 0 {
            return Err(Error::Config("MAX_RETRIES must be at least 1".to_string()));
        }

        let output_path = lookup("OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("comments.json"));

        let progress_path = lookup("PROGRESS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("comments_progress.json"));

        Ok(Self {
            api_key,
            api_base_url,
            query,
            page_size,
            max_comments,
            sort,
            checkpoint_every,
            request_delay,
            max_retries,
            output_path,
            progress_path,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, value)))
}

pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::Config(format!(
            "page size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }
    Ok(())
}

/// Bounded exponential backoff for detail requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_base: Duration,
    pub transient_base: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// `min(cap, base * 2^attempt)` where `attempt` counts from zero.
    pub fn delay_for(&self, kind: RetryKind, attempt: u32) -> Duration {
        let base = match kind {
            RetryKind::RateLimited => self.rate_limit_base,
            RetryKind::Transient => self.transient_base,
        };
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        base.saturating_mul(factor).min(self.cap)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_base: Duration::from_secs(5),
            transient_base: Duration::from_secs(2),
            cap: Duration::from_secs(80),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub query: String,
    pub page_size: u32,
    pub max_comments: Option<usize>,
    pub sort: Option<String>,
    pub checkpoint_every: usize,
    pub request_delay: Duration,
    pub retry: RetryPolicy,
    pub output_path: PathBuf,
    pub progress_path: PathBuf,
    pub comments_csv: Option<PathBuf>,
    pub details_csv: Option<PathBuf>,
    pub enrich_details: bool,
    pub refresh_pages: bool,
    pub show_progress: bool,
}

impl PipelineConfig {
    /// Applies the same bounds `Config::from_lookup` enforces, for values
    /// overridden after loading.
    pub fn validate(&self) -> Result<()> {
        validate_page_size(self.page_size)?;
        if self.checkpoint_every == 0 {
            return Err(Error::Config("checkpoint interval must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("max retries must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            query: config.query.clone(),
            page_size: config.page_size,
            max_comments: config.max_comments,
            sort: config.sort.clone(),
            checkpoint_every: config.checkpoint_every,
            request_delay: config.request_delay,
            retry: RetryPolicy::with_max_attempts(config.max_retries),
            output_path: config.output_path.clone(),
            progress_path: config.progress_path.clone(),
            comments_csv: None,
            details_csv: None,
            enrich_details: true,
            refresh_pages: false,
            show_progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("API_KEY", "secret")])).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.query, DEFAULT_QUERY);
        assert_eq!(config.page_size, 250);
        assert_eq!(config.checkpoint_every, 25);
        assert_eq!(config.request_delay, Duration::from_secs(1));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.max_comments, None);
        assert_eq!(config.progress_path, PathBuf::from("comments_progress.json"));
    }

    #[test]
    fn test_page_size_bounds() {
        let err = Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("PAGE_SIZE", "251")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("PAGE_SIZE", "many")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config =
            Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("PAGE_SIZE", "100")])).unwrap();
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_overridden_pipeline_config_is_validated() {
        let config = Config::from_lookup(lookup_from(&[("API_KEY", "k")])).unwrap();
        let pipeline = PipelineConfig::from(&config);
        assert!(pipeline.validate().is_ok());

        let mut zero_checkpoint = pipeline.clone();
        zero_checkpoint.checkpoint_every = 0;
        assert!(matches!(zero_checkpoint.validate(), Err(Error::Config(_))));

        let mut zero_retries = pipeline.clone();
        zero_retries.retry = RetryPolicy::with_max_attempts(0);
        assert!(matches!(zero_retries.validate(), Err(Error::Config(_))));

        let mut oversized = pipeline;
        oversized.page_size = 1000;
        assert!(matches!(oversized.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..5)
            .map(|a| policy.delay_for(RetryKind::RateLimited, a).as_secs())
            .collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 80]);

        assert_eq!(policy.delay_for(RetryKind::Transient, 1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(RetryKind::RateLimited, 9), Duration::from_secs(80));
        assert_eq!(policy.delay_for(RetryKind::RateLimited, 40), Duration::from_secs(80));
    }
}
