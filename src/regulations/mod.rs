pub mod client;
pub mod paginator;
pub mod retry;

pub use client::RegulationsClient;
pub use paginator::{Page, PageRequest, Paginator, PagingOutcome};
pub use retry::{DetailFetcher, Sleeper, TokioSleeper};
