pub mod config;
pub mod error;
pub mod models;
pub mod regulations;
pub mod harvest;
pub mod storage;
pub mod review;

#[cfg(test)]
mod test_support;

pub use config::{Config, PipelineConfig, RetryPolicy};
pub use error::{Error, Result};
pub use regulations::RegulationsClient;
pub use harvest::HarvestPipeline;
pub use storage::ProgressStore;
