pub mod pipeline;

pub use pipeline::{EnrichmentStats, HarvestPipeline, PipelineState, RunSummary};
