use std::fmt;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::models::Collection;
use crate::regulations::{DetailFetcher, Paginator, RegulationsClient, Sleeper, TokioSleeper};
use crate::storage::{export_comments_csv, export_details_csv, write_dataset, ProgressStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Paging,
    Enriching,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Paging => "paging",
            PipelineState::Enriching => "enriching",
            PipelineState::Finalizing => "finalizing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub enriched: usize,
    pub skipped: usize,
    pub unavailable: usize,
    pub checkpoints: usize,
}

#[derive(Debug)]
pub struct RunSummary {
    pub total: usize,
    pub resumed: bool,
    pub pages: u32,
    pub enrichment: EnrichmentStats,
    /// Set when paging stopped on an error but earlier pages were kept.
    pub paging_error: Option<Error>,
}

pub struct HarvestPipeline {
    client: RegulationsClient,
    sleeper: Arc<dyn Sleeper>,
    progress: ProgressStore,
    config: PipelineConfig,
    state: PipelineState,
}

impl HarvestPipeline {
    pub fn new(client: RegulationsClient, config: PipelineConfig) -> Self {
        let progress = ProgressStore::new(&config.progress_path, config.checkpoint_every);
        Self {
            client,
            sleeper: Arc::new(TokioSleeper),
            progress,
            config,
            state: PipelineState::Idle,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::debug!("Pipeline {} -> {}", self.state, next);
        self.state = next;
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        match self.run_inner().await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                self.transition(PipelineState::Failed);
                Err(e)
            }
        }
    }

    async fn run_inner(&mut self) -> Result<RunSummary> {
        let loaded = self.progress.load()?;
        let resumed = loaded.is_some();
        let mut collection = loaded.unwrap_or_default();

        let mut pages = 0;
        let mut paging_error = None;

        if collection.is_empty() || self.config.refresh_pages {
            self.transition(PipelineState::Paging);
            tracing::info!("Searching comments for {:?}", self.config.query);

            let outcome = Paginator::new(&self.client)
                .fetch_all(
                    &self.config.query,
                    self.config.page_size,
                    self.config.sort.as_deref(),
                    self.config.max_comments,
                    &mut collection,
                )
                .await?;
            pages = outcome.pages;

            if let Some(e) = outcome.error {
                self.transition(PipelineState::Failed);
                if collection.is_empty() {
                    return Err(e);
                }
                tracing::warn!(
                    "Continuing with {} comments collected before the failure",
                    collection.len()
                );
                paging_error = Some(e);
            }
            tracing::info!("Total comments collected: {}", collection.len());

            collection.attach_docket_links();
            self.progress.save(&collection)?;
        } else {
            tracing::warn!(
                "Resuming from {} without searching; query, sort and comment limit are ignored. \
                 Delete the file or pass --refresh-pages to search again.",
                self.progress.path().display()
            );
            collection.attach_docket_links();
        }

        let enrichment = if self.config.enrich_details {
            self.transition(PipelineState::Enriching);
            self.enrich(&mut collection).await?
        } else {
            EnrichmentStats::default()
        };

        self.transition(PipelineState::Finalizing);
        if let Err(e) = self.finalize(&collection) {
            tracing::error!(
                "Final write failed with {} comments ({} enriched); progress remains in {}",
                collection.len(),
                collection.enriched_count(),
                self.progress.path().display()
            );
            return Err(e);
        }
        self.transition(PipelineState::Done);

        Ok(RunSummary {
            total: collection.len(),
            resumed,
            pages,
            enrichment,
            paging_error,
        })
    }

    async fn enrich(&self, collection: &mut Collection) -> Result<EnrichmentStats> {
        let fetcher = DetailFetcher::new(&self.client, &self.config.retry, self.sleeper.as_ref());
        let mut stats = EnrichmentStats::default();
        let pb = self.progress_bar(collection.len() as u64);

        tracing::info!("Fetching detailed information for {} comments...", collection.len());

        for index in 0..collection.len() {
            let Some(record) = collection.get(index) else {
                break;
            };
            if record.is_enriched() {
                stats.skipped += 1;
                pb.inc(1);
                continue;
            }
            let id = record.id.clone();

            match fetcher.fetch_detail(&id).await {
                Some(detail) => {
                    if collection.merge_detail(index, detail) {
                        stats.enriched += 1;
                        if self.progress.checkpoint(collection, stats.enriched)? {
                            stats.checkpoints += 1;
                        }
                    } else {
                        stats.unavailable += 1;
                    }
                }
                None => {
                    stats.unavailable += 1;
                    tracing::warn!("Failed to fetch details for comment {}", id);
                }
            }

            if !self.config.request_delay.is_zero() {
                self.sleeper.sleep(self.config.request_delay).await;
            }
            pb.inc(1);
        }

        pb.finish_with_message("Detail enrichment complete");
        self.progress.save(collection)?;
        tracing::info!(
            "Enrichment finished: {} fetched, {} already enriched, {} unavailable",
            stats.enriched,
            stats.skipped,
            stats.unavailable
        );
        Ok(stats)
    }

    fn finalize(&self, collection: &Collection) -> Result<()> {
        write_dataset(&self.config.output_path, collection)?;
        if let Some(ref path) = self.config.comments_csv {
            export_comments_csv(path, collection)?;
        }
        if let Some(ref path) = self.config.details_csv {
            export_details_csv(path, collection)?;
        }
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} comments")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }
}
