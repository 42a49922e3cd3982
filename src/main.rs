use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use regcomments::review::{CommentFilter, DatasetStats, ReviewComment};
use regcomments::storage::{export_comments_csv, export_details_csv, load_dataset};
use regcomments::{Config, HarvestPipeline, PipelineConfig, RegulationsClient, RetryPolicy};

#[derive(Parser, Debug)]
#[command(name = "regcomments")]
#[command(version = "0.1.0")]
#[command(about = "Collect and review public comments from regulations.gov")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Page through search results, enrich each comment and save the dataset
    Fetch(FetchArgs),
    /// Flatten a saved dataset into comment and detail CSV files
    Export(ExportArgs),
    /// Filter a saved dataset the way the review dashboard does
    Filter(FilterArgs),
}

#[derive(ClapArgs, Debug)]
struct FetchArgs {
    /// Search term (overrides REGULATIONS_QUERY)
    #[arg(short, long)]
    query: Option<String>,

    /// Results per page, at most 250
    #[arg(long)]
    page_size: Option<u32>,

    /// Stop paging after this many new comments
    #[arg(long)]
    max_comments: Option<usize>,

    /// Sort order passed to the API, e.g. -postedDate
    #[arg(long)]
    sort: Option<String>,

    /// Final dataset path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Snapshot used to resume interrupted runs
    #[arg(long)]
    progress_file: Option<PathBuf>,

    /// Snapshot after this many enriched comments
    #[arg(long)]
    checkpoint_every: Option<usize>,

    /// Pause between detail requests in milliseconds
    #[arg(long)]
    request_delay_ms: Option<u64>,

    /// Attempts per detail request
    #[arg(long)]
    max_retries: Option<u32>,

    /// Only collect listing data
    #[arg(long)]
    skip_details: bool,

    /// Page again even when resuming, adding only unseen comments
    #[arg(long)]
    refresh_pages: bool,

    /// Also write comment rows to this CSV file
    #[arg(long)]
    comments_csv: Option<PathBuf>,

    /// Also write detail rows to this CSV file
    #[arg(long)]
    details_csv: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(ClapArgs, Debug)]
struct ExportArgs {
    /// Dataset to read
    #[arg(short, long, default_value = "comments.json")]
    input: PathBuf,

    #[arg(long, default_value = "comments.csv")]
    comments_csv: PathBuf,

    #[arg(long, default_value = "comments_details.csv")]
    details_csv: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
    /// Dataset to read
    #[arg(short, long, default_value = "comments_progress.json")]
    input: PathBuf,

    /// Case-insensitive text to look for
    #[arg(short, long)]
    search: Option<String>,

    /// Agency id to include (repeatable)
    #[arg(long = "agency")]
    agencies: Vec<String>,

    /// Organization to include (repeatable)
    #[arg(long = "organization")]
    organizations: Vec<String>,

    /// Earliest posted date, YYYY-MM-DD
    #[arg(long)]
    after: Option<String>,

    /// Latest posted date, YYYY-MM-DD
    #[arg(long)]
    before: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Maximum comments to print
    #[arg(long, default_value = "20")]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("regcomments=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::from_filename(".env.reg").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Fetch(args) => fetch(args).await,
        Command::Export(args) => export(args),
        Command::Filter(args) => filter(args),
    }
}

async fn fetch(args: FetchArgs) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::info!("API key loaded.");

    let mut pipeline_config = PipelineConfig::from(&config);
    if let Some(query) = args.query {
        pipeline_config.query = query;
    }
    if let Some(page_size) = args.page_size {
        pipeline_config.page_size = page_size;
    }
    if args.max_comments.is_some() {
        pipeline_config.max_comments = args.max_comments;
    }
    if args.sort.is_some() {
        pipeline_config.sort = args.sort;
    }
    if let Some(output) = args.output {
        pipeline_config.output_path = output;
    }
    if let Some(progress) = args.progress_file {
        pipeline_config.progress_path = progress;
    }
    if let Some(every) = args.checkpoint_every {
        pipeline_config.checkpoint_every = every;
    }
    if let Some(ms) = args.request_delay_ms {
        pipeline_config.request_delay = Duration::from_millis(ms);
    }
    if let Some(retries) = args.max_retries {
        pipeline_config.retry = RetryPolicy::with_max_attempts(retries);
    }
    pipeline_config.comments_csv = args.comments_csv;
    pipeline_config.details_csv = args.details_csv;
    pipeline_config.enrich_details = !args.skip_details;
    pipeline_config.refresh_pages = args.refresh_pages;
    pipeline_config.show_progress = !args.no_progress;
    pipeline_config.validate()?;

    let client = RegulationsClient::with_base_url(&config.api_key, &config.api_base_url)?;
    let mut pipeline = HarvestPipeline::new(client, pipeline_config);

    let summary = pipeline.run().await?;
    tracing::info!(
        "Completed: {} comments, {} newly enriched, {} already enriched, {} unavailable",
        summary.total,
        summary.enrichment.enriched,
        summary.enrichment.skipped,
        summary.enrichment.unavailable
    );

    if let Some(e) = summary.paging_error {
        anyhow::bail!(
            "paging stopped early ({}); {} comments were saved and can be refreshed with --refresh-pages",
            e,
            summary.total
        );
    }

    Ok(())
}

fn export(args: ExportArgs) -> anyhow::Result<()> {
    let collection = load_dataset(&args.input)?;
    let comments = export_comments_csv(&args.comments_csv, &collection)?;
    let details = export_details_csv(&args.details_csv, &collection)?;
    println!("Exported {} comments and {} details", comments, details);
    Ok(())
}

fn filter(args: FilterArgs) -> anyhow::Result<()> {
    let collection = load_dataset(&args.input)?;
    let filter = CommentFilter {
        search: args.search,
        agencies: args.agencies,
        organizations: args.organizations,
        ..Default::default()
    }
    .with_dates(args.after.as_deref(), args.before.as_deref())?;

    let matches = filter.apply(&collection);
    let stats = DatasetStats::from_comments(&matches);

    let output = match args.format.as_str() {
        "json" => serde_json::to_string_pretty(&serde_json::json!({
            "stats": stats,
            "comments": &matches[..matches.len().min(args.limit)],
        }))?,
        _ => format_text(&matches, &stats, args.limit),
    };
    println!("{}", output);
    Ok(())
}

fn format_text(comments: &[ReviewComment], stats: &DatasetStats, limit: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Total Comments: {}\n", stats.total_comments));
    output.push_str(&format!("Agencies: {}\n", stats.unique_agencies));
    output.push_str(&format!("Organizations: {}\n", stats.unique_organizations));

    if !stats.by_agency.is_empty() {
        output.push_str("\nComments by Agency:\n");
        for (agency, count) in &stats.by_agency {
            output.push_str(&format!("  {}: {}\n", agency, count));
        }
    }

    for comment in comments.iter().take(limit) {
        output.push_str(&format!("\n=== {} ===\n", comment.title));
        output.push_str(&format!("Organization: {}\n", comment.organization));
        output.push_str(&format!("Agency: {}\n", comment.agency));
        if let Some(date) = comment.posted_date {
            output.push_str(&format!("Posted: {}\n", date.format("%Y-%m-%d")));
        }
        output.push_str(&format!("Type: {}\n", comment.document_type));
        if let Some(ref link) = comment.docket_link {
            output.push_str(&format!("Docket: {}\n", link));
        }
        let preview: String = comment.comment.chars().take(500).collect();
        output.push_str(&preview);
        if comment.comment.chars().count() > 500 {
            output.push_str("...");
        }
        output.push('\n');
    }

    if comments.len() > limit {
        output.push_str(&format!("\n... and {} more\n", comments.len() - limit));
    }

    output
}
