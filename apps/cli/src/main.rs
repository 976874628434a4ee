use std::{path::PathBuf, time::Instant};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clipdex_core::{
    BuildConfig, CatalogBuilder, CatalogSource, ChatCompletionsClient, DEFAULT_BUCKET,
    DEFAULT_CATALOG_OBJECT, DEFAULT_PAGE_SIZE, Enricher, FailurePolicy, MediaResolver, Provider,
    StoreConfig, StoreKind, ViewState, format_build_summary, format_duration,
    format_page_readable, render_page,
};
use console::style;
use tracing_subscriber::EnvFilter;

use crate::progress::CliProgress;

mod progress;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Clone, Default, ValueEnum)]
enum CliFailurePolicy {
    /// Skip any document that fails and keep going
    #[default]
    SkipAll,
    /// Abort when a document cannot be downloaded or parsed
    FailOnStorageError,
}

impl From<CliFailurePolicy> for FailurePolicy {
    fn from(cli: CliFailurePolicy) -> Self {
        match cli {
            CliFailurePolicy::SkipAll => FailurePolicy::SkipAll,
            CliFailurePolicy::FailOnStorageError => FailurePolicy::FailOnStorageError,
        }
    }
}

#[derive(Clone, Default, ValueEnum)]
enum CliStore {
    #[default]
    Gcs,
    Local,
}

#[derive(Parser)]
#[command(name = "clipdex")]
#[command(about = "Summarize and tag video transcripts with an LLM, then browse the catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the catalog from every transcript document in the bucket
    Build(BuildArgs),
    /// Print one page of the catalog
    Browse(BrowseArgs),
}

#[derive(Args)]
struct StoreArgs {
    /// Bucket holding transcripts, media and the catalog
    #[arg(long, env = "BUCKET_NAME", default_value = DEFAULT_BUCKET)]
    bucket: String,

    /// Project billed for bucket requests
    #[arg(long, env = "GCP_PROJECT_ID")]
    project: Option<String>,

    /// Service account used to sign playback URLs
    #[arg(long, env = "GCS_SIGNER_EMAIL")]
    signer_email: Option<String>,

    /// Object store backend
    #[arg(long, env = "CLIPDEX_STORE", default_value = "gcs")]
    store: CliStore,

    /// Root directory of the local store
    #[arg(long, env = "CLIPDEX_LOCAL_ROOT")]
    local_root: Option<PathBuf>,

    /// Base URL serving local store objects, used instead of file:// links
    #[arg(long, env = "CLIPDEX_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Catalog object name
    #[arg(long, env = "OUTPUT_FILE", default_value = DEFAULT_CATALOG_OBJECT)]
    output: String,
}

impl StoreArgs {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            kind: match self.store {
                CliStore::Gcs => StoreKind::Gcs,
                CliStore::Local => StoreKind::Local,
            },
            bucket: self.bucket.clone(),
            project_id: self.project.clone(),
            signer_email: self.signer_email.clone(),
            local_root: self.local_root.clone(),
            public_base_url: self.public_base_url.clone(),
        }
    }
}

#[derive(Args)]
struct BuildArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Only consider objects under this prefix
    #[arg(long, env = "TRANSCRIPTS_PREFIX", default_value = "")]
    prefix: String,

    /// AI provider for summaries and tags
    #[arg(short, long, env = "CLIPDEX_PROVIDER", default_value = "openai")]
    provider: CliProvider,

    /// Model name; defaults to the provider's model
    #[arg(short, long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// What to do when a single document fails
    #[arg(long, env = "CLIPDEX_FAILURE_POLICY", default_value = "skip-all")]
    failure_policy: CliFailurePolicy,

    /// Print the build report as JSON after the run
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BrowseArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Match summaries and tags containing this text
    #[arg(short, long, default_value = "")]
    search: String,

    /// Only show videos with any of these tags
    #[arg(short, long = "tag")]
    tags: Vec<String>,

    /// Page to show, clamped to the available pages
    #[arg(long, default_value_t = 1)]
    page: usize,
}

fn exit_with_error(e: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), e);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => build(args).await,
        Command::Browse(args) => browse(args).await,
    }
}

async fn build(args: BuildArgs) -> Result<()> {
    let provider: Provider = args.provider.into();

    // Validate API key early
    if let Err(e) = provider.validate_api_key() {
        exit_with_error(e);
    }
    let client = ChatCompletionsClient::from_provider(provider, args.model.clone())?;
    let store = args.store.store_config().open().await?;

    println!(
        "\n{}  {}\n",
        style("clipdex").cyan().bold(),
        style("Catalog Builder").dim()
    );
    println!(
        "{} Listing JSON files in {}/{} {}",
        style("✓").green().bold(),
        store.container(),
        args.prefix,
        style(format!("({} {})", provider.name(), client.model())).dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    let builder = CatalogBuilder::new(
        store,
        Enricher::new(Box::new(client)),
        BuildConfig {
            prefix: args.prefix,
            output_object: args.store.output,
            failure_policy: args.failure_policy.into(),
        },
    );

    let total_start = Instant::now();
    let mut progress = CliProgress::new();
    let report = match builder.run(&mut progress).await {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            exit_with_error(e);
        }
    };

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{} {} {}",
        style("✓").green().bold(),
        format_build_summary(&report),
        style(format!("[{}]", format_duration(total_start.elapsed()))).dim()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

async fn browse(args: BrowseArgs) -> Result<()> {
    let store = args.store.store_config().open().await?;
    let catalog = CatalogSource::new(store.clone(), args.store.output.clone());
    let resolver = MediaResolver::new(store);

    let entries = match catalog.load().await {
        Ok(entries) => entries,
        Err(e) => exit_with_error(e),
    };

    let state = ViewState {
        query: args.search,
        selected_tags: args.tags,
        page: args.page,
    };
    let view = render_page(&entries, &state, DEFAULT_PAGE_SIZE, &resolver).await;

    println!("{}", format_page_readable(&view));

    Ok(())
}
