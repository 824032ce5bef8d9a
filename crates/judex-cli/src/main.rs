mod display;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use judex_ai::{EnrichConfig, Enricher, GeminiClient, GeminiConfig, RetryPolicy};
use judex_store::{DocumentRepository, JsonSnapshot};

#[derive(Parser, Debug)]
#[command(name = "judex", version, about = "Court judgment annotation and summarisation")]
struct Cli {
    /// Judgment snapshot: a JSON array, or `window.JUDGMENT_DB = [...];`
    #[arg(long, global = true, env = "JUDEX_STORE", default_value = "data.js")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarise the reasoning of every eligible judgment
    Enrich(EnrichArgs),
    /// Remove judgments with a repeated identifier, keeping the first
    Dedup {
        /// Report duplicates without rewriting the snapshot
        #[arg(long)]
        dry_run: bool,
    },
    /// List the distinct normalised categories as JSON
    Categories,
    /// List summarised judgments with their headline point
    KeyCases {
        #[arg(long, default_value_t = 6)]
        limit: usize,
    },
    /// Print one judgment as a card
    Show {
        id: String,
        #[arg(long, default_value = "理由")]
        reasoning_marker: String,
    },
}

#[derive(Args, Debug)]
struct EnrichArgs {
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "JUDEX_MODEL", default_value = judex_ai::DEFAULT_MODEL)]
    model: String,

    #[arg(long, default_value = judex_ai::DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Operative-text keyword that makes a judgment eligible (repeatable)
    #[arg(long = "keyword", default_values_t = ["撤銷".to_string(), "廢棄".to_string()])]
    keywords: Vec<String>,

    /// Substring identifying the reasoning section title
    #[arg(long, default_value = "理由")]
    reasoning_marker: String,

    /// Pause between requests, in milliseconds
    #[arg(long, default_value_t = 5_000)]
    delay_ms: u64,

    /// Retries after a rate-limited request
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Wait after a rate limit without a suggested delay, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    backoff_ms: u64,

    /// Added to a suggested delay, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    margin_ms: u64,
}

impl EnrichArgs {
    fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    fn enrich_config(&self) -> EnrichConfig {
        EnrichConfig {
            keywords: self.keywords.clone(),
            reasoning_marker: self.reasoning_marker.clone(),
            request_delay: Duration::from_millis(self.delay_ms),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                default_backoff: Duration::from_millis(self.backoff_ms),
                margin: Duration::from_millis(self.margin_ms),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("judex v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut repo = JsonSnapshot::new(&cli.store);

    match cli.command {
        Command::Enrich(args) => {
            let client = GeminiClient::new(args.gemini_config())
                .context("failed to build Gemini client")?;
            let enricher = Enricher::new(client, args.enrich_config());
            let stats = enricher
                .run(&mut repo)
                .await
                .with_context(|| format!("enrichment of {} aborted", cli.store.display()))?;
            println!(
                "Summarised {}/{} judgments ({} skipped, {} failed)",
                stats.summarised(),
                stats.eligible(),
                stats.skipped(),
                stats.failed()
            );
        }
        Command::Dedup { dry_run } => {
            let mut store = load(&mut repo)?;
            let report = store.dedup();
            println!("Initial count: {}", report.initial);
            println!("Unique count: {}", report.unique);
            println!("Removed {} duplicates.", report.removed());
            if !report.changed() {
                println!("No duplicates found.");
            } else if !dry_run {
                repo.save(&store)
                    .with_context(|| format!("failed to write {}", cli.store.display()))?;
                println!("Saved {}.", cli.store.display());
            }
        }
        Command::Categories => {
            let store = load(&mut repo)?;
            println!("{}", serde_json::to_string_pretty(&store.categories())?);
        }
        Command::KeyCases { limit } => {
            let store = load(&mut repo)?;
            display::print_key_cases(&store.key_cases(Some(limit)));
        }
        Command::Show {
            id,
            reasoning_marker,
        } => {
            let store = load(&mut repo)?;
            let doc = store
                .find_by_id(&id)
                .with_context(|| format!("no judgment with id {id}"))?;
            display::print_judgment_card(doc, &reasoning_marker);
        }
    }

    Ok(())
}

fn load(repo: &mut JsonSnapshot) -> Result<judex_store::Store> {
    repo.load()
        .with_context(|| format!("failed to load {}", repo.path().display()))
}
