mod collect;
mod discover;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ugci_core::{Platform, WindowKind};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "ugci-cli")]
#[command(about = "UGC trend discovery command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one discovery cycle offline over a JSON array of posts
    Discover {
        /// File holding a JSON array of posts
        #[arg(long)]
        input: PathBuf,

        /// Keep only posts published inside this window, ending at --now
        #[arg(long)]
        window: Option<WindowKind>,

        /// Confidence floor a signal must reach to get a proof tile
        #[arg(long, default_value_t = 0.7)]
        min_confidence: f64,

        /// Discovery thresholds file
        #[arg(
            long,
            env = "UGCI_DISCOVERY_CONFIG_PATH",
            default_value = "./config/discovery.yaml"
        )]
        config: PathBuf,

        /// Evaluate the run at this RFC 3339 instant instead of the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Search platforms for keywords and store what comes back
    Collect {
        /// Platform to search; repeat or comma-separate for several
        #[arg(long = "platform", required = true, value_delimiter = ',')]
        platforms: Vec<Platform>,

        /// Keyword or hashtag to search for; repeatable
        #[arg(long = "keyword", required = true)]
        keywords: Vec<String>,

        /// Only keep posts published inside this window
        #[arg(long, default_value = "early_detection")]
        window: WindowKind,

        /// Fetch and report without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Refresh engagement counters for known posts
    Recapture {
        #[arg(long)]
        platform: Platform,

        #[arg(long = "post-id", required = true)]
        post_ids: Vec<String>,

        /// Fetch and report without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Pull recent posts from a list of creators
    Watch {
        #[arg(long)]
        platform: Platform,

        #[arg(long = "creator-id", required = true)]
        creator_ids: Vec<String>,

        /// Fetch and report without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply pending database migrations
    Migrate,
}

fn init_tracing() -> anyhow::Result<()> {
    let fallback =
        std::env::var("UGCI_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_owned());
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Discover {
            input,
            window,
            min_confidence,
            config,
            now,
        }) => {
            let args = discover::DiscoverArgs {
                input,
                window,
                min_confidence,
                config,
                now: now.unwrap_or_else(Utc::now),
            };
            discover::run_discover(&args)?;
        }
        Some(Commands::Collect {
            platforms,
            keywords,
            window,
            dry_run,
        }) => {
            let config = ugci_core::load_app_config()?;
            collect::run_collect(&config, &platforms, &keywords, window, dry_run).await?;
        }
        Some(Commands::Recapture {
            platform,
            post_ids,
            dry_run,
        }) => {
            let config = ugci_core::load_app_config()?;
            collect::run_recapture(&config, platform, &post_ids, dry_run).await?;
        }
        Some(Commands::Watch {
            platform,
            creator_ids,
            dry_run,
        }) => {
            let config = ugci_core::load_app_config()?;
            collect::run_watch(&config, platform, &creator_ids, dry_run).await?;
        }
        Some(Commands::Migrate) => {
            let config = ugci_core::load_app_config()?;
            let pool = collect::connect(&config).await?;
            let applied = ugci_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        None => println!("ugci-cli ready; run with --help to list commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
