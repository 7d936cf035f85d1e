use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use soultalk::{
    analytics, constants, AppState, GeminiClient, Granularity, LogStore, StaticAuthenticator,
    StoreError,
};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the chat and dashboard web server.
    Serve {
        #[arg(long, default_value_t = 8501, help = "Port for the web server.")]
        port: u16,
        #[arg(long, help = "Path to the prompt log CSV (default: user_input_log.csv).")]
        log: Option<String>,
    },
    /// Print the message count per time bucket from the prompt log.
    Stats {
        #[arg(long, value_enum, default_value = "minute")]
        granularity: Granularity,
        #[arg(long, help = "Path to the prompt log CSV.")]
        log: Option<String>,
    },
    /// Print the most frequent words in logged prompts.
    Words {
        #[arg(long, default_value_t = analytics::DEFAULT_TOP_WORDS)]
        k: usize,
        #[arg(long, help = "Path to the prompt log CSV.")]
        log: Option<String>,
    },
}

fn open_store(log: Option<String>) -> LogStore {
    LogStore::new(log.unwrap_or_else(|| constants::USER_INPUT_LOG.clone()))
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Initialize tracing (logging) subscriber
    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,soultalk=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, log } => {
            info!("Starting soultalk web server on port {}...", port);
            let state = AppState::new(
                open_store(log),
                GeminiClient::from_env(),
                Arc::new(StaticAuthenticator::from_env()),
            )
            .context("Failed to initialize application state")?;
            soultalk::start_web_server(port, state).await?;
        }
        Commands::Stats { granularity, log } => {
            let store = open_store(log);
            match store.read_all() {
                Ok(records) => {
                    for bucket in analytics::message_counts(&records, granularity) {
                        println!("{}\t{}", bucket.key, bucket.count);
                    }
                }
                Err(StoreError::NotFound(path)) => {
                    println!("No prompts logged yet ({}).", path.display());
                }
                Err(e) => return Err(e).context("Failed to read prompt log"),
            }
        }
        Commands::Words { k, log } => {
            let store = open_store(log);
            match store.read_all() {
                Ok(records) => {
                    let texts: Vec<String> = records.into_iter().map(|r| r.text).collect();
                    for entry in analytics::top_words(&texts, k) {
                        println!("{}\t{}", entry.word, entry.count);
                    }
                }
                Err(StoreError::NotFound(path)) => {
                    println!("No prompts logged yet ({}).", path.display());
                }
                Err(e) => return Err(e).context("Failed to read prompt log"),
            }
        }
    }

    Ok(())
}
