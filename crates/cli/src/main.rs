//! AeroBrain CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP API server
//! - `ask`: Ask a single maintenance question
//! - `ingest`: Index a folder of documents for a tenant
//! - `doctor`: Diagnose system health

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "aerobrain",
    about = "AeroBrain: aviation maintenance assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question
    Ask {
        #[arg(short, long)]
        question: String,

        /// Aircraft model (e.g. A320, B737)
        #[arg(short, long)]
        aircraft: Option<String>,

        /// ATA chapter hint
        #[arg(long)]
        ata: Option<String>,

        /// Tenant (company) id
        #[arg(short, long, default_value_t = 0)]
        tenant: i64,

        /// Continue an existing conversation
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Index a folder of PDF (or markdown) documents
    Ingest {
        dir: PathBuf,

        /// Tenant (company) id
        #[arg(short, long)]
        tenant: i64,

        /// Aircraft model applied to every document
        #[arg(short, long)]
        aircraft: Option<String>,

        #[arg(long)]
        ata: Option<String>,

        /// Document category (MMEL, MEL, MOE, REG, HF, COMPANY_PROC, RELIABILITY)
        #[arg(long, default_value = "MMEL")]
        doc_type: String,

        /// Ingest `.md` files, detecting aircraft and type from their paths
        #[arg(long)]
        markdown: bool,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask {
            question,
            aircraft,
            ata,
            tenant,
            conversation,
        } => {
            commands::ask::run(commands::ask::AskArgs {
                question,
                aircraft,
                ata,
                tenant,
                conversation,
            })
            .await?
        }
        Commands::Ingest {
            dir,
            tenant,
            aircraft,
            ata,
            doc_type,
            markdown,
        } => {
            commands::ingest::run(commands::ingest::IngestArgs {
                dir,
                tenant,
                aircraft,
                ata,
                doc_type,
                markdown,
            })
            .await?
        }
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
