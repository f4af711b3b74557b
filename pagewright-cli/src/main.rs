//! Pagewright CLI - Command-line interface for PDF to EPUB conversion

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ConvertArgs, OptionArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse and validate jobs argument (must be at least 1)
fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if n < 1 {
        Err("jobs must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(author, version, about = "Convert PDF documents into EPUB 2 books", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF into an EPUB
    Convert {
        /// Input PDF path
        input: String,

        /// Output EPUB path (defaults to the input path with an .epub extension)
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Show how the pages of a PDF would be classified
    Info {
        /// Input PDF path
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// JSON file with conversion options
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Check the container structure of an EPUB file
    Validate {
        /// Input EPUB path
        input: String,

        /// Also reject entries outside the expected layout
        #[arg(long)]
        strict: bool,
    },

    /// Convert every PDF in a directory
    Batch {
        /// Input directory
        input_dir: String,

        /// Output directory
        #[arg(short, long)]
        output_dir: String,

        /// Number of parallel jobs (must be at least 1)
        #[arg(short, long, default_value = "4", value_parser = parse_jobs)]
        jobs: usize,

        #[command(flatten)]
        options: OptionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "pagewright_cli=debug,pagewright_core=debug"
    } else {
        "pagewright_cli=info,pagewright_core=warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            options,
        } => {
            commands::convert(ConvertArgs {
                input,
                output,
                options,
            })
            .await
        }

        Commands::Info {
            input,
            json,
            config,
        } => commands::info(&input, json, config.as_deref()),

        Commands::Validate { input, strict } => commands::validate(&input, strict),

        Commands::Batch {
            input_dir,
            output_dir,
            jobs,
            options,
        } => commands::batch(&input_dir, &output_dir, jobs, &options),
    }
}
