//! proctor CLI, the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "proctor", version, about = "Timed multiple-choice exams in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an exam interactively
    Take {
        /// Exam id
        #[arg(long)]
        exam: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a set of answers against an exam file without a session
    Score {
        /// Path to the exam file (.toml or .json)
        #[arg(long)]
        exam: PathBuf,

        /// JSON object mapping 0-based question index to option key
        #[arg(long)]
        answers: PathBuf,

        /// Print the per-question review as well
        #[arg(long)]
        review: bool,
    },

    /// Validate exam files
    Validate {
        /// Path to exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// List the available exams
    Exams {
        /// Filter by exam name
        #[arg(long)]
        search: Option<String>,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List past attempts with summary statistics
    History {
        /// Filter by exam name or date (DD-MM-YYYY)
        #[arg(long)]
        search: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and a sample exam
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("proctor=warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take { exam, config } => commands::take::execute(exam, config).await,
        Commands::Score {
            exam,
            answers,
            review,
        } => commands::score::execute(exam, answers, review),
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Exams {
            search,
            category,
            config,
        } => commands::exams::execute(search, category, config).await,
        Commands::History { search, config } => commands::history::execute(search, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
