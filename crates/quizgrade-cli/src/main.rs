//! quizgrade CLI: offline grading and question-bank checks.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Completion;

#[derive(Parser)]
#[command(name = "quizgrade", version, about = "Answer evaluation and auto-grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one answer against one question definition
    Evaluate {
        /// Question definition JSON
        #[arg(long)]
        question: PathBuf,

        /// Answer payload JSON
        #[arg(long)]
        answer: PathBuf,

        /// Sandbox execution record JSON (program submissions)
        #[arg(long, conflicts_with = "execute")]
        execution: Option<PathBuf>,

        /// Run program submissions through the configured sandbox
        #[arg(long)]
        execute: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Omit the feedback string
        #[arg(long)]
        no_feedback: bool,
    },

    /// Grade a batch of submissions against a question bank
    Grade {
        /// Path to a .toml or .json question bank
        #[arg(long)]
        bank: PathBuf,

        /// Submissions JSON
        #[arg(long)]
        submissions: PathBuf,

        /// Output directory for the batch report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Run program submissions through the configured sandbox
        #[arg(long)]
        execute: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank files
    Validate {
        /// Path to a question bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("quizgrade=info,quizgrade_core=info,quizgrade_sandbox=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Evaluate {
            question,
            answer,
            execution,
            execute,
            config,
            no_feedback,
        } => {
            commands::evaluate::execute(question, answer, execution, execute, config, no_feedback)
                .await
        }
        Commands::Grade {
            bank,
            submissions,
            output,
            execute,
            config,
        } => commands::grade::execute(bank, submissions, output, execute, config).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Init => commands::init::execute(),
    };

    match result {
        Ok(Completion::Done) => {}
        Ok(Completion::Ungraded) => process::exit(commands::EXIT_UNGRADED),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
