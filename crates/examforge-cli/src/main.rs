//! examforge CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "examforge",
    version,
    about = "Adaptive exam generation and grading engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a submission against a question set
    Grade {
        /// Question set TOML file
        #[arg(long)]
        questions: PathBuf,

        /// Submission (answers) TOML file
        #[arg(long)]
        answers: PathBuf,

        /// Write the grading report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Analyze attempt history into a performance profile
    Analyze {
        /// Attempt-history TOML file (most recent attempts)
        #[arg(long)]
        attempts: PathBuf,

        /// Student identifier
        #[arg(long)]
        student: String,

        /// Subject the attempts belong to
        #[arg(long)]
        subject: String,

        /// JSON profile store to read from and upsert into
        #[arg(long)]
        store: Option<PathBuf>,

        /// Write the analysis as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate an adaptive exam
    Generate {
        /// Subject to generate for
        #[arg(long)]
        subject: String,

        /// Grade level communicated to the generation service
        #[arg(long, default_value = "general")]
        grade_level: String,

        /// Number of questions
        #[arg(long, default_value = "10")]
        count: usize,

        /// Target difficulty: auto, easy, medium, or hard
        #[arg(long, default_value = "auto")]
        difficulty: String,

        /// Comma-separated focus topics (overrides profile weaknesses)
        #[arg(long)]
        topics: Option<String>,

        /// Attempt-history TOML file to adapt from
        #[arg(long)]
        attempts: Option<PathBuf>,

        /// Student identifier
        #[arg(long, default_value = "student")]
        student: String,

        /// JSON profile store to read the stored profile from
        #[arg(long)]
        store: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the exam as TOML to this path (stdout otherwise)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate question set TOML files
    Validate {
        /// Path to a question set file or directory
        #[arg(long)]
        questions: PathBuf,
    },

    /// Create starter config and example question set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examforge_core=info".parse().unwrap())
                .add_directive("examforge_providers=info".parse().unwrap())
                .add_directive("examforge_store=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            questions,
            answers,
            output,
            config,
        } => commands::grade::execute(questions, answers, output, config).await,
        Commands::Analyze {
            attempts,
            student,
            subject,
            store,
            output,
        } => commands::analyze::execute(attempts, student, subject, store, output).await,
        Commands::Generate {
            subject,
            grade_level,
            count,
            difficulty,
            topics,
            attempts,
            student,
            store,
            config,
            output,
        } => {
            commands::generate::execute(
                subject,
                grade_level,
                count,
                difficulty,
                topics,
                attempts,
                student,
                store,
                config,
                output,
            )
            .await
        }
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
