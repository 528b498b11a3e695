//! groundquiz CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use groundquiz_core::Difficulty;

mod commands;

#[derive(Parser)]
#[command(
    name = "groundquiz",
    version,
    about = "Grounded MCQ quizzes and an adaptive tutoring loop"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run without any oracle (synthetic quizzes, lexical scoring)
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a quiz grounded in an explanation
    Quiz {
        /// Topic of the quiz
        #[arg(long)]
        topic: String,

        /// File holding the explanation text
        #[arg(long, required_unless_present = "explain", conflicts_with = "explain")]
        source: Option<PathBuf>,

        /// Ask the tutor for an explanation and quiz on that
        #[arg(long)]
        explain: bool,

        /// Question difficulty: normal or easy
        #[arg(long, default_value = "normal")]
        difficulty: Difficulty,

        /// Print the quiz and its relevance as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score how well a saved quiz is grounded in an explanation
    Score {
        /// File holding the explanation text
        #[arg(long)]
        source: PathBuf,

        /// Quiz JSON (output of `quiz --json`, a quiz object, or a question array)
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Interactive explain → quiz → reteach loop
    Learn {
        /// Topic to learn
        #[arg(long)]
        topic: String,

        /// Directory for the session record
        #[arg(long, default_value = "./groundquiz-sessions")]
        output: PathBuf,
    },

    /// Generate quizzes for every request in a TOML file
    Batch {
        /// Batch file with `[[requests]]` entries
        #[arg(long)]
        topics: PathBuf,

        /// Max concurrent generations
        #[arg(long, default_value = "4")]
        parallelism: usize,

        /// Directory to save the generated quizzes
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,
    },

    /// Create a starter config and an example batch file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("groundquiz=info")),
        )
        .init();

    let cli = Cli::parse();
    let opts = commands::GlobalOpts {
        config: cli.config,
        offline: cli.offline,
    };

    let result = match cli.command {
        Commands::Quiz {
            topic,
            source,
            explain,
            difficulty,
            json,
        } => commands::quiz::execute(&opts, topic, source, explain, difficulty, json).await,
        Commands::Score { source, quiz } => commands::score::execute(&opts, source, quiz).await,
        Commands::Learn { topic, output } => commands::learn::execute(&opts, topic, output).await,
        Commands::Batch {
            topics,
            parallelism,
            output,
        } => commands::batch::execute(&opts, topics, parallelism, output).await,
        Commands::ListModels { provider } => commands::list_models::execute(&opts, provider).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
