//! examkit CLI — drive the exam session engine from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examkit", version, about = "Exam-taking session engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an exam's sections, parts and questions
    Inspect {
        /// Exam JSON file
        #[arg(long)]
        exam: PathBuf,

        /// Print each question's rendered view as JSON
        #[arg(long)]
        render: bool,
    },

    /// Split a reading passage into anchored paragraphs
    Segment {
        /// Passage text file; "-" reads stdin
        #[arg(long)]
        passage: PathBuf,
    },

    /// Encode a flat answer map into a submission payload
    Encode {
        /// Exam JSON file (identifies table questions)
        #[arg(long)]
        exam: PathBuf,

        /// Answers JSON file: {"key": "value" | ["a", "b"]}
        #[arg(long)]
        answers: PathBuf,
    },

    /// Check exam files for malformed questions
    Validate {
        /// Exam JSON file or directory of them
        #[arg(long)]
        exam: PathBuf,
    },

    /// Take a session driven by a script of events
    Take {
        /// Exam id, or a ticket link such as /exams/e1?section=listening&sid=abc
        route: String,

        /// JSON-lines file of session events; "-" reads stdin
        #[arg(long)]
        script: PathBuf,

        /// Serve this exam file locally instead of calling the exam service
        #[arg(long)]
        offline: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and a sample exam
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examkit=info".parse().expect("static directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect { exam, render } => commands::inspect::execute(exam, render),
        Commands::Segment { passage } => commands::segment::execute(passage),
        Commands::Encode { exam, answers } => commands::encode::execute(exam, answers),
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Take {
            route,
            script,
            offline,
            config,
        } => commands::take::execute(route, script, offline, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
