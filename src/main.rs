use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use trackd::Result;

#[derive(Parser)]
#[command(name = "trackd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Feature workflow state tracker", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a state record for a feature from its tasks document
    Init {
        /// Feature ID (also used as branch name)
        feature_id: String,

        /// Display name for the feature
        #[arg(long)]
        name: Option<String>,

        /// Path to the tasks document (default: trackd/specs/<id>/tasks.md)
        #[arg(long)]
        tasks: Option<PathBuf>,

        /// External ticket system (e.g. "jira")
        #[arg(long)]
        ticket_system: Option<String>,

        /// External ticket ID
        #[arg(long)]
        ticket_id: Option<String>,

        /// External ticket URL
        #[arg(long)]
        ticket_url: Option<String>,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Record a task status transition and advance the cursor
    Update {
        /// Feature ID
        feature_id: String,

        /// Task ID (e.g. "T001")
        task_id: String,

        /// New status (pending|in-progress|red|green|refactor|done)
        status: String,

        /// TDD sub-phase (red|green|refactor)
        #[arg(long)]
        tdd_phase: Option<String>,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Show where an interrupted feature left off
    Resume {
        /// Feature ID
        feature_id: String,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Show feature progress at a glance
    Status {
        /// Feature ID
        feature_id: String,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Check state/document coherence (exit code 1 on blockers)
    Check {
        /// Feature ID
        feature_id: String,

        /// Also verify a specific task exists in the state record
        #[arg(long)]
        task: Option<String>,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Validate a state record file against the schema
    Validate {
        /// Path to the state record
        state_file: PathBuf,

        /// External schema document (JSON or YAML); default is embedded
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Archive or discard a completed feature's state record
    Cleanup {
        /// Feature ID
        feature_id: String,

        /// Archive the record to the feature's spec directory first
        #[arg(long)]
        archive: bool,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init {
            feature_id,
            name,
            tasks,
            ticket_system,
            ticket_id,
            ticket_url,
            json,
        } => {
            trackd::cli::init::run(
                &feature_id,
                name,
                ticket_system,
                ticket_id,
                ticket_url,
                tasks,
                json,
            )?;
        }

        Commands::Update {
            feature_id,
            task_id,
            status,
            tdd_phase,
            json,
        } => {
            trackd::cli::update::run(&feature_id, &task_id, &status, tdd_phase, json)?;
        }

        Commands::Resume { feature_id, json } => {
            trackd::cli::resume::run(&feature_id, json)?;
        }

        Commands::Status { feature_id, json } => {
            trackd::cli::status::run(&feature_id, json)?;
        }

        Commands::Check {
            feature_id,
            task,
            json,
        } => {
            trackd::cli::check::run(&feature_id, task, json)?;
        }

        Commands::Validate {
            state_file,
            schema,
            json,
        } => {
            trackd::cli::validate::run(&state_file, schema, json)?;
        }

        Commands::Cleanup {
            feature_id,
            archive,
            json,
        } => {
            trackd::cli::cleanup::run(&feature_id, archive, json)?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "trackd", &mut io::stdout());
        }
    }

    Ok(())
}
