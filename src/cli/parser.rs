//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros. This is the local
//! terminal entry point named in SPEC_FULL §2 item 10: a way to build the
//! retrieval index, validate pattern files, and drive a turn non-interactively
//! without standing up the transport/UI collaborators (§1).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// `ioslab-tutor`: local harness around the tutor orchestration core.
///
/// Builds the retrieval index, validates error-pattern JSON, and drives a
/// single non-streaming turn through the agent graph for manual testing.
/// Not the product transport — see SPEC_FULL §6.1 for the real `ask`/
/// `start_session` boundary a hosting service would call instead.
#[derive(Parser, Debug)]
#[command(name = "ioslab-tutor")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML configuration file. Falls back to defaults plus
    /// environment overrides (`ILT_*`) when omitted.
    #[arg(short, long, env = "ILT_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Builds the retrieval index from a lab corpus directory (§4.8).
    BuildIndex {
        /// Directory of lab corpus documents (`error_patterns/`,
        /// `command_reference/`, `labs/<lab_id>/`). Defaults to
        /// `paths.labs_dir`.
        #[arg(long)]
        labs_dir: Option<PathBuf>,

        /// Output path for the index database. Defaults to
        /// `retriever.index_path`.
        #[arg(long)]
        index_path: Option<PathBuf>,
    },

    /// Opens an index and checks schema/row-count/dimension invariants.
    VerifyIndex {
        /// Path to the index database. Defaults to `retriever.index_path`.
        #[arg(long)]
        index_path: Option<PathBuf>,
    },

    /// Loads every pattern JSON file in a directory and reports what
    /// loaded successfully (§4.1). Exits nonzero on the first load failure.
    ValidatePatterns {
        /// Directory of pattern JSON files. Defaults to `paths.patterns_dir`.
        #[arg(long)]
        patterns_dir: Option<PathBuf>,
    },

    /// Drives one non-streaming turn through the agent graph
    /// (`complete_turn`, §6.1) and prints the final message and metadata.
    Ask {
        /// The student's question.
        question: String,

        /// Lab identifier the session is bound to.
        #[arg(long, default_value = "lab-1")]
        lab_id: String,

        /// Lab title, shown in the teaching-path system prompt.
        #[arg(long, default_value = "Lab")]
        lab_title: String,

        /// Learner mastery level (novice, intermediate, advanced).
        #[arg(long, default_value = "novice")]
        mastery: String,

        /// A CLI command the learner ran, paired positionally with
        /// `--cli-output`. May be repeated to supply several history
        /// entries (only the last 5 are consumed, per §4.3/§6.4).
        #[arg(long = "cli-command")]
        cli_commands: Vec<String>,

        /// Terminal output paired with the `--cli-command` at the same
        /// index.
        #[arg(long = "cli-output")]
        cli_outputs: Vec<String>,

        /// Device identifier the CLI history entries ran against.
        #[arg(long, default_value = "R1")]
        device_id: String,
    },

    /// Prints a summary of the resolved configuration and whether the
    /// retrieval index and pattern registry are reachable.
    Status,
}
