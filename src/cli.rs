use clap::{Parser, Subcommand};

use crate::render::ProgressStep;

/// Render and update PR comments summarizing eval runs
#[derive(Parser, Debug, Clone)]
#[command(name = "eval-comment", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Path to config file (default: .eval-comment.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Repository as owner/name, used for workflow links
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    pub repo: Option<String>,

    /// Workflow file the rerun links point at (default: eval-regression.yaml)
    #[arg(long, global = true)]
    pub workflow_file: Option<String>,

    /// Maximum number of previous runs kept in the comment (default: 5)
    #[arg(long, global = true)]
    pub max_history: Option<usize>,

    /// Byte budget for the comment body (default: 60000)
    #[arg(long, global = true)]
    pub max_comment_size: Option<usize>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Render the comment body for the current run
    Render {
        /// JSON file with the workflow step outputs (default: EVAL_* environment variables)
        #[arg(long)]
        params: Option<String>,

        /// File holding the body of the comment being replaced
        #[arg(long)]
        existing: Option<String>,

        /// Render the run as completed
        #[arg(long)]
        completed: bool,

        /// Markdown file with the results of a completed run
        #[arg(long, requires = "completed")]
        results: Option<String>,

        /// Progress checklist entry, as done:<text> or todo:<text> (repeatable)
        #[arg(long = "step", conflicts_with = "completed")]
        steps: Vec<ProgressStep>,

        /// Write the body to this file instead of stdout
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Print the collapsed run history of a comment as JSON
    History {
        /// File holding the comment body
        file: String,
    },

    /// Print the completed current run of a comment as JSON (null when absent)
    Current {
        /// File holding the comment body
        file: String,
    },
}
