//! CLI command definitions using clap.
//!
//! - run: refactor the selected classes of a project
//! - detect: rank god-class candidates
//! - plan: show the improvement plan for one class

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// refagent - iterative LLM refactoring gated by build and tests
#[derive(Parser, Debug)]
#[command(name = "refagent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the retry loop over a project's classes
    Run {
        /// Project name under the projects directory
        project: String,

        /// Attempt budget per class
        #[arg(short, long)]
        max_attempts: Option<u32>,

        /// Only process the top ranked classes
        #[arg(short, long)]
        ranked: bool,

        /// How many ranked classes to process
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Rank god-class candidates without changing anything
    Detect {
        project: String,

        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Print the improvement plan for one class
    Plan {
        project: String,

        /// Class name, e.g. VirtualMachine
        class: String,
    },
}
