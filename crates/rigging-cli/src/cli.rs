//! CLI argument definitions for Rigging.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "rigging",
    version,
    about = "Resolve dependency configurations of a project",
    long_about = "Rigging reads the configurations declared in Rigging.toml, resolves their \
                  transitive dependencies against a module repository and reports the result."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Global configuration file (default: ~/.rigging/config.toml)
    #[arg(long, global = true, env = "RIGGING_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve configurations and list their files
    Resolve {
        /// Configuration to resolve; repeatable. Defaults to every visible one
        #[arg(short, long = "configuration")]
        configurations: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the dependency tree of a configuration
    Tree {
        /// Configuration to show (default: compile)
        #[arg(short, long)]
        configuration: Option<String>,
        /// Maximum depth
        #[arg(long)]
        depth: Option<usize>,
        /// Explain why a module is included
        #[arg(long)]
        why: Option<String>,
        /// Show version conflicts
        #[arg(long)]
        conflicts: bool,
        /// Show the modules depending on a module
        #[arg(long, value_name = "MODULE")]
        inverted: Option<String>,
    },

    /// Report every configuration with its description and tree
    Dependencies {
        /// Configuration to report; repeatable. Defaults to every visible one
        #[arg(short, long = "configuration")]
        configurations: Vec<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
