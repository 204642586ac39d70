//! Command dispatch and handler modules.

mod dependencies;
mod resolve;
mod tree;

use miette::Result;
use rigging_core::config::GlobalConfig;
use rigging_util::errors::RiggingError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => GlobalConfig::load_from(path)?,
        None => GlobalConfig::load()?,
    };
    let project_root = std::env::current_dir().map_err(RiggingError::Io)?;

    match cli.command {
        Command::Resolve {
            configurations,
            json,
        } => resolve::exec(&project_root, &config, configurations, json).await,
        Command::Tree {
            configuration,
            depth,
            why,
            conflicts,
            inverted,
        } => {
            tree::exec(
                &project_root,
                &config,
                tree::Args {
                    configuration,
                    depth,
                    why,
                    conflicts,
                    inverted,
                },
            )
            .await
        }
        Command::Dependencies { configurations } => {
            dependencies::exec(&project_root, &config, &configurations).await
        }
    }
}
