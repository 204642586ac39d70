//! Operation: resolve configurations and list their files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rigging_core::config::GlobalConfig;
use rigging_resolver::conflict::VersionConflict;
use rigging_resolver::result::ResolvedModule;
use rigging_resolver::ResolutionResult;
use rigging_util::progress;
use serde::Serialize;

use crate::project::Project;

/// Options for `rigging resolve`.
#[derive(Debug, Default)]
pub struct ResolveOptions {
    /// Configurations to resolve; empty means every visible one.
    pub configurations: Vec<String>,
    pub json: bool,
}

#[derive(Serialize)]
struct ConfigurationReport<'a> {
    name: &'a str,
    files: &'a [PathBuf],
    modules: &'a [ResolvedModule],
    conflicts: &'a [VersionConflict],
}

/// Resolve the requested configurations of the project at `project_root`
/// and print their files.
pub async fn resolve(
    project_root: &Path,
    config: &GlobalConfig,
    opts: &ResolveOptions,
) -> miette::Result<()> {
    let project = Project::discover(project_root, config)?;
    let names = project.selected_configurations(&opts.configurations);
    let results = project.resolve_all(&names).await?;

    if opts.json {
        println!("{}", render_json(&results)?);
        return Ok(());
    }
    for result in &results {
        progress::status(
            "Resolved",
            &progress::resolved_summary(
                result.configuration(),
                result.modules().len(),
                result.files().len(),
            ),
        );
        for conflict in &result.conflicts().conflicts {
            progress::status_warn(
                "Conflict",
                &progress::redirect_summary(
                    &conflict.module.to_string(),
                    &conflict.requested,
                    &conflict.selected,
                    &conflict.reason.to_string(),
                ),
            );
        }
    }
    print!("{}", render_files(&results));
    Ok(())
}

/// `configuration:` followed by one indented file per line.
pub fn render_files(results: &[Arc<ResolutionResult>]) -> String {
    let mut output = String::new();
    for result in results {
        output.push_str(&format!("{}:\n", result.configuration()));
        if result.files().is_empty() {
            output.push_str("  (no files)\n");
        }
        for file in result.files() {
            output.push_str(&format!("  {}\n", file.display()));
        }
    }
    output
}

pub fn render_json(results: &[Arc<ResolutionResult>]) -> miette::Result<String> {
    let reports: Vec<_> = results
        .iter()
        .map(|r| ConfigurationReport {
            name: r.configuration(),
            files: r.files(),
            modules: r.modules(),
            conflicts: &r.conflicts().conflicts,
        })
        .collect();
    serde_json::to_string_pretty(&serde_json::json!({ "configurations": reports })).map_err(|e| {
        rigging_util::errors::RiggingError::Generic {
            message: format!("failed to serialize resolution: {e}"),
        }
        .into()
    })
}
