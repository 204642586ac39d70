//! Operation: display the dependency tree of one configuration.

use std::path::Path;

use rigging_core::config::GlobalConfig;
use rigging_resolver::ResolutionResult;

use crate::project::Project;

/// Options for `rigging tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Configuration to show; defaults to `compile`.
    pub configuration: Option<String>,
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the path from the root to one module.
    pub why: Option<String>,
    /// Show version conflicts.
    pub conflicts: bool,
    /// Show who depends on one module.
    pub inverted: Option<String>,
}

pub async fn tree(project_root: &Path, config: &GlobalConfig, opts: &TreeOptions) -> miette::Result<()> {
    let project = Project::discover(project_root, config)?;
    let name = project.tree_configuration(opts.configuration.as_deref())?;
    let result = project.resolve(&name).await?;
    print!("{}", render(&result, opts));
    Ok(())
}

pub fn render(result: &ResolutionResult, opts: &TreeOptions) -> String {
    let graph = result.graph();

    if let Some(target) = &opts.why {
        return match graph.find_path(target) {
            Some(path) => {
                let mut output = format!("Path to {target}:\n");
                for (i, node) in path.iter().enumerate() {
                    output.push_str(&format!("{}{node}\n", "  ".repeat(i)));
                }
                output
            }
            None => format!("Dependency '{target}' not found in the graph.\n"),
        };
    }

    if opts.conflicts {
        return format!("{}\n", result.conflicts());
    }

    if let Some(target) = &opts.inverted {
        let output = graph.print_inverted_tree(target);
        return if output.is_empty() {
            format!("Dependency '{target}' not found in the graph.\n")
        } else {
            output
        };
    }

    graph.print_tree(opts.depth)
}
