//! Operation: report every configuration with its resolved tree.

use std::fmt::Write as _;
use std::path::Path;

use rigging_core::config::GlobalConfig;

use crate::project::Project;

pub async fn dependencies(
    project_root: &Path,
    config: &GlobalConfig,
    configurations: &[String],
) -> miette::Result<()> {
    let project = Project::discover(project_root, config)?;
    print!("{}", report(&project, configurations).await?);
    Ok(())
}

/// One section per configuration: name, description and parents, then the
/// tree. A configuration that fails to resolve is reported inline.
pub async fn report(project: &Project, requested: &[String]) -> miette::Result<String> {
    let names = project.selected_configurations(requested);
    let mut output = String::new();
    for name in &names {
        let configuration = project.configurations.get(name).ok_or_else(|| {
            rigging_resolver::ConfigurationError::NotFound { name: name.clone() }
        })?;
        let _ = write!(output, "{name}");
        if let Some(description) = configuration.description() {
            let _ = write!(output, " - {description}");
        }
        output.push('\n');
        if !configuration.extends_from().is_empty() {
            let _ = writeln!(output, "  extends: {}", configuration.extends_from().join(", "));
        }

        match project.configurations.resolve(name, &project.resolver).await {
            Ok(result) if result.graph().is_empty() => output.push_str("No dependencies\n"),
            Ok(result) => {
                // Skip the root line; the header above names the configuration.
                for line in result.graph().print_tree(None).lines().skip(1) {
                    let _ = writeln!(output, "{line}");
                }
            }
            Err(err) => {
                tracing::debug!("{name}: {err}");
                let _ = writeln!(output, "FAILED: {err}");
            }
        }
        output.push('\n');
    }
    Ok(output)
}
