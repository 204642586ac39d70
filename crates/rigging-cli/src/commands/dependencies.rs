//! Handler for `rigging dependencies`.

use std::path::Path;

use miette::Result;
use rigging_core::config::GlobalConfig;
use rigging_ops::ops_dependencies;

pub async fn exec(project_root: &Path, config: &GlobalConfig, configurations: &[String]) -> Result<()> {
    ops_dependencies::dependencies(project_root, config, configurations).await
}
