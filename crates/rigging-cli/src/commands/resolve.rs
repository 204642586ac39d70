//! Handler for `rigging resolve`.

use std::path::Path;

use miette::Result;
use rigging_core::config::GlobalConfig;
use rigging_ops::ops_resolve::{self, ResolveOptions};

pub async fn exec(
    project_root: &Path,
    config: &GlobalConfig,
    configurations: Vec<String>,
    json: bool,
) -> Result<()> {
    let opts = ResolveOptions {
        configurations,
        json,
    };
    ops_resolve::resolve(project_root, config, &opts).await
}
