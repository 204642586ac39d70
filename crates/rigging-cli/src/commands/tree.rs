//! Handler for `rigging tree`.

use std::path::Path;

use miette::Result;
use rigging_core::config::GlobalConfig;
use rigging_ops::ops_tree::{self, TreeOptions};

pub struct Args {
    pub configuration: Option<String>,
    pub depth: Option<usize>,
    pub why: Option<String>,
    pub conflicts: bool,
    pub inverted: Option<String>,
}

pub async fn exec(project_root: &Path, config: &GlobalConfig, args: Args) -> Result<()> {
    let opts = TreeOptions {
        configuration: args.configuration,
        depth: args.depth,
        why: args.why,
        conflicts: args.conflicts,
        inverted: args.inverted,
    };
    ops_tree::tree(project_root, config, &opts).await
}
