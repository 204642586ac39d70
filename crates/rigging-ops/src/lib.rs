pub mod ops_dependencies;
pub mod ops_resolve;
pub mod ops_tree;
pub mod project;

pub use project::Project;
