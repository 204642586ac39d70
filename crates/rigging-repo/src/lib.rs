//! Filesystem module repository: directory layout, `module.toml`
//! descriptors, artifact lookup with checksum verification, and local
//! installation.

pub mod checksum;
pub mod descriptor;
pub mod layout;
pub mod publish;
pub mod repository;

pub use descriptor::ModuleDescriptor;
pub use repository::FileRepository;
