//! ciflow core
//!
//! Project model, `ciflow.kdl` parser and the loader that discovers and
//! merges project files.

pub mod discovery;
pub mod error;
pub mod loader;
pub mod model;
pub mod parser;

pub use discovery::{DiscoveredFiles, discover_files, find_project_root, find_project_root_from};
pub use error::{ProjectError, Result};
pub use loader::{
    ENV_STAGE_ENV, load_project, load_project_from_root, load_project_from_root_with_stage,
    resolve_stage,
};
pub use model::*;
pub use parser::{parse_kdl_file, parse_kdl_string};
