//! Configuration module for styleconf
//!
//! Provides the resolved [`Configuration`] type, the resolver that builds it
//! from raw declarations, and discovery/loading of declaration files.

pub mod loader;
pub mod resolve;
pub mod schema;

pub use loader::{
    find_config, find_config_from, load_config, load_configs, load_from_args, project_root,
    read_declaration, ConfigError, CONFIG_FILE_NAMES,
};
pub use resolve::{resolve, resolve_all, MalformedConfig, RawDeclaration};
pub use schema::*;
