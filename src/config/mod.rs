// src/config/mod.rs

//! TOML configuration: tool definitions, staging paths, timing.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, ToolConfig};
