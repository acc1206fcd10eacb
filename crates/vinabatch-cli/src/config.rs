//! Settings for the `dock` and `parse` commands, merged from flags, an optional
//! TOML file, the environment and built-in defaults.

mod builder;
mod defaults;
mod file;

pub use builder::{build_dock_config, build_parse_config};
pub use defaults::EXECUTABLE_ENV_VAR;
