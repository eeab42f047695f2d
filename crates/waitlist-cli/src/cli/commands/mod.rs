//! CLI command handlers, one file per command.

mod config;
mod info;
mod join;

pub use config::run_config;
pub use info::run_info;
pub use join::run_join;
