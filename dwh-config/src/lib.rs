//! Configuration for the warehouse job binaries.
//!
//! Configuration is read from an INI file (`dwh.cfg` by default) with `APP_`-prefixed
//! environment variable overrides. See [`load_config`].

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from_path};
