mod loader;
mod store;
mod types;

pub use loader::ConfigError;
pub use store::{expand_home, ConfigStore, Overrides};
pub use types::{Config, FsUaeConfig};
