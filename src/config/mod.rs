//! Configuration loading and validation
//!
//! Configuration is read from a TOML file, parsed with serde, and run
//! through a validation pass before the pipeline sees it.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, CrawlerConfig, OutputConfig, SessionConfig, SourceConfig};
pub use validation::validate;
