pub mod toml_loader;

pub use toml_loader::{load_catalog, parse_catalog, validate_catalog};
