mod config;
mod resolve;
mod types;

pub use config::{parse_property_assignment, ConfigProperties};
pub use resolve::resolve;
pub use types::Overrides;
