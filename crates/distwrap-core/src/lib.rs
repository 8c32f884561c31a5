mod distribution;
mod error;
pub mod keys;
mod properties;

pub use distribution::{
    parse_distribution_file_name, url_file_name, DistributionFileName, DistributionSpec,
    DistributionType, PathBase, StorageLocation, DEFAULT_DISTRIBUTION_PATH,
    DEFAULT_DISTRIBUTION_VERSION,
};
pub use error::{WrapperError, WrapperResult};
pub use properties::{read_properties_file, write_properties_file, Properties};

#[cfg(test)]
mod tests;
