use distwrap_core::DistributionType;

/// Values supplied on the command line. Each one beats the persisted
/// properties file and the configuration properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub distribution_type: Option<DistributionType>,
    pub url: Option<String>,
    pub sha256: Option<String>,
    pub version: Option<String>,
}

impl Overrides {
    /// True when the user asked for a different distribution identity, which
    /// invalidates a URL remembered from an earlier run.
    pub fn changes_identity(&self) -> bool {
        self.version.is_some() || self.distribution_type.is_some()
    }
}
