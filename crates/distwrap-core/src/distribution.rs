use std::fmt;
use std::time::Duration;

use crate::error::{WrapperError, WrapperResult};

pub const DEFAULT_DISTRIBUTION_PATH: &str = "wrapper/dists";
pub const DEFAULT_DISTRIBUTION_VERSION: &str = "8.14.3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistributionType {
    #[default]
    Bin,
    All,
}

impl DistributionType {
    pub const VALUES: [Self; 2] = [Self::Bin, Self::All];

    /// Lowercase token used in repository coordinates and file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bin => "bin",
            Self::All => "all",
        }
    }

    pub fn parse(key: &str, value: &str) -> WrapperResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bin" => Ok(Self::Bin),
            "all" => Ok(Self::All),
            _ => Err(WrapperError::configuration(key, value, "one of: BIN, ALL")),
        }
    }
}

impl fmt::Display for DistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathBase {
    #[default]
    GradleUserHome,
    Project,
}

impl PathBase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GradleUserHome => "GRADLE_USER_HOME",
            Self::Project => "PROJECT",
        }
    }

    pub fn parse(key: &str, value: &str) -> WrapperResult<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GRADLE_USER_HOME" => Ok(Self::GradleUserHome),
            "PROJECT" => Ok(Self::Project),
            _ => Err(WrapperError::configuration(
                key,
                value,
                "one of: GRADLE_USER_HOME, PROJECT",
            )),
        }
    }
}

impl fmt::Display for PathBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory expressed relative to one of the two storage roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageLocation {
    pub base: PathBase,
    pub path: String,
}

impl StorageLocation {
    pub fn new(base: PathBase, path: impl Into<String>) -> Self {
        Self {
            base,
            path: path.into(),
        }
    }
}

impl Default for StorageLocation {
    fn default() -> Self {
        Self::new(PathBase::GradleUserHome, DEFAULT_DISTRIBUTION_PATH)
    }
}

/// The fully resolved description of the distribution to install.
///
/// Built once per invocation by the configuration resolver. Fields are only
/// reachable through getters; the `with_*` methods consume the value and are
/// meant for construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSpec {
    version: String,
    distribution_type: DistributionType,
    url: Option<String>,
    sha256: Option<String>,
    archive: StorageLocation,
    distribution: StorageLocation,
    network_timeout: Option<Duration>,
}

impl DistributionSpec {
    pub fn new(version: impl Into<String>, distribution_type: DistributionType) -> Self {
        Self {
            version: version.into(),
            distribution_type,
            url: None,
            sha256: None,
            archive: StorageLocation::default(),
            distribution: StorageLocation::default(),
            network_timeout: None,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_sha256(mut self, sha256: Option<String>) -> Self {
        self.sha256 = sha256;
        self
    }

    pub fn with_archive(mut self, archive: StorageLocation) -> Self {
        self.archive = archive;
        self
    }

    pub fn with_distribution(mut self, distribution: StorageLocation) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_network_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.network_timeout = timeout;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn distribution_type(&self) -> DistributionType {
        self.distribution_type
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }

    pub fn archive(&self) -> &StorageLocation {
        &self.archive
    }

    pub fn distribution(&self) -> &StorageLocation {
        &self.distribution
    }

    pub fn network_timeout(&self) -> Option<Duration> {
        self.network_timeout
    }
}

/// Pieces recovered from a distribution archive name such as
/// `acme-gradle-8.5-all.zip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionFileName {
    pub vendor: Option<String>,
    pub version: String,
    pub distribution_type: DistributionType,
}

pub fn parse_distribution_file_name(file_name: &str) -> Option<DistributionFileName> {
    let stem = file_name.strip_suffix(".zip")?;
    let (rest, type_token) = stem.rsplit_once('-')?;
    let distribution_type = DistributionType::parse("", type_token).ok()?;

    let index = rest.find("gradle-")?;
    let version = &rest[index + "gradle-".len()..];
    if version.is_empty() {
        return None;
    }

    let vendor = match &rest[..index] {
        "" => None,
        prefix => Some(prefix.strip_suffix('-')?.to_string()),
    };

    Some(DistributionFileName {
        vendor,
        version: version.to_string(),
        distribution_type,
    })
}

/// Last path segment of a URL with query and fragment removed.
pub fn url_file_name(url: &str) -> Option<&str> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);
    let file_name = without_query.rsplit('/').next().unwrap_or("");

    if file_name.is_empty() || file_name == "." || file_name == ".." || file_name.contains('\\') {
        return None;
    }
    Some(file_name)
}
