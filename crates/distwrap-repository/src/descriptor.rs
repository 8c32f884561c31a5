use distwrap_core::{WrapperError, WrapperResult};
use url::Url;

pub const DEFAULT_REPOSITORY_URL: &str = "https://services.gradle.org/distributions/";
pub const DEFAULT_REPOSITORY_PATTERN: &str = "[organization]-[revision]-[artifact].[ext]";

/// Where distributions are published and how their file names are laid out.
///
/// Derived fresh from configuration on every run. Only the artifact itself is
/// trusted; no descriptor or metadata file is ever fetched next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    base_url: Url,
    pattern: String,
    vendor: Option<String>,
}

impl RepositoryDescriptor {
    pub fn new(base_url: &str, pattern: &str, vendor: Option<&str>) -> WrapperResult<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                WrapperError::RepositoryResolution(format!(
                    "repository URL '{base_url}' is not an absolute URL"
                ))
            })?;

        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(WrapperError::RepositoryResolution(
                "repository pattern is empty".to_string(),
            ));
        }

        let vendor = match vendor.map(str::trim) {
            Some("") => {
                return Err(WrapperError::RepositoryResolution(
                    "vendor name is empty".to_string(),
                ))
            }
            Some(vendor) if vendor.contains(['/', '\\']) || vendor.contains(char::is_whitespace) => {
                return Err(WrapperError::RepositoryResolution(format!(
                    "vendor name '{vendor}' must not contain path separators or whitespace"
                )))
            }
            other => other.map(str::to_string),
        };

        Ok(Self {
            base_url,
            pattern: pattern.to_string(),
            vendor,
        })
    }

    /// Builds a descriptor from the optional configuration values, falling
    /// back to the public Gradle repository for anything unset.
    pub fn configured(
        base_url: Option<&str>,
        pattern: Option<&str>,
        vendor: Option<&str>,
    ) -> WrapperResult<Self> {
        Self::new(
            base_url.unwrap_or(DEFAULT_REPOSITORY_URL),
            pattern.unwrap_or(DEFAULT_REPOSITORY_PATTERN),
            vendor,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    /// Organization segment of the coordinate: `<vendor>-gradle` or `gradle`.
    pub fn organization(&self) -> String {
        match &self.vendor {
            Some(vendor) => format!("{vendor}-gradle"),
            None => "gradle".to_string(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.vendor.is_none()
            && self.base_url.as_str() == DEFAULT_REPOSITORY_URL
            && self.pattern == DEFAULT_REPOSITORY_PATTERN
    }
}

impl Default for RepositoryDescriptor {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_REPOSITORY_URL).expect("default repository URL is valid"),
            pattern: DEFAULT_REPOSITORY_PATTERN.to_string(),
            vendor: None,
        }
    }
}
