use std::time::Duration;

use distwrap_core::{DistributionType, WrapperError, WrapperResult};
use serde::Deserialize;
use url::Url;

use crate::descriptor::RepositoryDescriptor;
use crate::file_repository::{ArtifactResolver, FileRepository};
use crate::locate::{Coordinate, LATEST_REVISION};

pub const CURRENT_VERSION_URL: &str = "https://services.gradle.org/versions/current";

/// The release document served by the Gradle version service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInfo {
    pub version: String,
    pub download_url: String,
    #[serde(default)]
    pub checksum_url: Option<String>,
}

pub trait VersionFeed {
    /// Latest stable release version published by the feed.
    fn latest_version(&self) -> WrapperResult<String>;
}

pub struct HttpVersionFeed {
    client: reqwest::blocking::Client,
    endpoint: Url,
}

impl HttpVersionFeed {
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> WrapperResult<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| WrapperError::download(endpoint.as_str(), err))?;
        Ok(Self { client, endpoint })
    }

    pub fn current(timeout: Option<Duration>) -> WrapperResult<Self> {
        let endpoint = Url::parse(CURRENT_VERSION_URL)
            .map_err(|err| WrapperError::download(CURRENT_VERSION_URL, err))?;
        Self::new(endpoint, timeout)
    }

    pub fn release(&self) -> WrapperResult<ReleaseInfo> {
        let url = self.endpoint.as_str();
        let body = self
            .client
            .get(self.endpoint.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|err| WrapperError::download(url, err))?;
        parse_release_info(&body)
    }
}

impl VersionFeed for HttpVersionFeed {
    fn latest_version(&self) -> WrapperResult<String> {
        self.release().map(|release| release.version)
    }
}

pub fn parse_release_info(raw: &str) -> WrapperResult<ReleaseInfo> {
    let release: ReleaseInfo = serde_json::from_str(raw).map_err(|err| {
        WrapperError::RepositoryResolution(format!("malformed version feed document: {err}"))
    })?;
    if release.version.trim().is_empty() {
        return Err(WrapperError::RepositoryResolution(
            "version feed returned an empty version".to_string(),
        ));
    }
    Ok(release)
}

/// Finds the newest version for self-update.
///
/// `file://` repositories are listed directly. The public Gradle repository
/// is asked through `feed`. Any other remote repository cannot be listed.
pub fn latest_version(
    repo: &RepositoryDescriptor,
    distribution_type: DistributionType,
    feed: &dyn VersionFeed,
) -> WrapperResult<String> {
    if let Some(files) = FileRepository::from_descriptor(repo) {
        let latest = Coordinate::new(repo, LATEST_REVISION, distribution_type);
        return files
            .resolve(&latest)?
            .map(|artifact| artifact.coordinate.revision)
            .ok_or_else(|| {
                WrapperError::RepositoryResolution(format!(
                    "no stable release of {latest} found under {}",
                    files.root().display()
                ))
            });
    }

    if repo.is_default() {
        let version = feed.latest_version()?;
        tracing::debug!(%version, "version feed reported latest release");
        return Ok(version);
    }

    Err(WrapperError::RepositoryResolution(format!(
        "cannot list releases of {}; pass --dist-version instead of --self-update",
        repo.base_url()
    )))
}
