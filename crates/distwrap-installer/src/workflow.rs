use distwrap_core::{DistributionSpec, WrapperResult};
use distwrap_repository::{coordinate, locate, ArtifactResolver, RepositoryDescriptor};

use crate::download::{DownloadProgress, Downloader, FetchRequest, NoProgress};
use crate::install::{InstalledDistribution, Installer};
use crate::layout::{CacheEntry, StorageRoots};
use crate::lock::LockWait;

pub struct EnsureOptions<'a> {
    pub roots: StorageRoots,
    pub lock_wait: LockWait,
    pub progress: Box<dyn DownloadProgress>,
    /// Consulted for template URLs before going to the network.
    pub resolver: Option<&'a dyn ArtifactResolver>,
}

impl EnsureOptions<'_> {
    pub fn new(roots: StorageRoots) -> Self {
        Self {
            roots,
            lock_wait: LockWait::default(),
            progress: Box::new(NoProgress),
            resolver: None,
        }
    }
}

/// Locates, fetches, verifies and installs the distribution `spec` names,
/// returning the existing install when one is already complete.
pub fn ensure_distribution(
    spec: &DistributionSpec,
    repo: &RepositoryDescriptor,
    options: EnsureOptions<'_>,
) -> WrapperResult<InstalledDistribution> {
    let url = locate(spec, repo)?;
    let installer = Installer::new(options.roots, options.lock_wait);

    if let Some(installed) = installer.installed(&url, spec)? {
        tracing::debug!(home = %installed.home_dir.display(), "distribution already installed");
        return Ok(installed);
    }

    let entry = CacheEntry::for_url(&url)?;
    let destination = entry.archive_path(&installer.roots().root(spec.archive()));

    let wanted = spec.url().is_none().then(|| coordinate(spec, repo));
    let pre_resolved = match (&wanted, options.resolver) {
        (Some(wanted), Some(resolver)) => resolver.resolve(wanted)?,
        _ => None,
    };

    let downloader = Downloader::new(spec.network_timeout())?.with_progress(options.progress);
    let artifact = downloader.fetch(&FetchRequest {
        url: &url,
        expected_sha256: spec.sha256(),
        destination: &destination,
        coordinate: wanted.as_ref(),
        pre_resolved: pre_resolved.as_ref(),
    })?;

    installer.install(&artifact, spec)
}
