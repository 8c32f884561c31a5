use std::path::{Path, PathBuf};

use distwrap_core::{url_file_name, PathBase, StorageLocation, WrapperError, WrapperResult};
use distwrap_security::sha256_hex;
use url::Url;

/// Written inside a cache entry as the last step of an install. Holds the name
/// of the distribution home directory.
pub const COMPLETE_MARKER: &str = ".distwrap-complete";

const URL_HASH_LEN: usize = 16;

/// The two directories every `StorageLocation` is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoots {
    gradle_user_home: PathBuf,
    project_dir: PathBuf,
}

impl StorageRoots {
    pub fn new(gradle_user_home: impl Into<PathBuf>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            gradle_user_home: gradle_user_home.into(),
            project_dir: project_dir.into(),
        }
    }

    pub fn gradle_user_home(&self) -> &Path {
        &self.gradle_user_home
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn root(&self, location: &StorageLocation) -> PathBuf {
        let base = match location.base {
            PathBase::GradleUserHome => &self.gradle_user_home,
            PathBase::Project => &self.project_dir,
        };
        base.join(&location.path)
    }
}

/// First 16 hex digits of the SHA-256 of a distribution URL.
pub fn url_hash(url: &Url) -> String {
    let mut hash = sha256_hex(url.as_str().as_bytes());
    hash.truncate(URL_HASH_LEN);
    hash
}

/// Names of everything that belongs to one cache entry.
///
/// The same source URL always maps to the same entry; entries for different
/// URLs never share a directory, a lock or an archive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    name: String,
    hash: String,
}

impl CacheEntry {
    pub fn for_url(url: &Url) -> WrapperResult<Self> {
        let file_name = url_file_name(url.as_str()).ok_or_else(|| {
            WrapperError::RepositoryResolution(format!("distribution URL {url} has no file name"))
        })?;
        let name = file_name.strip_suffix(".zip").unwrap_or(file_name);
        Ok(Self {
            name: name.to_string(),
            hash: url_hash(url),
        })
    }

    /// Archive stem, for example `gradle-8.5-bin`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn group_dir(&self, distribution_root: &Path) -> PathBuf {
        distribution_root.join(&self.name)
    }

    pub fn entry_dir(&self, distribution_root: &Path) -> PathBuf {
        self.group_dir(distribution_root).join(&self.hash)
    }

    pub fn lock_path(&self, distribution_root: &Path) -> PathBuf {
        self.group_dir(distribution_root)
            .join(format!("{}.lck", self.hash))
    }

    pub fn marker_path(&self, distribution_root: &Path) -> PathBuf {
        self.entry_dir(distribution_root).join(COMPLETE_MARKER)
    }

    /// Prefix shared by every temporary extraction directory of this entry.
    pub fn temp_prefix(&self) -> String {
        format!(".{}.tmp-", self.hash)
    }

    pub fn temp_dir(&self, distribution_root: &Path, suffix: &str) -> PathBuf {
        self.group_dir(distribution_root)
            .join(format!("{}{suffix}", self.temp_prefix()))
    }

    /// Kept beside, never inside, the entry directory since archive and
    /// distribution roots are usually the same directory.
    pub fn archive_path(&self, archive_root: &Path) -> PathBuf {
        self.group_dir(archive_root)
            .join(format!("{}.zip", self.hash))
    }
}
