mod download;
mod extract;
mod fs_utils;
mod install;
mod layout;
mod lock;
mod workflow;

pub use download::{DownloadProgress, Downloader, FetchRequest, NoProgress, VerifiedArtifact};
pub use extract::extract_zip;
pub use install::{InstalledDistribution, Installer};
pub use layout::{url_hash, CacheEntry, StorageRoots, COMPLETE_MARKER};
pub use lock::{EntryLock, LockWait};
pub use workflow::{ensure_distribution, EnsureOptions};
