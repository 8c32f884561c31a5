use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use distwrap_core::{DistributionSpec, WrapperError, WrapperResult};
use distwrap_security::sha256_matches;
use url::Url;

use crate::download::VerifiedArtifact;
use crate::extract::extract_zip;
use crate::fs_utils::{remove_dir_if_exists, unique_suffix};
use crate::layout::{CacheEntry, StorageRoots, COMPLETE_MARKER};
use crate::lock::{EntryLock, LockWait};

/// A ready-to-run distribution inside its cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledDistribution {
    pub entry_dir: PathBuf,
    pub home_dir: PathBuf,
    /// True only for the call that extracted the archive.
    pub freshly_installed: bool,
}

impl InstalledDistribution {
    pub fn launcher(&self) -> PathBuf {
        let name = if cfg!(windows) { "gradle.bat" } else { "gradle" };
        self.home_dir.join("bin").join(name)
    }
}

enum EntryState {
    Absent,
    Installed { home: String },
    Abandoned,
}

fn probe(entry_dir: &Path) -> WrapperResult<EntryState> {
    let marker = entry_dir.join(COMPLETE_MARKER);
    match fs::read_to_string(&marker) {
        Ok(home) if !home.trim().is_empty() => Ok(EntryState::Installed {
            home: home.trim().to_string(),
        }),
        Ok(_) => Ok(EntryState::Abandoned),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            if entry_dir.exists() {
                Ok(EntryState::Abandoned)
            } else {
                Ok(EntryState::Absent)
            }
        }
        Err(err) => Err(WrapperError::installation(
            entry_dir,
            format!("cannot read {}: {err}", marker.display()),
        )),
    }
}

/// Turns verified archives into installed distributions under the
/// distribution root, one extractor per cache entry at a time.
#[derive(Debug, Clone)]
pub struct Installer {
    roots: StorageRoots,
    lock_wait: LockWait,
}

impl Installer {
    pub fn new(roots: StorageRoots, lock_wait: LockWait) -> Self {
        Self { roots, lock_wait }
    }

    pub fn roots(&self) -> &StorageRoots {
        &self.roots
    }

    /// Looks up a completed install without taking the entry lock.
    pub fn installed(
        &self,
        url: &Url,
        spec: &DistributionSpec,
    ) -> WrapperResult<Option<InstalledDistribution>> {
        let entry = CacheEntry::for_url(url)?;
        let entry_dir = entry.entry_dir(&self.roots.root(spec.distribution()));
        match probe(&entry_dir)? {
            EntryState::Installed { home } => Ok(Some(InstalledDistribution {
                home_dir: entry_dir.join(home),
                entry_dir,
                freshly_installed: false,
            })),
            EntryState::Absent | EntryState::Abandoned => Ok(None),
        }
    }

    pub fn install(
        &self,
        artifact: &VerifiedArtifact,
        spec: &DistributionSpec,
    ) -> WrapperResult<InstalledDistribution> {
        if let Some(expected) = &artifact.expected_sha256 {
            if !sha256_matches(expected, &artifact.observed_sha256) {
                return Err(WrapperError::Integrity {
                    url: artifact.url.to_string(),
                    expected: expected.clone(),
                    actual: artifact.observed_sha256.clone(),
                });
            }
        }

        let entry = CacheEntry::for_url(&artifact.url)?;
        let root = self.roots.root(spec.distribution());
        let entry_dir = entry.entry_dir(&root);

        let _lock = EntryLock::acquire(&entry.lock_path(&root), self.lock_wait)?;

        match probe(&entry_dir)? {
            EntryState::Installed { home } => {
                tracing::debug!(path = %entry_dir.display(), "distribution already installed");
                return Ok(InstalledDistribution {
                    home_dir: entry_dir.join(home),
                    entry_dir,
                    freshly_installed: false,
                });
            }
            EntryState::Abandoned => {
                tracing::warn!(
                    path = %entry_dir.display(),
                    "removing incomplete install left by an earlier run"
                );
                remove_dir_if_exists(&entry_dir).map_err(|err| {
                    WrapperError::io(format!("failed to remove {}", entry_dir.display()), err)
                })?;
            }
            EntryState::Absent => {}
        }

        remove_stale_temp_dirs(&entry, &root)?;

        let temp_dir = entry.temp_dir(&root, &unique_suffix());
        match extract_into(&artifact.path, &temp_dir, &entry_dir) {
            Ok(home) => {
                tracing::info!(path = %entry_dir.display(), "installed distribution");
                Ok(InstalledDistribution {
                    home_dir: entry_dir.join(home),
                    entry_dir,
                    freshly_installed: true,
                })
            }
            Err(err) => {
                let _ = remove_dir_if_exists(&temp_dir);
                Err(err)
            }
        }
    }
}

// Holders of the entry lock are the only writers of `.<hash>.tmp-*`, so any
// such directory seen under the lock belongs to a dead process.
fn remove_stale_temp_dirs(entry: &CacheEntry, root: &Path) -> WrapperResult<()> {
    let group_dir = entry.group_dir(root);
    let prefix = entry.temp_prefix();
    let Ok(listing) = fs::read_dir(&group_dir) else {
        return Ok(());
    };
    for item in listing.flatten() {
        let is_stale = item
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix));
        if is_stale {
            tracing::debug!(path = %item.path().display(), "removing stale temporary install");
            remove_dir_if_exists(&item.path()).map_err(|err| {
                WrapperError::io(format!("failed to remove {}", item.path().display()), err)
            })?;
        }
    }
    Ok(())
}

fn extract_into(archive: &Path, temp_dir: &Path, entry_dir: &Path) -> WrapperResult<String> {
    fs::create_dir_all(temp_dir)
        .map_err(|err| WrapperError::io(format!("failed to create {}", temp_dir.display()), err))?;
    extract_zip(archive, temp_dir)?;

    let home = single_top_level_dir(temp_dir)?;
    make_launcher_executable(&temp_dir.join(&home))?;

    let marker = temp_dir.join(COMPLETE_MARKER);
    fs::write(&marker, format!("{home}\n"))
        .map_err(|err| WrapperError::io(format!("failed to write {}", marker.display()), err))?;

    fs::rename(temp_dir, entry_dir).map_err(|err| {
        WrapperError::installation(entry_dir, format!("cannot move extracted files into place: {err}"))
    })?;
    Ok(home)
}

fn single_top_level_dir(dir: &Path) -> WrapperResult<String> {
    let listing = fs::read_dir(dir)
        .map_err(|err| WrapperError::io(format!("failed to read {}", dir.display()), err))?;
    let mut names = Vec::new();
    for item in listing {
        let item =
            item.map_err(|err| WrapperError::io(format!("failed to read {}", dir.display()), err))?;
        names.push((item.file_name(), item.path().is_dir()));
    }

    match names.as_slice() {
        [(name, true)] => name.to_str().map(str::to_string).ok_or_else(|| {
            WrapperError::installation(dir, "distribution directory name is not valid UTF-8")
        }),
        _ => Err(WrapperError::installation(
            dir,
            format!(
                "expected exactly one top-level directory in the archive, found {} entries",
                names.len()
            ),
        )),
    }
}

fn make_launcher_executable(home: &Path) -> WrapperResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let launcher = home.join("bin").join("gradle");
        if let Ok(metadata) = fs::metadata(&launcher) {
            let mut permissions = metadata.permissions();
            permissions.set_mode(permissions.mode() | 0o755);
            fs::set_permissions(&launcher, permissions).map_err(|err| {
                WrapperError::io(format!("failed to chmod {}", launcher.display()), err)
            })?;
        }
    }
    #[cfg(not(unix))]
    let _ = home;
    Ok(())
}
