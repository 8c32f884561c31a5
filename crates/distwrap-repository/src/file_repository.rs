use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use distwrap_core::{WrapperError, WrapperResult};
use distwrap_security::{is_sha256_hex, sha256_file};

use crate::descriptor::RepositoryDescriptor;
use crate::locate::{expand_pattern, Coordinate};
use crate::version::{compare_versions, is_stable_version};

const REVISION_SENTINEL: &str = "\u{0}";

/// An archive a dependency resolver already holds locally, with the checksum
/// it vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub coordinate: Coordinate,
    pub path: PathBuf,
    pub sha256: String,
}

/// Seam for an external dependency-resolution engine.
///
/// `Ok(None)` means the coordinate is not published by this resolver; errors
/// are reserved for repositories that exist but cannot be read.
pub trait ArtifactResolver {
    fn resolve(&self, coordinate: &Coordinate) -> WrapperResult<Option<ResolvedArtifact>>;
}

/// Resolves coordinates against a local directory laid out by the repository
/// pattern, such as a `file://` mirror of the distribution server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRepository {
    root: PathBuf,
    pattern: String,
}

impl FileRepository {
    pub fn new(root: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            pattern: pattern.into(),
        }
    }

    /// Returns a file repository when the descriptor points at a `file://`
    /// base URL.
    pub fn from_descriptor(repo: &RepositoryDescriptor) -> Option<Self> {
        if repo.base_url().scheme() != "file" {
            return None;
        }
        let root = repo.base_url().to_file_path().ok()?;
        Some(Self::new(root, repo.pattern()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn latest_revision(&self, coordinate: &Coordinate) -> WrapperResult<Option<String>> {
        let probe = expand_pattern(&self.pattern, &coordinate.with_revision(REVISION_SENTINEL))?;
        let (dir, file_pattern) = probe.rsplit_once('/').unwrap_or(("", probe.as_str()));
        if dir.contains(REVISION_SENTINEL) {
            return Err(WrapperError::RepositoryResolution(format!(
                "cannot list revisions for pattern '{}': [revision] must only appear in the file name",
                self.pattern
            )));
        }
        let Some((prefix, suffix)) = file_pattern.split_once(REVISION_SENTINEL) else {
            return Err(WrapperError::RepositoryResolution(format!(
                "cannot list revisions for pattern '{}': it has no [revision] placeholder",
                self.pattern
            )));
        };

        let listing_dir = self.root.join(dir);
        let entries = match fs::read_dir(&listing_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(WrapperError::io(
                    format!("failed to list {}", listing_dir.display()),
                    err,
                ))
            }
        };

        let mut latest: Option<String> = None;
        for entry in entries {
            let entry = entry.map_err(|err| {
                WrapperError::io(format!("failed to list {}", listing_dir.display()), err)
            })?;
            let file_name = entry.file_name();
            let Some(candidate) = file_name
                .to_str()
                .and_then(|name| name.strip_prefix(prefix))
                .and_then(|name| name.strip_suffix(suffix))
            else {
                continue;
            };
            if !is_stable_version(candidate) {
                continue;
            }
            let newer = latest
                .as_deref()
                .map_or(true, |current| compare_versions(candidate, current).is_gt());
            if newer {
                latest = Some(candidate.to_string());
            }
        }
        Ok(latest)
    }
}

impl ArtifactResolver for FileRepository {
    fn resolve(&self, coordinate: &Coordinate) -> WrapperResult<Option<ResolvedArtifact>> {
        let coordinate = if coordinate.is_latest() {
            match self.latest_revision(coordinate)? {
                Some(revision) => coordinate.with_revision(revision),
                None => return Ok(None),
            }
        } else {
            coordinate.clone()
        };

        let relative = expand_pattern(&self.pattern, &coordinate)?;
        let path = self.root.join(relative.trim_start_matches('/'));
        if !path.is_file() {
            tracing::debug!(%coordinate, path = %path.display(), "artifact not in file repository");
            return Ok(None);
        }

        let sha256 = match read_checksum_sidecar(&path)? {
            Some(sha256) => sha256,
            None => sha256_file(&path)
                .map_err(|err| WrapperError::io(format!("failed to hash {}", path.display()), err))?,
        };

        Ok(Some(ResolvedArtifact {
            coordinate,
            path,
            sha256,
        }))
    }
}

fn read_checksum_sidecar(artifact: &Path) -> WrapperResult<Option<String>> {
    let mut sidecar = artifact.as_os_str().to_owned();
    sidecar.push(".sha256");
    let sidecar = PathBuf::from(sidecar);

    let raw = match fs::read_to_string(&sidecar) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(WrapperError::io(
                format!("failed to read {}", sidecar.display()),
                err,
            ))
        }
    };

    let token = raw.split_whitespace().next().unwrap_or("");
    if !is_sha256_hex(token) {
        return Err(WrapperError::RepositoryResolution(format!(
            "checksum file {} does not contain a SHA-256 digest",
            sidecar.display()
        )));
    }
    Ok(Some(token.to_ascii_lowercase()))
}
