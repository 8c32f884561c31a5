use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use distwrap_core::{WrapperError, WrapperResult};
use distwrap_repository::{Coordinate, ResolvedArtifact};
use distwrap_security::{sha256_file, sha256_matches, HashingWriter};
use url::Url;

use crate::fs_utils::{partial_sibling, remove_file_if_exists};

/// Receives download progress. Every method has a no-op default.
pub trait DownloadProgress {
    fn started(&self, _url: &Url, _total_bytes: Option<u64>) {}

    fn advanced(&self, _bytes: u64) {}

    fn finished(&self) {}
}

pub struct NoProgress;

impl DownloadProgress for NoProgress {}

/// An archive on disk together with the hash observed while writing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArtifact {
    pub path: PathBuf,
    pub url: Url,
    pub observed_sha256: String,
    pub expected_sha256: Option<String>,
}

impl VerifiedArtifact {
    pub fn is_verified(&self) -> bool {
        self.expected_sha256
            .as_deref()
            .is_some_and(|expected| sha256_matches(expected, &self.observed_sha256))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub url: &'a Url,
    pub expected_sha256: Option<&'a str>,
    pub destination: &'a Path,
    /// Coordinate the URL was derived from, when it came from a template.
    pub coordinate: Option<&'a Coordinate>,
    /// Artifact a resolver already holds; used only when it was resolved for
    /// exactly `coordinate`.
    pub pre_resolved: Option<&'a ResolvedArtifact>,
}

pub struct Downloader {
    client: reqwest::blocking::Client,
    progress: Box<dyn DownloadProgress>,
}

impl Downloader {
    pub fn new(network_timeout: Option<Duration>) -> WrapperResult<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = network_timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| WrapperError::download("<client>", err))?;
        Ok(Self {
            client,
            progress: Box::new(NoProgress),
        })
    }

    pub fn with_progress(mut self, progress: Box<dyn DownloadProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Makes the archive available at `request.destination` and verifies it.
    ///
    /// Nothing is ever left at the destination whose hash differs from the
    /// expected checksum.
    pub fn fetch(&self, request: &FetchRequest<'_>) -> WrapperResult<VerifiedArtifact> {
        let url = request.url;
        let destination = request.destination;
        let expected = request.expected_sha256.map(|sha| sha.trim().to_ascii_lowercase());

        if let Some(artifact) = matching_pre_resolved(request) {
            tracing::debug!(
                coordinate = %artifact.coordinate,
                path = %artifact.path.display(),
                "using artifact held by resolver"
            );
            let expected = expected.or_else(|| Some(artifact.sha256.to_ascii_lowercase()));
            let source = File::open(&artifact.path).map_err(|err| {
                WrapperError::io(format!("failed to open {}", artifact.path.display()), err)
            })?;
            return self.store(url, source, None, destination, expected);
        }

        if destination.is_file() {
            let existing = sha256_file(destination).map_err(|err| {
                WrapperError::io(format!("failed to hash {}", destination.display()), err)
            })?;
            match &expected {
                Some(sha) if !sha256_matches(sha, &existing) => {
                    tracing::warn!(
                        path = %destination.display(),
                        "cached archive does not match the expected checksum; downloading again"
                    );
                    remove_file_if_exists(destination).map_err(|err| {
                        WrapperError::io(format!("failed to remove {}", destination.display()), err)
                    })?;
                }
                _ => {
                    tracing::debug!(path = %destination.display(), "reusing downloaded archive");
                    warn_if_unverified(url, expected.as_deref());
                    return Ok(VerifiedArtifact {
                        path: destination.to_path_buf(),
                        url: url.clone(),
                        observed_sha256: existing,
                        expected_sha256: expected,
                    });
                }
            }
        }

        tracing::info!(%url, "downloading distribution");
        match url.scheme() {
            "file" => {
                let source_path = url
                    .to_file_path()
                    .map_err(|()| WrapperError::download(url.as_str(), "not a local file path"))?;
                let source = File::open(&source_path)
                    .map_err(|err| WrapperError::download(url.as_str(), err))?;
                let total = source.metadata().ok().map(|metadata| metadata.len());
                self.store(url, source, total, destination, expected)
            }
            "http" | "https" => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .and_then(|response| response.error_for_status())
                    .map_err(|err| WrapperError::download(url.as_str(), err))?;
                let total = response.content_length();
                self.store(url, response, total, destination, expected)
            }
            scheme => Err(WrapperError::download(
                url.as_str(),
                format!("unsupported URL scheme '{scheme}'"),
            )),
        }
    }

    fn store(
        &self,
        url: &Url,
        source: impl Read,
        total_bytes: Option<u64>,
        destination: &Path,
        expected: Option<String>,
    ) -> WrapperResult<VerifiedArtifact> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                WrapperError::io(format!("failed to create {}", parent.display()), err)
            })?;
        }

        let partial = partial_sibling(destination);
        let streamed = self.stream_to(url, source, total_bytes, &partial);
        let observed = match streamed {
            Ok(observed) => observed,
            Err(err) => {
                let _ = remove_file_if_exists(&partial);
                return Err(err);
            }
        };

        if let Some(expected) = &expected {
            if !sha256_matches(expected, &observed) {
                let _ = remove_file_if_exists(&partial);
                return Err(WrapperError::Integrity {
                    url: url.to_string(),
                    expected: expected.clone(),
                    actual: observed,
                });
            }
        }
        warn_if_unverified(url, expected.as_deref());

        if let Err(err) = fs::rename(&partial, destination) {
            let _ = remove_file_if_exists(&partial);
            return Err(WrapperError::io(
                format!("failed to move archive to {}", destination.display()),
                err,
            ));
        }

        Ok(VerifiedArtifact {
            path: destination.to_path_buf(),
            url: url.clone(),
            observed_sha256: observed,
            expected_sha256: expected,
        })
    }

    fn stream_to(
        &self,
        url: &Url,
        source: impl Read,
        total_bytes: Option<u64>,
        partial: &Path,
    ) -> WrapperResult<String> {
        let file = File::create(partial)
            .map_err(|err| WrapperError::io(format!("failed to create {}", partial.display()), err))?;
        let mut writer = HashingWriter::new(file);
        let mut reader = ProgressReader {
            inner: source,
            progress: self.progress.as_ref(),
        };

        self.progress.started(url, total_bytes);
        let copied = io::copy(&mut reader, &mut writer);
        self.progress.finished();
        copied.map_err(|err| WrapperError::download(url.as_str(), err))?;

        let (file, observed) = writer.finish();
        file.sync_all()
            .map_err(|err| WrapperError::io(format!("failed to flush {}", partial.display()), err))?;
        Ok(observed)
    }
}

fn matching_pre_resolved<'a>(request: &FetchRequest<'a>) -> Option<&'a ResolvedArtifact> {
    let artifact = request.pre_resolved?;
    match request.coordinate {
        Some(coordinate) if *coordinate == artifact.coordinate => Some(artifact),
        _ => {
            tracing::debug!(
                coordinate = %artifact.coordinate,
                "ignoring resolved artifact for a different coordinate"
            );
            None
        }
    }
}

fn warn_if_unverified(url: &Url, expected: Option<&str>) {
    if expected.is_none() {
        tracing::warn!(
            %url,
            "no distributionSha256Sum configured; the distribution was not verified"
        );
    }
}

struct ProgressReader<'a, R> {
    inner: R,
    progress: &'a dyn DownloadProgress,
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.progress.advanced(n as u64);
        Ok(n)
    }
}
