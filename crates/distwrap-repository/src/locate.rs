use std::fmt;

use distwrap_core::{DistributionSpec, DistributionType, WrapperError, WrapperResult};
use url::Url;

use crate::descriptor::RepositoryDescriptor;

/// Revision that asks a resolver for the highest available version.
pub const LATEST_REVISION: &str = "+";

const ARCHIVE_EXTENSION: &str = "zip";

/// Synthetic dependency coordinate of a distribution archive, printed as
/// `organization:artifact:revision@ext` (for example `gradle:bin:8.5@zip`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub organization: String,
    pub revision: String,
    pub artifact: String,
    pub ext: String,
}

impl Coordinate {
    pub fn new(
        repo: &RepositoryDescriptor,
        revision: impl Into<String>,
        distribution_type: DistributionType,
    ) -> Self {
        Self {
            organization: repo.organization(),
            revision: revision.into(),
            artifact: distribution_type.as_str().to_string(),
            ext: ARCHIVE_EXTENSION.to_string(),
        }
    }

    pub fn is_latest(&self) -> bool {
        self.revision == LATEST_REVISION
    }

    pub fn with_revision(&self, revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}@{}",
            self.organization, self.artifact, self.revision, self.ext
        )
    }
}

/// Builds the coordinate the template URL is derived from.
pub fn coordinate(spec: &DistributionSpec, repo: &RepositoryDescriptor) -> Coordinate {
    Coordinate::new(repo, spec.version(), spec.distribution_type())
}

/// Turns a resolved distribution into the URL of the archive to fetch.
///
/// An explicit absolute URL on the distribution is returned verbatim. Otherwise the
/// repository pattern is expanded with the distribution coordinate and joined onto
/// the repository base URL.
pub fn locate(spec: &DistributionSpec, repo: &RepositoryDescriptor) -> WrapperResult<Url> {
    if let Some(raw) = spec.url() {
        return match Url::parse(raw) {
            Ok(url) if !url.cannot_be_a_base() => Ok(url),
            _ => Err(WrapperError::RepositoryResolution(format!(
                "distribution URL '{raw}' is not absolute"
            ))),
        };
    }

    validate_template_version(spec.version())?;
    let coordinate = coordinate(spec, repo);
    let relative = expand_pattern(repo.pattern(), &coordinate)?;
    let url = repo
        .base_url()
        .join(relative.trim_start_matches('/'))
        .map_err(|err| {
            WrapperError::RepositoryResolution(format!(
                "cannot join '{relative}' onto {}: {err}",
                repo.base_url()
            ))
        })?;

    tracing::debug!(%coordinate, %url, "located distribution");
    Ok(url)
}

/// Substitutes `[name]` or `{name}` placeholders in an artifact pattern.
///
/// Known names are `organization`, `revision`, `artifact` and `ext`; any
/// other placeholder, or an unterminated one, is an error.
pub fn expand_pattern(pattern: &str, coordinate: &Coordinate) -> WrapperResult<String> {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut rest = pattern;

    while let Some(open_index) = rest.find(['[', '{']) {
        out.push_str(&rest[..open_index]);
        let close = if rest.as_bytes()[open_index] == b'[' {
            ']'
        } else {
            '}'
        };
        let after_open = &rest[open_index + 1..];
        let Some(close_index) = after_open.find(close) else {
            return Err(WrapperError::RepositoryResolution(format!(
                "unterminated placeholder in pattern '{pattern}'"
            )));
        };

        let name = &after_open[..close_index];
        let value = match name {
            "organization" => &coordinate.organization,
            "revision" => &coordinate.revision,
            "artifact" => &coordinate.artifact,
            "ext" => &coordinate.ext,
            _ => {
                return Err(WrapperError::RepositoryResolution(format!(
                    "unknown placeholder '{name}' in pattern '{pattern}'"
                )))
            }
        };
        out.push_str(value);
        rest = &after_open[close_index + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

// Pre-release and dasherized custom versions have no agreed mapping into the
// repository pattern yet, so they must be passed as an explicit URL.
fn validate_template_version(version: &str) -> WrapperResult<()> {
    if version.is_empty() {
        return Err(WrapperError::RepositoryResolution(
            "distribution version is empty".to_string(),
        ));
    }
    if version == LATEST_REVISION {
        return Err(WrapperError::RepositoryResolution(
            "the latest revision must be resolved before locating a distribution".to_string(),
        ));
    }
    if version.contains('-') {
        return Err(WrapperError::RepositoryResolution(format!(
            "version '{version}' is a pre-release or dasherized version; pass --dist-url instead"
        )));
    }
    if version.contains(['/', '\\']) || version.contains(char::is_whitespace) {
        return Err(WrapperError::RepositoryResolution(format!(
            "version '{version}' contains characters that are not allowed in a URL segment"
        )));
    }
    Ok(())
}
