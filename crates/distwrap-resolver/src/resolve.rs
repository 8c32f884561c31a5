use std::time::Duration;

use distwrap_core::{
    keys, parse_distribution_file_name, url_file_name, DistributionSpec, DistributionType,
    PathBase, Properties, StorageLocation, WrapperError, WrapperResult, DEFAULT_DISTRIBUTION_PATH,
    DEFAULT_DISTRIBUTION_VERSION,
};
use distwrap_security::is_sha256_hex;

use crate::config::ConfigProperties;
use crate::types::Overrides;

/// Merges the persisted wrapper properties, configuration properties and
/// command-line overrides into one immutable spec.
///
/// Precedence is override, then persisted value, then configuration
/// property, then built-in default. A persisted `distributionUrl` (and the
/// checksum that belongs to it) is only kept while the command line leaves
/// the URL, version and type alone.
pub fn resolve(
    persisted: &Properties,
    config: &ConfigProperties,
    overrides: &Overrides,
) -> WrapperResult<DistributionSpec> {
    let persisted_url = non_blank(persisted.get(keys::DISTRIBUTION_URL));

    let (url, url_is_persisted) = match &overrides.url {
        Some(url) => (Some(validate_absolute_url("dist-url", url)?), false),
        None if overrides.changes_identity() => {
            if persisted_url.is_some() {
                tracing::debug!("dropping persisted distributionUrl for explicit version or type");
            }
            (None, false)
        }
        None => (persisted_url.map(str::to_string), persisted_url.is_some()),
    };

    let from_url = url
        .as_deref()
        .and_then(url_file_name)
        .and_then(parse_distribution_file_name);

    let version = match &overrides.version {
        Some(version) => validate_version("dist-version", version)?,
        None => from_url
            .as_ref()
            .map(|name| name.version.clone())
            .or_else(|| config.version().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_DISTRIBUTION_VERSION.to_string()),
    };

    let distribution_type = match overrides.distribution_type {
        Some(distribution_type) => distribution_type,
        None => match &from_url {
            Some(name) => name.distribution_type,
            None => config.distribution_type()?.unwrap_or(DistributionType::Bin),
        },
    };

    let sha256 = match &overrides.sha256 {
        Some(sha256) => Some(validate_sha256("dist-sha256", sha256)?),
        None if url_is_persisted => non_blank(persisted.get(keys::DISTRIBUTION_SHA256_SUM))
            .map(|sha256| validate_sha256(keys::DISTRIBUTION_SHA256_SUM, sha256))
            .transpose()?,
        None => None,
    };

    let distribution =
        storage_location(persisted, keys::DISTRIBUTION_BASE, keys::DISTRIBUTION_PATH)?;
    let archive = storage_location(persisted, keys::ZIP_STORE_BASE, keys::ZIP_STORE_PATH)?;
    let network_timeout = non_blank(persisted.get(keys::NETWORK_TIMEOUT))
        .map(parse_network_timeout)
        .transpose()?;

    let spec = DistributionSpec::new(version, distribution_type)
        .with_url(url)
        .with_sha256(sha256)
        .with_distribution(distribution)
        .with_archive(archive)
        .with_network_timeout(network_timeout);

    tracing::debug!(
        version = spec.version(),
        distribution_type = %spec.distribution_type(),
        url = spec.url().unwrap_or("<template>"),
        checksum = spec.sha256().is_some(),
        "resolved distribution"
    );
    Ok(spec)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn storage_location(
    persisted: &Properties,
    base_key: &str,
    path_key: &str,
) -> WrapperResult<StorageLocation> {
    let base = match non_blank(persisted.get(base_key)) {
        Some(value) => PathBase::parse(base_key, value)?,
        None => PathBase::GradleUserHome,
    };
    let path = non_blank(persisted.get(path_key)).unwrap_or(DEFAULT_DISTRIBUTION_PATH);
    Ok(StorageLocation::new(base, path))
}

fn validate_absolute_url(key: &str, raw: &str) -> WrapperResult<String> {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(parsed) if !parsed.cannot_be_a_base() => Ok(trimmed.to_string()),
        _ => Err(WrapperError::configuration(key, raw, "an absolute URL")),
    }
}

fn validate_version(key: &str, raw: &str) -> WrapperResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(WrapperError::configuration(
            key,
            raw,
            "a non-empty version without whitespace",
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_sha256(key: &str, raw: &str) -> WrapperResult<String> {
    if !is_sha256_hex(raw) {
        return Err(WrapperError::configuration(
            key,
            raw,
            "a SHA-256 checksum of 64 hex digits",
        ));
    }
    Ok(raw.trim().to_string())
}

fn parse_network_timeout(raw: &str) -> WrapperResult<Duration> {
    raw.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            WrapperError::configuration(keys::NETWORK_TIMEOUT, raw, "a timeout in milliseconds")
        })
}
