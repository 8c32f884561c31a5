use std::path::Path;

use distwrap_core::{
    keys, read_properties_file, DistributionType, Properties, WrapperError, WrapperResult,
};

/// Read-only configuration properties layered from the project, the Gradle
/// user home and the command line, later sources winning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigProperties {
    values: Properties,
}

impl ConfigProperties {
    pub fn new(values: Properties) -> Self {
        Self { values }
    }

    pub fn load(
        project_dir: &Path,
        gradle_user_home: &Path,
        command_line: &[(String, String)],
    ) -> WrapperResult<Self> {
        let mut values = Properties::new();
        for source in [
            project_dir.join(keys::CONFIG_PROPERTIES_FILE),
            gradle_user_home.join(keys::CONFIG_PROPERTIES_FILE),
        ] {
            if let Some(found) = read_properties_file(&source)? {
                tracing::debug!(
                    path = %source.display(),
                    entries = found.len(),
                    "loaded configuration properties"
                );
                values.extend_from(&found);
            }
        }
        for (key, value) in command_line {
            values.set(key.as_str(), value.as_str());
        }
        Ok(Self { values })
    }

    pub fn properties(&self) -> &Properties {
        &self.values
    }

    /// Returns the trimmed value, treating blank values as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn vendor_name(&self) -> Option<&str> {
        self.get(keys::VENDOR_NAME)
    }

    pub fn repository_url(&self) -> Option<&str> {
        self.get(keys::REPOSITORY_URL)
    }

    pub fn repository_pattern(&self) -> Option<&str> {
        self.get(keys::REPOSITORY_PATTERN)
    }

    pub fn version(&self) -> Option<&str> {
        self.get(keys::DISTRIBUTION_VERSION)
    }

    pub fn distribution_type(&self) -> WrapperResult<Option<DistributionType>> {
        self.get(keys::DISTRIBUTION_TYPE)
            .map(|value| DistributionType::parse(keys::DISTRIBUTION_TYPE, value))
            .transpose()
    }
}

/// Parses a `-P key=value` assignment.
pub fn parse_property_assignment(raw: &str) -> WrapperResult<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(WrapperError::configuration(
            "property",
            raw,
            "an assignment of the form key=value",
        ));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(WrapperError::configuration(
            "property",
            raw,
            "a non-empty key before '='",
        ));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
