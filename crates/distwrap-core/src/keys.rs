//! Property keys understood by the wrapper.
//!
//! The first group lives in `gradle/wrapper/gradle-wrapper.properties` and is
//! rewritten by the `wrapper` command. The second group is read-only
//! configuration coming from `gradle.properties` files or `-P` flags.

pub const DISTRIBUTION_BASE: &str = "distributionBase";
pub const DISTRIBUTION_PATH: &str = "distributionPath";
pub const DISTRIBUTION_URL: &str = "distributionUrl";
pub const DISTRIBUTION_SHA256_SUM: &str = "distributionSha256Sum";
pub const ZIP_STORE_BASE: &str = "zipStoreBase";
pub const ZIP_STORE_PATH: &str = "zipStorePath";
pub const NETWORK_TIMEOUT: &str = "networkTimeout";

pub const REPOSITORY_PATTERN: &str = "org.gradle.distribution.custom.repository.pattern";
pub const REPOSITORY_URL: &str = "org.gradle.distribution.custom.repository.url";
pub const DISTRIBUTION_TYPE: &str = "org.gradle.distribution.type";
pub const VENDOR_NAME: &str = "org.gradle.distribution.custom.vendor.name";
pub const DISTRIBUTION_VERSION: &str = "org.gradle.distribution.custom.version";

pub const PROPERTIES_FILE: &str = "gradle/wrapper/gradle-wrapper.properties";
pub const CONFIG_PROPERTIES_FILE: &str = "gradle.properties";
