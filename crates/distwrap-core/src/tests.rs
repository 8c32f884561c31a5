use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use super::*;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "distwrap-core-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    path
}

#[test]
fn distribution_type_parses_case_insensitively() {
    assert_eq!(
        DistributionType::parse("dist-type", "bin").expect("bin must parse"),
        DistributionType::Bin
    );
    assert_eq!(
        DistributionType::parse("dist-type", " ALL ").expect("ALL must parse"),
        DistributionType::All
    );
    assert_eq!(DistributionType::All.to_string(), "ALL");
    assert_eq!(DistributionType::All.as_str(), "all");
}

#[test]
fn distribution_type_rejects_unknown_value_naming_key() {
    let err = DistributionType::parse("org.gradle.distribution.type", "src")
        .expect_err("src is not a distribution type");
    match &err {
        WrapperError::Configuration { key, value, expected } => {
            assert_eq!(key, "org.gradle.distribution.type");
            assert_eq!(value, "src");
            assert!(expected.contains("BIN"));
            assert!(expected.contains("ALL"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("org.gradle.distribution.type"));
}

#[test]
fn path_base_parses_case_insensitively() {
    assert_eq!(
        PathBase::parse(keys::DISTRIBUTION_BASE, "gradle_user_home").expect("must parse"),
        PathBase::GradleUserHome
    );
    assert_eq!(
        PathBase::parse(keys::ZIP_STORE_BASE, "Project").expect("must parse"),
        PathBase::Project
    );
    assert!(PathBase::parse(keys::ZIP_STORE_BASE, "HOME").is_err());
}

#[test]
fn parse_distribution_file_name_handles_default_and_vendor_names() {
    let plain = parse_distribution_file_name("gradle-8.5-bin.zip").expect("must parse");
    assert_eq!(plain.vendor, None);
    assert_eq!(plain.version, "8.5");
    assert_eq!(plain.distribution_type, DistributionType::Bin);

    let vendor = parse_distribution_file_name("acme-gradle-7.6.1-all.zip").expect("must parse");
    assert_eq!(vendor.vendor.as_deref(), Some("acme"));
    assert_eq!(vendor.version, "7.6.1");
    assert_eq!(vendor.distribution_type, DistributionType::All);

    let dashed = parse_distribution_file_name("gradle-8.6-rc-1-bin.zip").expect("must parse");
    assert_eq!(dashed.version, "8.6-rc-1");
}

#[test]
fn parse_distribution_file_name_rejects_foreign_names() {
    assert!(parse_distribution_file_name("gradle-8.5-bin.tar.gz").is_none());
    assert!(parse_distribution_file_name("gradle-8.5-src.zip").is_none());
    assert!(parse_distribution_file_name("maven-3.9-bin.zip").is_none());
    assert!(parse_distribution_file_name("gradle--bin.zip").is_none());
}

#[test]
fn url_file_name_strips_query_and_fragment() {
    assert_eq!(
        url_file_name("https://example.test/dists/gradle-8.5-bin.zip?token=1#frag"),
        Some("gradle-8.5-bin.zip")
    );
    assert_eq!(url_file_name("https://example.test/dists/"), None);
}

#[test]
fn spec_defaults_store_under_gradle_user_home() {
    let spec = DistributionSpec::new("8.5", DistributionType::Bin);
    assert_eq!(spec.archive(), &StorageLocation::default());
    assert_eq!(spec.distribution().base, PathBase::GradleUserHome);
    assert_eq!(spec.distribution().path, DEFAULT_DISTRIBUTION_PATH);
    assert!(spec.url().is_none());
    assert!(spec.sha256().is_none());
}

#[test]
fn parse_properties_handles_escapes_comments_and_separators() {
    let raw = concat!(
        "# generated\n",
        "! also a comment\n",
        "distributionBase=GRADLE_USER_HOME\n",
        "distributionPath : wrapper/dists\n",
        "distributionUrl=https\\://services.gradle.org/distributions/gradle-8.5-bin.zip\n",
        "zipStoreBase GRADLE_USER_HOME\n",
        "   zipStorePath=wrapper/\\\n",
        "      dists\n",
        "unicode=caf\\u00e9\n",
    );

    let properties = Properties::parse(raw);
    assert_eq!(properties.len(), 6);
    assert_eq!(properties.get(keys::DISTRIBUTION_PATH), Some("wrapper/dists"));
    assert_eq!(
        properties.get(keys::DISTRIBUTION_URL),
        Some("https://services.gradle.org/distributions/gradle-8.5-bin.zip")
    );
    assert_eq!(properties.get(keys::ZIP_STORE_BASE), Some("GRADLE_USER_HOME"));
    assert_eq!(properties.get(keys::ZIP_STORE_PATH), Some("wrapper/dists"));
    assert_eq!(properties.get("unicode"), Some("café"));
}

#[test]
fn serialize_escapes_separators_in_values() {
    let mut properties = Properties::new();
    properties.set(keys::DISTRIBUTION_BASE, "GRADLE_USER_HOME");
    properties.set(
        keys::DISTRIBUTION_URL,
        "https://services.gradle.org/distributions/gradle-8.5-bin.zip",
    );

    let raw = properties.serialize();
    assert_eq!(
        raw,
        "distributionBase=GRADLE_USER_HOME\ndistributionUrl=https\\://services.gradle.org/distributions/gradle-8.5-bin.zip\n"
    );
    assert_eq!(Properties::parse(&raw), properties);
}

#[test]
fn set_replaces_in_place_and_keeps_order() {
    let mut properties: Properties = [("a", "1"), ("b", "2")].into_iter().collect();
    properties.set("a", "3");
    properties.set("c", "4");
    let keys: Vec<_> = properties.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
    assert_eq!(properties.get("a"), Some("3"));
    assert_eq!(properties.remove("b").as_deref(), Some("2"));
    assert!(properties.get("b").is_none());
}

#[test]
fn read_properties_file_returns_none_for_new_project() {
    let dir = test_dir();
    let missing = dir.join(keys::PROPERTIES_FILE);
    let read = read_properties_file(&missing).expect("missing file is not an error");
    assert!(read.is_none());
}

#[test]
fn write_then_read_properties_file_replaces_previous_content() {
    let dir = test_dir();
    let path = dir.join(keys::PROPERTIES_FILE);

    let mut long = Properties::new();
    long.set(keys::DISTRIBUTION_URL, "https://example.test/a-very-long-url/gradle-8.5-all.zip");
    long.set(keys::DISTRIBUTION_SHA256_SUM, "ab".repeat(32));
    write_properties_file(&path, &long).expect("must write first version");

    let mut short = Properties::new();
    short.set(keys::DISTRIBUTION_URL, "https://e.test/gradle-8.5-bin.zip");
    write_properties_file(&path, &short).expect("must rewrite");

    let read = read_properties_file(&path)
        .expect("must read")
        .expect("file must exist");
    assert_eq!(read, short);

    let _ = std::fs::remove_dir_all(&dir);
}
