use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use distwrap_core::{keys, DistributionSpec, DistributionType, PathBase, Properties};
use distwrap_installer::{InstalledDistribution, LockWait};
use url::Url;

use super::*;
use crate::completion::write_completions_script;
use crate::dispatch::{
    format_info_lines, lock_wait_from, overrides_from, resolve_gradle_user_home,
    wrapper_properties,
};
use crate::render::{format_elapsed, render_status_line, resolve_output_style, OutputStyle};
use crate::scripts::{render_unix_script, render_windows_script, write_launcher_scripts};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock must be after epoch")
        .as_nanos();
    let seq = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "distwrap-cli-tests-{}-{nanos}-{seq}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("must create test dir");
    dir
}

fn wrapper_args(cli: Cli) -> WrapperArgs {
    match cli.command {
        Commands::Wrapper(args) => args,
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_parses_wrapper_overrides() {
    let cli = Cli::try_parse_from([
        "distwrap",
        "wrapper",
        "--dist-type",
        "bin",
        "--dist-version",
        "8.5",
        "--dist-sha256",
        "abc",
        "--no-install",
    ])
    .expect("command must parse");

    let args = wrapper_args(cli);
    assert_eq!(args.dist_type, Some(DistributionType::Bin));
    assert_eq!(args.dist_version.as_deref(), Some("8.5"));
    assert_eq!(args.dist_sha256.as_deref(), Some("abc"));
    assert!(args.no_install);
    assert!(!args.self_update);
}

#[test]
fn cli_parses_dist_type_case_insensitively() {
    let cli = Cli::try_parse_from(["distwrap", "wrapper", "--dist-type", "ALL"])
        .expect("command must parse");
    assert_eq!(wrapper_args(cli).dist_type, Some(DistributionType::All));
}

#[test]
fn cli_rejects_unknown_dist_type() {
    let err = Cli::try_parse_from(["distwrap", "wrapper", "--dist-type", "src"])
        .expect_err("unknown type must fail");
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
    assert!(err.to_string().contains("dist-type"), "unexpected error: {err}");
}

#[test]
fn cli_rejects_self_update_with_explicit_version() {
    let err = Cli::try_parse_from([
        "distwrap",
        "wrapper",
        "--self-update",
        "--dist-version",
        "8.5",
    ])
    .expect_err("self update and a pinned version must conflict");
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn cli_rejects_self_update_with_pinned_checksum() {
    let err = Cli::try_parse_from([
        "distwrap",
        "wrapper",
        "--self-update",
        "--dist-sha256",
        "0000000000000000000000000000000000000000000000000000000000000000",
    ])
    .expect_err("self update cannot reuse a checksum for an unseen version");
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn cli_collects_global_properties_after_subcommand() {
    let cli = Cli::try_parse_from([
        "distwrap",
        "info",
        "-P",
        "org.gradle.distribution.type=all",
        "--property",
        "org.gradle.distribution.custom.vendor.name=acme",
        "--project-dir",
        "/work/app",
    ])
    .expect("command must parse");

    assert_eq!(
        cli.properties,
        vec![
            (
                "org.gradle.distribution.type".to_string(),
                "all".to_string()
            ),
            (
                "org.gradle.distribution.custom.vendor.name".to_string(),
                "acme".to_string()
            ),
        ]
    );
    assert_eq!(cli.project_dir, Some(PathBuf::from("/work/app")));
    assert!(matches!(cli.command, Commands::Info));
}

#[test]
fn cli_rejects_property_without_assignment() {
    let err = Cli::try_parse_from(["distwrap", "install", "-P", "novalue"])
        .expect_err("property without '=' must fail");
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
}

#[test]
fn cli_passes_run_arguments_through_verbatim() {
    let cli = Cli::try_parse_from(["distwrap", "run", "--", "build", "--info", "-x", "test"])
        .expect("command must parse");
    match cli.command {
        Commands::Run { args } => assert_eq!(
            args,
            ["build", "--info", "-x", "test"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        ),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_parses_completions_shell() {
    let cli = Cli::try_parse_from(["distwrap", "completions", "zsh"]).expect("command parses");
    match cli.command {
        Commands::Completions { shell } => assert_eq!(shell, clap_complete::Shell::Zsh),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn completions_script_mentions_binary_and_subcommands() {
    let mut out = Vec::new();
    write_completions_script(clap_complete::Shell::Bash, &mut out)
        .expect("must write completions");
    let script = String::from_utf8(out).expect("script must be utf-8");
    assert!(script.contains("distwrap"));
    assert!(script.contains("wrapper"));
    assert!(script.contains("--dist-version"));
}

#[test]
fn overrides_follow_wrapper_flags() {
    let args = WrapperArgs {
        dist_type: Some(DistributionType::All),
        dist_url: Some("https://example.com/gradle-8.7-all.zip".to_string()),
        ..WrapperArgs::default()
    };
    let overrides = overrides_from(&args);
    assert_eq!(overrides.distribution_type, Some(DistributionType::All));
    assert_eq!(
        overrides.url.as_deref(),
        Some("https://example.com/gradle-8.7-all.zip")
    );
    assert_eq!(overrides.version, None);
    assert_eq!(overrides.sha256, None);
}

#[test]
fn lock_wait_defaults_to_blocking() {
    assert_eq!(lock_wait_from(None), LockWait::Block);
    assert_eq!(
        lock_wait_from(Some(30)),
        LockWait::Timeout(Duration::from_secs(30))
    );
}

#[test]
fn gradle_user_home_prefers_flag_then_env_then_home() {
    let flag = Path::new("/flag/home");
    let home = Some(PathBuf::from("/users/me"));

    let resolved = resolve_gradle_user_home(
        Some(flag),
        Some(OsString::from("/env/home")),
        home.clone(),
    )
    .expect("flag must win");
    assert_eq!(resolved, PathBuf::from("/flag/home"));

    let resolved = resolve_gradle_user_home(None, Some(OsString::from("/env/home")), home.clone())
        .expect("env must win over home");
    assert_eq!(resolved, PathBuf::from("/env/home"));

    let resolved = resolve_gradle_user_home(None, Some(OsString::new()), home)
        .expect("empty env must fall back to home");
    assert_eq!(resolved, PathBuf::from("/users/me/.gradle"));

    let err = resolve_gradle_user_home(None, None, None).expect_err("nothing to fall back on");
    assert!(err.to_string().contains("GRADLE_USER_HOME"));
}

#[test]
fn wrapper_properties_for_fresh_project_use_wrapper_key_order() {
    let spec = DistributionSpec::new("8.5", DistributionType::Bin);
    let url = Url::parse("https://services.gradle.org/distributions/gradle-8.5-bin.zip")
        .expect("valid url");

    let written = wrapper_properties(&Properties::new(), &spec, &url);
    let keys_written: Vec<&str> = written.iter().map(|(key, _)| key).collect();
    assert_eq!(
        keys_written,
        vec![
            keys::DISTRIBUTION_BASE,
            keys::DISTRIBUTION_PATH,
            keys::DISTRIBUTION_URL,
            keys::ZIP_STORE_BASE,
            keys::ZIP_STORE_PATH,
        ]
    );
    assert_eq!(written.get(keys::DISTRIBUTION_BASE), Some("GRADLE_USER_HOME"));
    assert_eq!(written.get(keys::DISTRIBUTION_PATH), Some("wrapper/dists"));
    assert_eq!(written.get(keys::DISTRIBUTION_URL), Some(url.as_str()));

    let serialized = written.serialize();
    assert!(
        serialized.contains("distributionUrl=https\\://services.gradle.org/"),
        "colons must be escaped: {serialized}"
    );
}

#[test]
fn wrapper_properties_keep_unmanaged_keys_and_drop_stale_checksum() {
    let persisted: Properties = [
        (keys::DISTRIBUTION_BASE, "PROJECT"),
        (keys::DISTRIBUTION_PATH, "wrapper/dists"),
        (keys::DISTRIBUTION_SHA256_SUM, "0".repeat(64).as_str()),
        (
            keys::DISTRIBUTION_URL,
            "https://services.gradle.org/distributions/gradle-8.4-bin.zip",
        ),
        (keys::NETWORK_TIMEOUT, "10000"),
        ("validateDistributionUrl", "true"),
    ]
    .into_iter()
    .collect();
    let spec = DistributionSpec::new("8.5", DistributionType::Bin).with_distribution(
        distwrap_core::StorageLocation::new(PathBase::Project, "wrapper/dists"),
    );
    let url = Url::parse("https://services.gradle.org/distributions/gradle-8.5-bin.zip")
        .expect("valid url");

    let written = wrapper_properties(&persisted, &spec, &url);
    assert_eq!(written.get(keys::DISTRIBUTION_SHA256_SUM), None);
    assert_eq!(written.get(keys::DISTRIBUTION_BASE), Some("PROJECT"));
    assert_eq!(written.get(keys::NETWORK_TIMEOUT), Some("10000"));
    assert_eq!(written.get("validateDistributionUrl"), Some("true"));
    assert_eq!(written.get(keys::DISTRIBUTION_URL), Some(url.as_str()));
}

#[test]
fn wrapper_properties_record_checksum_when_known() {
    let sha = "a".repeat(64);
    let spec = DistributionSpec::new("8.5", DistributionType::All).with_sha256(Some(sha.clone()));
    let url = Url::parse("https://services.gradle.org/distributions/gradle-8.5-all.zip")
        .expect("valid url");

    let written = wrapper_properties(&Properties::new(), &spec, &url);
    assert_eq!(written.get(keys::DISTRIBUTION_SHA256_SUM), Some(sha.as_str()));
}

#[test]
fn info_lines_report_missing_checksum_and_install_state() {
    let spec = DistributionSpec::new("8.5", DistributionType::Bin);
    let url = Url::parse("https://services.gradle.org/distributions/gradle-8.5-bin.zip")
        .expect("valid url");
    let entry = Path::new("/gh/wrapper/dists/gradle-8.5-bin/0123456789abcdef");
    let archive = Path::new("/gh/wrapper/dists/gradle-8.5-bin/0123456789abcdef.zip");

    let lines = format_info_lines(&spec, &url, entry, archive, None);
    assert!(lines.contains(&"version: 8.5".to_string()));
    assert!(lines.contains(&"type: BIN".to_string()));
    assert!(lines.contains(&"sha256: none (not verified)".to_string()));
    assert!(lines.contains(&"installed: no".to_string()));

    let installed = InstalledDistribution {
        entry_dir: entry.to_path_buf(),
        home_dir: entry.join("gradle-8.5"),
        freshly_installed: false,
    };
    let lines = format_info_lines(&spec, &url, entry, archive, Some(&installed));
    assert!(lines
        .iter()
        .any(|line| line.starts_with("installed: ") && line.ends_with("gradle-8.5")));
}

#[test]
fn launcher_scripts_delegate_to_run() {
    let unix = render_unix_script();
    assert!(unix.starts_with("#!/bin/sh\n"));
    assert!(unix.contains("run -- \"$@\""));
    assert!(unix.contains(keys::PROPERTIES_FILE));
    assert!(!unix.contains("@APP_NAME@"));

    let windows = render_windows_script();
    assert!(windows.contains("run -- %*"));
    assert!(windows.contains("\r\n"));
    assert!(!windows.replace("\r\n", "").contains('\n'));
    assert!(!windows.contains("@APP_NAME@"));
}

#[test]
fn launcher_scripts_are_written_into_project_root() {
    let dir = test_dir();
    let written = write_launcher_scripts(&dir).expect("must write scripts");
    assert_eq!(written, vec![dir.join("gradlew"), dir.join("gradlew.bat")]);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(dir.join("gradlew"))
            .expect("must stat gradlew")
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111, "gradlew must be executable");
    }

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn status_lines_follow_output_style() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "installed", "Gradle 8.5"),
        Some("installed: Gradle 8.5".to_string())
    );
    assert_eq!(
        render_status_line(OutputStyle::Quiet, "installed", "Gradle 8.5"),
        None
    );
    let rich = render_status_line(OutputStyle::Rich, "installed", "Gradle 8.5")
        .expect("rich output prints");
    assert!(rich.contains("installed"));
    assert!(rich.ends_with("Gradle 8.5"));
}

#[test]
fn output_style_prefers_quiet_then_terminal() {
    assert_eq!(resolve_output_style(true, true), OutputStyle::Quiet);
    assert_eq!(resolve_output_style(false, true), OutputStyle::Rich);
    assert_eq!(resolve_output_style(false, false), OutputStyle::Plain);
}

#[test]
fn elapsed_time_is_rendered_with_millis() {
    assert_eq!(format_elapsed(Duration::from_millis(1_234)), "1.234s");
    assert_eq!(format_elapsed(Duration::from_millis(50)), "0.050s");
}
