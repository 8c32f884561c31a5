use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use distwrap_core::DistributionType;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod completion;
mod dispatch;
mod render;
mod scripts;

#[derive(Parser, Debug)]
#[command(name = "distwrap")]
#[command(
    about = "Resolves, downloads and installs the Gradle distribution of a project wrapper",
    long_about = None
)]
struct Cli {
    /// Project root holding gradle/wrapper/gradle-wrapper.properties.
    #[arg(long, global = true, value_name = "DIR")]
    project_dir: Option<PathBuf>,
    /// Overrides GRADLE_USER_HOME and ~/.gradle.
    #[arg(long, global = true, value_name = "DIR")]
    gradle_user_home: Option<PathBuf>,
    /// Configuration property, applied over gradle.properties files.
    #[arg(
        short = 'P',
        long = "property",
        global = true,
        value_name = "KEY=VALUE",
        value_parser = parse_property_arg
    )]
    properties: Vec<(String, String)>,
    /// Only print warnings and errors; hide progress.
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Give up waiting for another install of the same distribution.
    #[arg(long, global = true, value_name = "SECS")]
    lock_timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Writes the wrapper properties and launcher scripts, then installs.
    Wrapper(WrapperArgs),
    /// Installs the distribution named by the existing wrapper properties.
    Install,
    /// Installs if needed and runs the distribution's launcher.
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
    /// Prints the resolved distribution and its cache paths.
    Info,
    /// Prints a shell completion script.
    Completions { shell: Shell },
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
struct WrapperArgs {
    /// Type of the distribution to download.
    #[arg(long, value_name = "bin|all", value_parser = parse_dist_type)]
    dist_type: Option<DistributionType>,
    /// Absolute URL of the distribution to download.
    #[arg(long, value_name = "URL")]
    dist_url: Option<String>,
    /// SHA-256 checksum of the distribution to download.
    #[arg(long, value_name = "SHA256")]
    dist_sha256: Option<String>,
    /// Version of the distribution to download.
    #[arg(long, value_name = "VERSION")]
    dist_version: Option<String>,
    /// Update the distribution to the latest available release.
    #[arg(long, conflicts_with_all = ["dist_version", "dist_url", "dist_sha256"])]
    self_update: bool,
    /// Only rewrite the properties and scripts.
    #[arg(long)]
    no_install: bool,
}

fn parse_property_arg(raw: &str) -> Result<(String, String), String> {
    distwrap_resolver::parse_property_assignment(raw).map_err(|err| err.to_string())
}

fn parse_dist_type(raw: &str) -> Result<DistributionType, String> {
    DistributionType::parse("dist-type", raw).map_err(|err| err.to_string())
}

fn init_tracing(quiet: bool) {
    let level = if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var("DISTWRAP_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let code = dispatch::run_cli(cli)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
