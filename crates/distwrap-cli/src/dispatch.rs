use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use distwrap_core::{
    keys, read_properties_file, write_properties_file, DistributionSpec, Properties,
};
use distwrap_installer::{
    ensure_distribution, CacheEntry, EnsureOptions, InstalledDistribution, Installer, LockWait,
    StorageRoots,
};
use distwrap_repository::{
    latest_version, locate, ArtifactResolver, FileRepository, HttpVersionFeed,
    RepositoryDescriptor,
};
use distwrap_resolver::{resolve, ConfigProperties, Overrides};
use url::Url;

use crate::completion::write_completions_script;
use crate::render::{current_output_style, OutputStyle, TerminalRenderer};
use crate::scripts::write_launcher_scripts;
use crate::{Cli, Commands, WrapperArgs};

pub(crate) fn run_cli(cli: Cli) -> Result<i32> {
    if let Commands::Completions { shell } = &cli.command {
        write_completions_script(*shell, &mut std::io::stdout().lock())?;
        return Ok(0);
    }

    let workspace = Workspace::load(&cli)?;
    match &cli.command {
        Commands::Wrapper(args) => {
            run_wrapper_command(&workspace, args)?;
            Ok(0)
        }
        Commands::Install => {
            let (spec, installed) = run_install_command(&workspace)?;
            workspace
                .renderer
                .print_status("installed", &describe_install(&spec, &installed));
            Ok(0)
        }
        Commands::Run { args } => run_launcher(&workspace, args),
        Commands::Info => {
            run_info_command(&workspace)?;
            Ok(0)
        }
        Commands::Completions { .. } => Ok(0),
    }
}

/// Everything a command needs that does not depend on the command itself.
pub(crate) struct Workspace {
    project_dir: PathBuf,
    gradle_user_home: PathBuf,
    config: ConfigProperties,
    repo: RepositoryDescriptor,
    lock_wait: LockWait,
    renderer: TerminalRenderer,
}

impl Workspace {
    fn load(cli: &Cli) -> Result<Self> {
        let project_dir = match &cli.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("cannot determine the current directory")?,
        };
        let gradle_user_home = resolve_gradle_user_home(
            cli.gradle_user_home.as_deref(),
            std::env::var_os("GRADLE_USER_HOME"),
            dirs::home_dir(),
        )?;
        let config = ConfigProperties::load(&project_dir, &gradle_user_home, &cli.properties)
            .context("failed to load configuration properties")?;
        let repo = RepositoryDescriptor::configured(
            config.repository_url(),
            config.repository_pattern(),
            config.vendor_name(),
        )
        .context("invalid distribution repository configuration")?;
        tracing::debug!(
            project = %project_dir.display(),
            gradle_user_home = %gradle_user_home.display(),
            repository = %repo.base_url(),
            "loaded workspace"
        );

        Ok(Self {
            project_dir,
            gradle_user_home,
            config,
            repo,
            lock_wait: lock_wait_from(cli.lock_timeout_secs),
            renderer: TerminalRenderer::new(current_output_style(cli.quiet)),
        })
    }

    fn properties_path(&self) -> PathBuf {
        self.project_dir.join(keys::PROPERTIES_FILE)
    }

    fn read_persisted(&self) -> Result<Option<Properties>> {
        let path = self.properties_path();
        read_properties_file(&path).with_context(|| format!("failed to read {}", path.display()))
    }

    fn roots(&self) -> StorageRoots {
        StorageRoots::new(&self.gradle_user_home, &self.project_dir)
    }

    fn ensure(&self, spec: &DistributionSpec) -> Result<InstalledDistribution> {
        let files = spec
            .url()
            .is_none()
            .then(|| FileRepository::from_descriptor(&self.repo))
            .flatten();

        let mut options = EnsureOptions::new(self.roots());
        options.lock_wait = self.lock_wait;
        options.progress = self.renderer.download_progress();
        options.resolver = files.as_ref().map(|files| files as &dyn ArtifactResolver);

        ensure_distribution(spec, &self.repo, options).with_context(|| {
            format!(
                "failed to install Gradle {} ({})",
                spec.version(),
                spec.distribution_type()
            )
        })
    }
}

pub(crate) fn resolve_gradle_user_home(
    flag: Option<&Path>,
    env: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(flag) = flag {
        return Ok(flag.to_path_buf());
    }
    if let Some(env) = env.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(env));
    }
    match home {
        Some(home) => Ok(home.join(".gradle")),
        None => bail!("cannot locate the Gradle user home; set GRADLE_USER_HOME or pass --gradle-user-home"),
    }
}

pub(crate) fn lock_wait_from(timeout_secs: Option<u64>) -> LockWait {
    match timeout_secs {
        Some(secs) => LockWait::Timeout(Duration::from_secs(secs)),
        None => LockWait::Block,
    }
}

pub(crate) fn overrides_from(args: &WrapperArgs) -> Overrides {
    Overrides {
        distribution_type: args.dist_type,
        url: args.dist_url.clone(),
        sha256: args.dist_sha256.clone(),
        version: args.dist_version.clone(),
    }
}

/// Merges the resolved distribution into the persisted properties, keeping keys this
/// tool does not manage where they were.
pub(crate) fn wrapper_properties(
    persisted: &Properties,
    spec: &DistributionSpec,
    url: &Url,
) -> Properties {
    let mut updated = persisted.clone();
    updated.set(keys::DISTRIBUTION_BASE, spec.distribution().base.as_str());
    updated.set(keys::DISTRIBUTION_PATH, spec.distribution().path.as_str());
    match spec.sha256() {
        Some(sha256) => updated.set(keys::DISTRIBUTION_SHA256_SUM, sha256),
        None => {
            updated.remove(keys::DISTRIBUTION_SHA256_SUM);
        }
    }
    updated.set(keys::DISTRIBUTION_URL, url.as_str());
    updated.set(keys::ZIP_STORE_BASE, spec.archive().base.as_str());
    updated.set(keys::ZIP_STORE_PATH, spec.archive().path.as_str());
    updated
}

fn run_wrapper_command(workspace: &Workspace, args: &WrapperArgs) -> Result<()> {
    let renderer = workspace.renderer;
    let persisted = workspace.read_persisted()?.unwrap_or_default();
    let mut overrides = overrides_from(args);

    if args.self_update {
        let current = resolve(&persisted, &workspace.config, &overrides)?;
        let feed = HttpVersionFeed::current(current.network_timeout())?;
        let latest = latest_version(&workspace.repo, current.distribution_type(), &feed)
            .context("failed to look up the latest distribution")?;
        if latest == current.version() {
            renderer.print_status("up-to-date", &format!("Gradle {latest}"));
        } else {
            renderer.print_status(
                "updating",
                &format!("Gradle {} -> {latest}", current.version()),
            );
            overrides.version = Some(latest);
        }
    }

    let spec = resolve(&persisted, &workspace.config, &overrides)?;
    let url = locate(&spec, &workspace.repo)?;

    let path = workspace.properties_path();
    write_properties_file(&path, &wrapper_properties(&persisted, &spec, &url))
        .with_context(|| format!("failed to write {}", path.display()))?;
    renderer.print_status("wrote", &path.display().to_string());

    for script in write_launcher_scripts(&workspace.project_dir)? {
        renderer.print_status("wrote", &script.display().to_string());
    }

    if args.no_install {
        return Ok(());
    }
    let installed = workspace.ensure(&spec)?;
    renderer.print_status("installed", &describe_install(&spec, &installed));
    Ok(())
}

fn run_install_command(workspace: &Workspace) -> Result<(DistributionSpec, InstalledDistribution)> {
    let path = workspace.properties_path();
    let persisted = workspace.read_persisted()?.ok_or_else(|| {
        anyhow!(
            "no wrapper properties at {}; run `distwrap wrapper` first",
            path.display()
        )
    })?;
    let spec = resolve(&persisted, &workspace.config, &Overrides::default())?;
    let installed = workspace.ensure(&spec)?;
    Ok((spec, installed))
}

fn run_launcher(workspace: &Workspace, args: &[OsString]) -> Result<i32> {
    let (_, installed) = run_install_command(workspace)?;
    let launcher = installed.launcher();
    tracing::debug!(launcher = %launcher.display(), "starting distribution");

    let status = Command::new(&launcher)
        .args(args)
        .current_dir(&workspace.project_dir)
        .status()
        .with_context(|| format!("failed to start {}", launcher.display()))?;
    Ok(status.code().unwrap_or(1))
}

fn run_info_command(workspace: &Workspace) -> Result<()> {
    let persisted = workspace.read_persisted()?.unwrap_or_default();
    let spec = resolve(&persisted, &workspace.config, &Overrides::default())?;
    let url = locate(&spec, &workspace.repo)?;

    let roots = workspace.roots();
    let entry = CacheEntry::for_url(&url)?;
    let installed = Installer::new(roots.clone(), workspace.lock_wait).installed(&url, &spec)?;
    let lines = format_info_lines(
        &spec,
        &url,
        &entry.entry_dir(&roots.root(spec.distribution())),
        &entry.archive_path(&roots.root(spec.archive())),
        installed.as_ref(),
    );

    // Info is what the user asked for, so it is printed even when quiet.
    let renderer = match workspace.renderer.style() {
        OutputStyle::Quiet => TerminalRenderer::new(OutputStyle::Plain),
        _ => workspace.renderer,
    };
    renderer.print_lines(&lines);
    Ok(())
}

pub(crate) fn format_info_lines(
    spec: &DistributionSpec,
    url: &Url,
    entry_dir: &Path,
    archive: &Path,
    installed: Option<&InstalledDistribution>,
) -> Vec<String> {
    vec![
        format!("version: {}", spec.version()),
        format!("type: {}", spec.distribution_type()),
        format!("url: {url}"),
        format!("sha256: {}", spec.sha256().unwrap_or("none (not verified)")),
        format!("archive: {}", archive.display()),
        format!("distribution: {}", entry_dir.display()),
        match installed {
            Some(installed) => format!("installed: {}", installed.home_dir.display()),
            None => "installed: no".to_string(),
        },
    ]
}

fn describe_install(spec: &DistributionSpec, installed: &InstalledDistribution) -> String {
    let verb = if installed.freshly_installed {
        "into"
    } else {
        "already in"
    };
    format!(
        "Gradle {} ({}) {verb} {}",
        spec.version(),
        spec.distribution_type(),
        installed.home_dir.display()
    )
}
