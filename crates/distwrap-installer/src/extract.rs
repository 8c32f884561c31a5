use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};

use distwrap_core::{WrapperError, WrapperResult};
use zip::ZipArchive;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Unpacks a zip archive below `target`.
///
/// Entries whose names would land outside `target` fail the whole extraction.
/// Unix permission bits stored in the archive are restored.
pub fn extract_zip(archive_path: &Path, target: &Path) -> WrapperResult<()> {
    let fail = |message: String| WrapperError::installation(target, message);

    let file = File::open(archive_path)
        .map_err(|err| WrapperError::io(format!("failed to open {}", archive_path.display()), err))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|err| fail(format!("{} is not a zip archive: {err}", archive_path.display())))?;
    tracing::debug!(
        archive = %archive_path.display(),
        entries = archive.len(),
        "extracting distribution"
    );

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| fail(format!("cannot read zip entry {index}: {err}")))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(fail(format!("zip entry '{}' escapes the target", entry.name())));
        };
        let out_path = target.join(relative);
        let mode = entry.unix_mode();

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|err| {
                WrapperError::io(format!("failed to create {}", out_path.display()), err)
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                WrapperError::io(format!("failed to create {}", parent.display()), err)
            })?;
        }

        if mode.is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
            let mut link_target = String::new();
            io::Read::read_to_string(&mut entry, &mut link_target)
                .map_err(|err| fail(format!("cannot read link '{}': {err}", entry.name())))?;
            create_symlink(&link_target, &out_path).map_err(fail)?;
            continue;
        }

        let mut out = File::create(&out_path)
            .map_err(|err| WrapperError::io(format!("failed to create {}", out_path.display()), err))?;
        io::copy(&mut entry, &mut out)
            .map_err(|err| fail(format!("cannot extract '{}': {err}", entry.name())))?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777)).map_err(
                |err| WrapperError::io(format!("failed to chmod {}", out_path.display()), err),
            )?;
        }
    }
    Ok(())
}

fn create_symlink(link_target: &str, link: &Path) -> Result<(), String> {
    let target = Path::new(link_target);
    let escapes = target.is_absolute()
        || target
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(format!(
            "symlink {} -> {link_target} points outside the distribution",
            link.display()
        ));
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
            .map_err(|err| format!("cannot create symlink {}: {err}", link.display()))
    }
    #[cfg(not(unix))]
    {
        let resolved = link.parent().unwrap_or(link).join(target);
        fs::copy(&resolved, link)
            .map(|_| ())
            .map_err(|err| format!("cannot copy {} to {}: {err}", resolved.display(), link.display()))
    }
}
