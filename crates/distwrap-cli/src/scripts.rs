use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use distwrap_core::keys;

const UNIX_SCRIPT_NAME: &str = "gradlew";
const WINDOWS_SCRIPT_NAME: &str = "gradlew.bat";

const UNIX_TEMPLATE: &str = r#"#!/bin/sh
#
# @APP_NAME@ start up script for UN*X, generated by distwrap.
#
# The distribution is described by @PROPERTIES_FILE@.
# Set DISTWRAP to use a distwrap binary that is not on PATH.

APP_HOME=$(cd "${0%"${0##*/}"}." > /dev/null && pwd -P) || exit

exec "${DISTWRAP:-distwrap}" --project-dir "$APP_HOME" run -- "$@"
"#;

const WINDOWS_TEMPLATE: &str = r#"@rem
@rem @APP_NAME@ startup script for Windows, generated by distwrap.
@rem
@rem The distribution is described by @PROPERTIES_FILE@.
@rem Set DISTWRAP to use a distwrap binary that is not on PATH.

@if "%DEBUG%"=="" @echo off
setlocal

set APP_HOME=%~dp0
if "%DISTWRAP%"=="" set DISTWRAP=distwrap

"%DISTWRAP%" --project-dir "%APP_HOME%." run -- %*
exit /b %ERRORLEVEL%
"#;

pub(crate) fn render_unix_script() -> String {
    substitute(UNIX_TEMPLATE)
}

pub(crate) fn render_windows_script() -> String {
    substitute(WINDOWS_TEMPLATE).replace('\n', "\r\n")
}

fn substitute(template: &str) -> String {
    template
        .replace("@APP_NAME@", "Gradle")
        .replace("@PROPERTIES_FILE@", keys::PROPERTIES_FILE)
}

/// Writes `gradlew` (mode 0755) and `gradlew.bat` into the project root.
pub(crate) fn write_launcher_scripts(project_dir: &Path) -> Result<Vec<PathBuf>> {
    let unix = project_dir.join(UNIX_SCRIPT_NAME);
    let windows = project_dir.join(WINDOWS_SCRIPT_NAME);

    fs::write(&unix, render_unix_script())
        .with_context(|| format!("failed to write {}", unix.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&unix, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("failed to make {} executable", unix.display()))?;
    }

    fs::write(&windows, render_windows_script())
        .with_context(|| format!("failed to write {}", windows.display()))?;

    Ok(vec![unix, windows])
}
