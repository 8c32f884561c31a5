use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use distwrap_core::{WrapperError, WrapperResult};
use fs4::FileExt;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long `EntryLock::acquire` waits for another holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockWait {
    #[default]
    Block,
    Timeout(Duration),
}

/// Exclusive advisory lock on a cache entry's `.lck` file.
///
/// Released when dropped, and by the OS if the process dies while holding it.
#[derive(Debug)]
pub struct EntryLock {
    file: File,
    path: PathBuf,
}

impl EntryLock {
    pub fn acquire(path: &Path, wait: LockWait) -> WrapperResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                WrapperError::io(format!("failed to create {}", parent.display()), err)
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| WrapperError::installation(path, format!("cannot open lock: {err}")))?;

        match wait {
            LockWait::Block => {
                FileExt::lock_exclusive(&file)
                    .map_err(|err| WrapperError::installation(path, format!("cannot lock: {err}")))?;
            }
            LockWait::Timeout(timeout) => poll_exclusive(&file, path, timeout)?,
        }

        tracing::debug!(path = %path.display(), "acquired cache entry lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EntryLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn poll_exclusive(file: &File, path: &Path, timeout: Duration) -> WrapperResult<()> {
    let started = Instant::now();
    loop {
        match FileExt::try_lock_exclusive(file) {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                if started.elapsed() >= timeout {
                    return Err(WrapperError::installation(
                        path,
                        format!(
                            "timed out after {}s waiting for another install to finish",
                            timeout.as_secs_f32()
                        ),
                    ));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                return Err(WrapperError::installation(path, format!("cannot lock: {err}")));
            }
        }
    }
}
