use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory lock serializing writes to one outline file.
///
/// Holds platform-native flock (Unix) on a permanent `.name.lock` sidecar
/// next to the outline, so concurrent td processes never interleave a
/// read-modify-write. The sidecar is deliberately never unlinked: removing
/// it while another process is opening the same path would hand each of
/// them a lock on a different inode, and a stale empty lock file is
/// harmless.
pub struct FileLock {
    _file: File,
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another td process may be writing")]
    Timeout { path: PathBuf },
    #[error("lock error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FileLock {
    /// Acquire the lock for the given outline file, polling up to `timeout`.
    /// The lock is released when the returned guard drops (flock follows the
    /// file descriptor); the sidecar file itself stays behind.
    pub fn acquire(outline: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = sidecar_path(outline);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => return Ok(FileLock { _file: file }),
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(_) => return Err(LockError::Timeout { path: lock_path }),
            }
        }
    }

    /// Acquire with the default timeout (5 seconds)
    pub fn acquire_default(outline: &Path) -> Result<Self, LockError> {
        Self::acquire(outline, DEFAULT_TIMEOUT)
    }
}

/// `.name.lock` next to the outline file.
fn sidecar_path(outline: &Path) -> PathBuf {
    let name = outline
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "outline".to_string());
    outline.with_file_name(format!(".{name}.lock"))
}

/// Try to acquire an exclusive flock on the file (non-blocking)
#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    // On non-Unix platforms, just succeed (advisory locking)
    Ok(())
}
