use std::io::Write;
use std::path::{Path, PathBuf};

/// Failure to take the package database lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// A live process holds the lock. The whole invocation must abort:
    /// a competing writer means this process may not touch the store at all.
    #[error("another binup process (pid {0}) holds the package database lock")]
    Busy(u32),
    #[error("could not take package database lock: {0}")]
    Io(#[from] std::io::Error),
}

/// Advisory cross-process lock over all package database mutations.
///
/// A marker file records the holder's PID. Acquisition probes a pre-existing
/// file's holder for liveness: a dead holder is reclaimed (file removed,
/// acquisition retried once), a live one yields [`LockError::Busy`]. The file
/// is removed on drop; abnormal termination simply leaves a stale file for
/// the next acquirer to reclaim.
#[derive(Debug)]
pub struct DbLock {
    path: PathBuf,
}

impl DbLock {
    pub fn acquire(path: &Path) -> Result<DbLock, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match Self::try_create(path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = read_holder(path);
                if let Some(pid) = holder {
                    if pid_alive(pid) {
                        return Err(LockError::Busy(pid));
                    }
                }
                tracing::warn!(?holder, "reclaiming stale package database lock");
                std::fs::remove_file(path)?;
                // single retry; losing the race to another reclaimer means Busy
                match Self::try_create(path) {
                    Ok(lock) => Ok(lock),
                    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                        Err(LockError::Busy(read_holder(path).unwrap_or(0)))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_create(path: &Path) -> std::io::Result<DbLock> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        write!(file, "{}", std::process::id())?;
        Ok(DbLock {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for DbLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn read_holder(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Probes whether `pid` is a running process.
///
/// `kill(pid, 0)` delivers no signal; success or `EPERM` (exists, not ours)
/// both mean alive, only `ESRCH` means gone.
#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    let ret = unsafe { libc::kill(pid as libc::pid_t, 0) };
    ret == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Without a liveness probe a lock file can never be proven stale, so it is
/// always treated as held.
#[cfg(not(unix))]
fn pid_alive(_pid: u32) -> bool {
    true
}
