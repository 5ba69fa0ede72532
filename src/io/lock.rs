use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long writers wait for the board lock by default
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Advisory lock serializing read-modify-write cycles on a board's task
/// store across `tb` processes. Released when dropped.
#[derive(Debug)]
pub struct BoardLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("board at {path} is locked by another tb process")]
    Busy { path: PathBuf },
}

impl BoardLock {
    /// Lock `board_dir`, polling for up to `wait`.
    pub fn acquire(board_dir: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = board_dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::CreateError {
                path: path.clone(),
                source: e,
            })?;

        let deadline = Instant::now() + wait;
        while try_lock(&file).is_err() {
            if Instant::now() >= deadline {
                return Err(LockError::Busy { path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(BoardLock { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// The lock file itself stays on disk: unlinking it while another process
// waits on the same inode would let two writers in at once.

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
