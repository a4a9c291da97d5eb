use std::fs::{File, OpenOptions};
use std::path::Path;
use crate::core::error::{Error, Result};

/// Single writer guarantee across processes
///
/// Advisory `flock` on `<dir>/.lock`, released when dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        // Platform-specific locking
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();
            // SAFETY: fd is owned by `file`, which outlives this call.
            let rc = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
            if rc != 0 {
                return Err(Error::InvalidState(format!(
                    "index at {} is locked by another writer",
                    dir.display()
                )));
            }
        }

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}
