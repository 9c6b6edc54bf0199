//! Scratch directories for generated stubs.
//!
//! A [`ScratchDirectory`] lives for exactly one compilation: it is acquired
//! before the engine runs and released after it returns.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, warn};

/// Number of creation attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 3;
/// Pause between attempts that failed with a transient error.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

const DIR_PREFIX: &str = "fsc-generated-";
const DIR_SUFFIX: &str = "-java-source";

/// Creates a fresh, uniquely named, empty directory below `base`.
///
/// Implementations must never hand out the same path twice, also not to
/// concurrent callers.
pub trait DirectoryFactory {
    fn create_dir(&self, base: &Path) -> io::Result<PathBuf>;
}

/// Creates directories with [`tempfile::Builder`], which picks a random name
/// and creates the directory exclusively, retrying on name collisions.
#[derive(Debug, Clone)]
pub struct TempDirFactory {
    prefix: String,
    suffix: String,
}

impl Default for TempDirFactory {
    fn default() -> Self {
        Self::new(DIR_PREFIX, DIR_SUFFIX)
    }
}

impl TempDirFactory {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl DirectoryFactory for TempDirFactory {
    fn create_dir(&self, base: &Path) -> io::Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(&self.suffix)
            .tempdir_in(base)?;
        // Removal is done by `ScratchDirectoryManager::release`
        Ok(dir.keep())
    }
}

/// Failure to create a scratch directory
#[derive(Debug, thiserror::Error)]
pub enum ScratchDirError {
    #[error(
        "access denied: tried {attempts} times to create a temporary directory in {} and failed each time; \
         another process (a virus scanner or indexer, for example) may be holding the location",
        base.display()
    )]
    AccessDenied { attempts: u32, base: PathBuf },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure to remove a scratch directory. Never fatal for a build.
#[derive(Debug, thiserror::Error)]
#[error("could not delete temp files - {}", path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A directory owned by a single compilation.
#[derive(Debug, PartialEq, Eq)]
pub struct ScratchDirectory {
    path: PathBuf,
}

impl ScratchDirectory {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct ScratchDirectoryManager<F = TempDirFactory> {
    base: PathBuf,
    factory: F,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ScratchDirectoryManager<TempDirFactory> {
    /// Manager creating directories below `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_factory(base, TempDirFactory::default())
    }

    /// Manager creating directories below the system temp directory.
    pub fn in_system_temp() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl<F: DirectoryFactory> ScratchDirectoryManager<F> {
    pub fn with_factory(base: impl Into<PathBuf>, factory: F) -> Self {
        Self {
            base: base.into(),
            factory,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Create a new scratch directory.
    ///
    /// `PermissionDenied` is treated as transient and retried up to
    /// [`MAX_ATTEMPTS`] times. Any other error is returned as is.
    pub fn acquire(&self) -> Result<ScratchDirectory, ScratchDirError> {
        let mut access_denied = 0;

        for attempt in 1..=self.max_attempts {
            match self.factory.create_dir(&self.base) {
                Ok(path) => {
                    debug!("Created scratch directory {}", path.display());
                    return Ok(ScratchDirectory { path });
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    access_denied += 1;
                    debug!(
                        "Attempt {}/{} to create a scratch directory in {} was denied: {}",
                        attempt,
                        self.max_attempts,
                        self.base.display(),
                        e
                    );
                    if attempt < self.max_attempts {
                        thread::sleep(self.retry_delay);
                    }
                }
                Err(e) => return Err(ScratchDirError::Io(e)),
            }
        }

        Err(ScratchDirError::AccessDenied {
            attempts: access_denied,
            base: self.base.clone(),
        })
    }

    /// Delete a scratch directory and everything below it.
    pub fn release(&self, dir: ScratchDirectory) -> Result<(), CleanupError> {
        debug!("Removing scratch directory {}", dir.path.display());
        remove_tree(&dir.path).map_err(|source| {
            warn!("could not delete temp files - {}: {}", dir.path.display(), source);
            CleanupError { path: dir.path, source }
        })
    }
}

struct Entry {
    path: PathBuf,
    /// Children have already been pushed; only the directory itself is left.
    expanded: bool,
}

/// Depth-first removal of `root`, children before parents.
///
/// Symlinks are removed, never followed. A missing `root` counts as removed.
/// Removal keeps going after a failure and returns the first error seen.
pub fn remove_tree(root: &Path) -> io::Result<()> {
    let mut stack = vec![Entry {
        path: root.to_path_buf(),
        expanded: false,
    }];
    let mut first_error = None;

    while let Some(entry) = stack.pop() {
        let result = if entry.expanded {
            fs::remove_dir(&entry.path)
        } else {
            match fs::symlink_metadata(&entry.path) {
                Ok(meta) if meta.is_dir() => {
                    let children = fs::read_dir(&entry.path).and_then(|rd| {
                        rd.map(|child| child.map(|c| c.path())).collect::<io::Result<Vec<_>>>()
                    });
                    match children {
                        Ok(children) => {
                            stack.push(Entry {
                                path: entry.path.clone(),
                                expanded: true,
                            });
                            stack.extend(children.into_iter().map(|path| Entry {
                                path,
                                expanded: false,
                            }));
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
                Ok(_) => fs::remove_file(&entry.path),
                Err(e) => Err(e),
            }
        };

        match result {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                debug!("Failed to remove {}: {}", entry.path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
