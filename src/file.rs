//! Source file list handling: `@file` expansion and existence checks.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;

/// Prefix marking an argument that names a file of further file names.
pub const INDIRECTION_MARKER: char = '@';

/// An indirection file whose file names could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("file not readable: {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file is not valid UTF-8: {}", path.display())]
    NotUtf8 {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ListError {
    fn new(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::InvalidData {
            ListError::NotUtf8 { path, source }
        } else {
            ListError::Unreadable { path, source }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ListError::Unreadable { path, .. } | ListError::NotUtf8 { path, .. } => path,
        }
    }
}

/// Resolution failure, listing every indirection file that could not be read.
#[derive(Debug, thiserror::Error)]
#[error("{} file list(s) could not be read", failures.len())]
pub struct ResolveError {
    pub failures: Vec<ListError>,
}

/// Expands raw command-line arguments into source file names.
pub struct FileList;

impl FileList {
    /// Resolve `args` in order. `@path` is replaced, in place, by the lines
    /// of `path`; every other argument is kept as is.
    ///
    /// Fails without partial output if any indirection file can't be read.
    pub fn resolve<S: AsRef<str>>(args: &[S]) -> Result<Vec<String>, ResolveError> {
        let mut files = Vec::with_capacity(args.len());
        let mut failures = Vec::new();

        for arg in args {
            let arg: &str = arg.as_ref();
            match arg.strip_prefix(INDIRECTION_MARKER) {
                Some(list) => match read_lines(Path::new(list)) {
                    Ok(lines) => {
                        debug!("Expanded @{} into {} file name(s)", list, lines.len());
                        files.extend(lines);
                    }
                    Err(source) => failures.push(ListError::new(Path::new(list), source)),
                },
                None => files.push(arg.to_string()),
            }
        }

        if failures.is_empty() {
            Ok(files)
        } else {
            Err(ResolveError { failures })
        }
    }
}

/// Lines of `path`, without line terminators. Content that is not UTF-8
/// fails with `InvalidData`.
fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    reader.lines().collect()
}

/// A source file that can't be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileCheckError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("file not readable: {0}")]
    NotReadable(String),
}

/// Check that every file exists and can be read. Returns one error per bad file.
pub fn check_files<S: AsRef<str>>(filenames: &[S]) -> Vec<FileCheckError> {
    filenames
        .iter()
        .filter_map(|name| {
            let name: &str = name.as_ref();
            let path = Path::new(name);
            match fs::metadata(path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Some(FileCheckError::NotFound(name.to_string()))
                }
                Ok(meta) if meta.is_file() && File::open(path).is_ok() => None,
                _ => Some(FileCheckError::NotReadable(name.to_string())),
            }
        })
        .collect()
}
