//! Build configuration handed from the command line to the compilation driver.

use std::path::{Path, PathBuf};

/// Options for joint compilation with the foreign-language compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JointOptions {
    /// Directory receiving generated stubs (`stubDirectory`).
    pub stub_directory: Option<PathBuf>,
    /// `key=value` pairs passed to the foreign compiler (`namedValues`).
    pub named_values: Vec<String>,
    /// Bare flags passed to the foreign compiler (`flags`).
    pub flags: Vec<String>,
}

impl JointOptions {
    pub fn new(named_values: Vec<String>, flags: Vec<String>) -> Self {
        Self {
            stub_directory: None,
            named_values,
            flags,
        }
    }

    pub fn with_stub_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stub_directory = Some(dir.into());
        self
    }
}

/// Configuration for one compilation request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub classpath: Option<String>,
    pub sourcepath: Option<String>,
    pub target_directory: Option<PathBuf>,
    pub source_encoding: Option<String>,
    /// Parent directory for scratch directories. The system temp dir is used when unset.
    pub temp_directory: Option<PathBuf>,
    /// Present only when joint compilation was requested.
    pub joint: Option<JointOptions>,
}

impl BuildConfiguration {
    pub fn is_joint(&self) -> bool {
        self.joint.is_some()
    }

    pub fn stub_directory(&self) -> Option<&Path> {
        self.joint.as_ref()?.stub_directory.as_deref()
    }

    /// Whether the driver has to provide a stub directory before compiling.
    pub(crate) fn needs_stub_directory(&self) -> bool {
        matches!(&self.joint, Some(joint) if joint.stub_directory.is_none())
    }

    /// Returns a copy with the derived stub directory filled in.
    ///
    /// Has no effect on plain configurations or on joint configurations that
    /// already carry a stub directory.
    pub(crate) fn with_derived_stub_directory(mut self, dir: &Path) -> Self {
        if let Some(joint) = self.joint.as_mut()
            && joint.stub_directory.is_none()
        {
            joint.stub_directory = Some(dir.to_path_buf());
        }
        self
    }
}
