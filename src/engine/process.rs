//! Compilation engine backed by an external executable.
//!
//! The engine is invoked as
//! `<program> [options] -- <sources>...`
//! and a zero exit status means the compilation succeeded.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use itertools::Itertools;
use log::debug;

use super::{CompilationEngine, EngineError, EngineFactory, EngineMode, EngineSettings, SourceLookup};
use crate::driver::config::BuildConfiguration;

/// Errors raised while running the engine executable
#[derive(Debug, thiserror::Error)]
pub enum ProcessEngineError {
    #[error("failed to execute compilation engine `{program}`")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("compilation engine `{program}` failed ({status})")]
    Failed { program: PathBuf, status: ExitStatus },
}

/// Creates a [`ProcessEngine`] per compilation.
#[derive(Debug, Clone)]
pub struct ProcessEngineFactory {
    program: PathBuf,
}

impl ProcessEngineFactory {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl EngineFactory for ProcessEngineFactory {
    type Engine = ProcessEngine;

    fn create(
        &self,
        config: &BuildConfiguration,
        settings: EngineSettings,
    ) -> Result<ProcessEngine, EngineError> {
        Ok(ProcessEngine::new(self.program.clone(), config, settings))
    }
}

pub struct ProcessEngine {
    program: PathBuf,
    config: BuildConfiguration,
    settings: EngineSettings,
    sources: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: PathBuf, config: &BuildConfiguration, settings: EngineSettings) -> Self {
        ProcessEngine {
            program,
            config: config.clone(),
            settings,
            sources: Vec::new(),
        }
    }

    fn options(&self) -> Vec<OsString> {
        let config = &self.config;
        let mut options: Vec<OsString> = Vec::new();

        if let Some(classpath) = &config.classpath {
            options.push("--classpath".into());
            options.push(classpath.into());
        }
        if let Some(sourcepath) = &config.sourcepath {
            options.push("--sourcepath".into());
            options.push(sourcepath.into());
        }
        if let Some(encoding) = &config.source_encoding {
            options.push("--encoding".into());
            options.push(encoding.into());
        }
        if let Some(dir) = &config.target_directory {
            options.push("-d".into());
            options.push(dir.into());
        }
        if self.settings.source_lookup == SourceLookup::Never {
            options.push("--no-source-lookup".into());
        }

        if self.settings.mode == EngineMode::Joint
            && let Some(joint) = &config.joint
        {
            options.push("--joint".into());
            if let Some(stub_dir) = &joint.stub_directory {
                options.push("--stub-dir".into());
                options.push(stub_dir.into());
            }
            for value in &joint.named_values {
                options.push("-J".into());
                options.push(value.into());
            }
            for flag in &joint.flags {
                options.push("-F".into());
                options.push(flag.into());
            }
        }
        options
    }

    /// The full argument list the engine executable will receive.
    pub fn arguments(&self) -> Vec<OsString> {
        let mut args = self.options();
        args.push("--".into());
        args.extend(self.sources.iter().map(OsString::from));
        args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.arguments());
        cmd
    }
}

impl CompilationEngine for ProcessEngine {
    fn use_stub_directory(&mut self, dir: &Path) {
        if let Some(joint) = self.config.joint.as_mut() {
            joint.stub_directory = Some(dir.to_path_buf());
        }
    }

    fn add_sources(&mut self, paths: &[String]) {
        self.sources.extend_from_slice(paths);
    }

    fn compile(&mut self) -> Result<(), EngineError> {
        let mut cmd = self.command();
        debug!(
            "Executing compilation engine: {} {}",
            self.program.display(),
            self.arguments().iter().map(|a| a.to_string_lossy()).join(" ")
        );

        let status = cmd.status().map_err(|source| {
            EngineError::new(ProcessEngineError::Spawn {
                program: self.program.clone(),
                source,
            })
        })?;

        if !status.success() {
            return Err(EngineError::new(ProcessEngineError::Failed {
                program: self.program.clone(),
                status,
            }));
        }
        Ok(())
    }
}
