//! Compilation orchestration module
//!
//! The driver prepares the stub directory for joint compilation, builds the
//! engine, hands it the sources and removes the stub directory again.

use std::path::{Path, PathBuf};

use log::debug;

use crate::engine::{CompilationEngine, EngineFactory, EngineMode, EngineSettings, SourceLookup};
use crate::error::DriverError;
use crate::scratch::{
    CleanupError, DirectoryFactory, ScratchDirectory, ScratchDirectoryManager, TempDirFactory,
};

use super::config::BuildConfiguration;

/// Result of a successful run
#[derive(Debug)]
pub struct RunReport {
    /// Stub directory the driver created for this run. It is gone by now.
    pub scratch_dir: Option<PathBuf>,
    /// Set when the stub directory could not be removed completely.
    pub cleanup_failure: Option<CleanupError>,
}

/// Main compiler driver
pub struct CompilationDriver<F, D = TempDirFactory> {
    factory: F,
    scratch: ScratchDirectoryManager<D>,
}

impl<F: EngineFactory, D: DirectoryFactory> CompilationDriver<F, D> {
    pub fn with_scratch(factory: F, scratch: ScratchDirectoryManager<D>) -> Self {
        CompilationDriver { factory, scratch }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Compile `sources` with `config`.
    ///
    /// For a joint configuration without a stub directory a scratch directory
    /// is created first and removed again before returning, whatever the
    /// outcome of the compilation.
    pub fn run(&self, config: BuildConfiguration, sources: &[String]) -> Result<RunReport, DriverError> {
        self.in_scratch(config, |config, _| {
            // Only the sources on the command line are compiled
            let settings = EngineSettings {
                mode: EngineMode::for_config(config),
                source_lookup: SourceLookup::Never,
            };
            debug!("Creating {:?} compilation engine", settings.mode);

            let mut engine = self.factory.create(config, settings)?;
            compile(&mut engine, sources)
        })
    }

    /// Like [`run`](Self::run), but compiles with an engine the caller built.
    ///
    /// The engine is told about a stub directory created for this run through
    /// [`CompilationEngine::use_stub_directory`].
    pub fn run_with_engine<E>(
        &self,
        config: BuildConfiguration,
        sources: &[String],
        engine: &mut E,
    ) -> Result<RunReport, DriverError>
    where
        E: CompilationEngine + ?Sized,
    {
        self.in_scratch(config, |_, scratch_dir| {
            if let Some(dir) = scratch_dir {
                engine.use_stub_directory(dir);
            }
            compile(engine, sources)
        })
    }

    /// Run `work` with the stub directory in place and release it afterwards.
    fn in_scratch<W>(&self, config: BuildConfiguration, work: W) -> Result<RunReport, DriverError>
    where
        W: FnOnce(&BuildConfiguration, Option<&Path>) -> Result<(), DriverError>,
    {
        let (config, guard) = if config.needs_stub_directory() {
            let dir = self.scratch.acquire()?;
            let config = config.with_derived_stub_directory(dir.path());
            (config, Some(ScratchGuard::new(&self.scratch, dir)))
        } else {
            (config, None)
        };
        let scratch_dir = guard.as_ref().map(|g| g.path().to_path_buf());

        let result = work(&config, scratch_dir.as_deref());

        let cleanup_failure = guard.and_then(|g| g.release().err());
        result?;

        Ok(RunReport {
            scratch_dir,
            cleanup_failure,
        })
    }
}

fn compile<E: CompilationEngine + ?Sized>(engine: &mut E, sources: &[String]) -> Result<(), DriverError> {
    debug!("Compiling {} source file(s)", sources.len());
    engine.add_sources(sources);
    engine.compile()?;
    Ok(())
}

/// Removes the scratch directory when the run ends, also when the engine panics.
struct ScratchGuard<'a, D: DirectoryFactory> {
    manager: &'a ScratchDirectoryManager<D>,
    dir: Option<ScratchDirectory>,
}

impl<'a, D: DirectoryFactory> ScratchGuard<'a, D> {
    fn new(manager: &'a ScratchDirectoryManager<D>, dir: ScratchDirectory) -> Self {
        Self {
            manager,
            dir: Some(dir),
        }
    }

    fn path(&self) -> &Path {
        self.dir.as_ref().map_or(Path::new(""), ScratchDirectory::path)
    }

    fn release(mut self) -> Result<(), CleanupError> {
        match self.dir.take() {
            Some(dir) => self.manager.release(dir),
            None => Ok(()),
        }
    }
}

impl<D: DirectoryFactory> Drop for ScratchGuard<'_, D> {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            // release() already logs the failure
            let _ = self.manager.release(dir);
        }
    }
}
