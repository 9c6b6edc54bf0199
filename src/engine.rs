//! The seam between the driver and the compilation engine.
//!
//! The engine does the actual parsing and code generation. The driver only
//! configures it, hands it an explicit list of sources and asks it to compile.

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;

use crate::driver::config::BuildConfiguration;

pub mod process;

pub use process::{ProcessEngine, ProcessEngineFactory};

/// Plain compilation or joint compilation with the foreign-language compiler.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineMode {
    Plain,
    Joint,
}

impl EngineMode {
    pub fn for_config(config: &BuildConfiguration) -> Self {
        if config.is_joint() {
            EngineMode::Joint
        } else {
            EngineMode::Plain
        }
    }
}

/// Whether the engine may look for sources beyond the ones it is given.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SourceLookup {
    /// The engine may resolve referenced sources on its own (search paths, loaders).
    Implicit,
    /// The engine compiles exactly the sources it was handed and nothing else.
    #[default]
    Never,
}

/// Settings fixed at engine construction time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub mode: EngineMode,
    pub source_lookup: SourceLookup,
}

/// A compilation engine instance, used for a single compilation.
pub trait CompilationEngine {
    /// Point a joint compilation at the stub directory the driver created.
    ///
    /// Only called on engines handed to
    /// [`CompilationDriver::run_with_engine`](crate::CompilationDriver::run_with_engine);
    /// engines built by an [`EngineFactory`] see it in their configuration.
    fn use_stub_directory(&mut self, dir: &Path);

    /// Queue sources for compilation, in order.
    fn add_sources(&mut self, paths: &[String]);

    fn compile(&mut self) -> Result<(), EngineError>;
}

/// Creates engines for a configuration.
pub trait EngineFactory {
    type Engine: CompilationEngine;

    fn create(
        &self,
        config: &BuildConfiguration,
        settings: EngineSettings,
    ) -> Result<Self::Engine, EngineError>;
}

/// Opaque failure reported by a compilation engine.
///
/// The driver never inspects it; it is carried to the reporter as is.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct EngineError(Box<dyn StdError + Send + Sync + 'static>);

impl EngineError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        EngineError(error.into())
    }

    pub fn msg(message: impl fmt::Display) -> Self {
        EngineError(message.to_string().into())
    }
}
