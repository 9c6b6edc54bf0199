//! Test doubles for the compilation engine.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::driver::config::BuildConfiguration;
use crate::engine::{CompilationEngine, EngineError, EngineFactory, EngineSettings};

/// How a [`RecordingEngine`] finishes its compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail(String),
    Panic,
    /// The factory refuses to create the engine.
    RefuseCreation,
}

/// What the engine saw during one compilation.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub settings: Option<EngineSettings>,
    pub config: Option<BuildConfiguration>,
    pub sources: Vec<String>,
    pub compiled: bool,
    /// Whether the stub directory existed while compiling.
    pub stub_dir_existed: bool,
    /// Stub directory handed over through `use_stub_directory`.
    pub injected_stub_dir: Option<PathBuf>,
}

/// Factory handing out [`RecordingEngine`]s that share one recording.
pub struct RecordingFactory {
    outcome: Outcome,
    recording: Rc<RefCell<Recording>>,
}

impl RecordingFactory {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            recording: Rc::default(),
        }
    }

    pub fn recording(&self) -> Recording {
        self.recording.borrow().clone()
    }
}

impl EngineFactory for RecordingFactory {
    type Engine = RecordingEngine;

    fn create(
        &self,
        config: &BuildConfiguration,
        settings: EngineSettings,
    ) -> Result<RecordingEngine, EngineError> {
        if self.outcome == Outcome::RefuseCreation {
            return Err(EngineError::msg("engine unavailable"));
        }
        {
            let mut recording = self.recording.borrow_mut();
            recording.settings = Some(settings);
            recording.config = Some(config.clone());
        }
        Ok(RecordingEngine {
            outcome: self.outcome.clone(),
            stub_dir: config.stub_directory().map(PathBuf::from),
            recording: Rc::clone(&self.recording),
        })
    }
}

/// Engine recording its inputs. In joint mode it writes a stub file into
/// the stub directory, like a real stub generator would.
pub struct RecordingEngine {
    outcome: Outcome,
    stub_dir: Option<PathBuf>,
    recording: Rc<RefCell<Recording>>,
}

impl CompilationEngine for RecordingEngine {
    fn use_stub_directory(&mut self, dir: &Path) {
        self.stub_dir = Some(dir.to_path_buf());
        self.recording.borrow_mut().injected_stub_dir = Some(dir.to_path_buf());
    }

    fn add_sources(&mut self, paths: &[String]) {
        self.recording.borrow_mut().sources.extend_from_slice(paths);
    }

    fn compile(&mut self) -> Result<(), EngineError> {
        if let Some(dir) = &self.stub_dir {
            let existed = dir.is_dir();
            self.recording.borrow_mut().stub_dir_existed = existed;
            if existed {
                fs::create_dir_all(dir.join("pkg")).map_err(EngineError::new)?;
                fs::write(dir.join("pkg/Stub.java"), "class Stub {}").map_err(EngineError::new)?;
            }
        }
        self.recording.borrow_mut().compiled = true;

        match &self.outcome {
            Outcome::Succeed | Outcome::RefuseCreation => Ok(()),
            Outcome::Fail(message) => Err(EngineError::msg(message)),
            Outcome::Panic => panic!("engine crashed"),
        }
    }
}
