use super::compiler::*;
use super::config::{BuildConfiguration, JointOptions};
use crate::engine::{EngineFactory, EngineMode, EngineSettings, SourceLookup};
use crate::error::DriverError;
use crate::scratch::{DirectoryFactory, ScratchDirError, ScratchDirectoryManager};
use crate::test_utils::{Outcome, RecordingFactory};
use std::fs;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sources(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn joint_config() -> BuildConfiguration {
    BuildConfiguration {
        joint: Some(JointOptions::new(vec!["source=1.8".into()], vec![])),
        ..Default::default()
    }
}

fn driver(base: &TempDir, outcome: Outcome) -> CompilationDriver<RecordingFactory> {
    init_logger();
    CompilationDriver::with_scratch(
        RecordingFactory::new(outcome),
        ScratchDirectoryManager::new(base.path()),
    )
}

fn recording(driver: &CompilationDriver<RecordingFactory>) -> crate::test_utils::Recording {
    driver.factory().recording()
}

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[test]
fn test_plain_run_passes_sources_in_order() {
    let base = tempfile::tempdir().unwrap();
    let driver = driver(&base, Outcome::Succeed);

    let report = driver
        .run(BuildConfiguration::default(), &sources(&["A.src", "B.src"]))
        .expect("compilation failed");

    assert!(report.scratch_dir.is_none());
    assert!(report.cleanup_failure.is_none());
    let rec = recording(&driver);
    assert_eq!(rec.sources, vec!["A.src", "B.src"]);
    assert!(rec.compiled);
    assert_eq!(rec.settings.unwrap().mode, EngineMode::Plain);
    assert_eq!(rec.settings.unwrap().source_lookup, SourceLookup::Never);
    assert_eq!(entries(base.path()), 0);
}

#[test]
fn test_joint_run_injects_and_removes_stub_directory() {
    let base = tempfile::tempdir().unwrap();
    let driver = driver(&base, Outcome::Succeed);

    let report = driver
        .run(joint_config(), &sources(&["A.src", "J.java"]))
        .expect("compilation failed");

    let scratch = report.scratch_dir.expect("scratch directory");
    let rec = recording(&driver);
    let config = rec.config.unwrap();
    assert_eq!(config.stub_directory(), Some(scratch.as_path()));
    assert_eq!(config.joint.unwrap().named_values, vec!["source=1.8"]);
    assert_eq!(rec.settings.unwrap().mode, EngineMode::Joint);
    assert!(rec.stub_dir_existed);
    assert!(scratch.starts_with(base.path()));
    assert!(!scratch.exists());
    assert!(report.cleanup_failure.is_none());
}

#[test]
fn test_engine_failure_still_removes_stub_directory() {
    let base = tempfile::tempdir().unwrap();
    let driver = driver(&base, Outcome::Fail("2 errors".into()));

    let err = driver.run(joint_config(), &sources(&["A.src"])).unwrap_err();

    match err {
        DriverError::Engine(e) => assert_eq!(e.to_string(), "2 errors"),
        other => panic!("unexpected error: {:?}", other),
    }
    let rec = recording(&driver);
    assert!(rec.stub_dir_existed);
    let scratch = rec.config.unwrap().stub_directory().unwrap().to_path_buf();
    assert!(!scratch.exists());
    assert_eq!(entries(base.path()), 0);
}

#[test]
fn test_engine_creation_failure_removes_stub_directory() {
    let base = tempfile::tempdir().unwrap();
    let driver = driver(&base, Outcome::RefuseCreation);

    let err = driver.run(joint_config(), &sources(&["A.src"])).unwrap_err();
    assert!(matches!(err, DriverError::Engine(_)));
    assert_eq!(entries(base.path()), 0);
}

#[test]
fn test_engine_panic_still_removes_stub_directory() {
    let base = tempfile::tempdir().unwrap();
    let driver = driver(&base, Outcome::Panic);

    let result = catch_unwind(AssertUnwindSafe(|| {
        driver.run(joint_config(), &sources(&["A.src"]))
    }));

    assert!(result.is_err());
    assert!(recording(&driver).stub_dir_existed);
    assert_eq!(entries(base.path()), 0);
}

#[test]
fn test_explicit_stub_directory_is_left_alone() {
    let base = tempfile::tempdir().unwrap();
    let stubs = base.path().join("stubs");
    fs::create_dir(&stubs).unwrap();
    let driver = driver(&base, Outcome::Succeed);

    let config = BuildConfiguration {
        joint: Some(JointOptions::default().with_stub_directory(&stubs)),
        ..Default::default()
    };
    let report = driver.run(config, &sources(&["A.src"])).unwrap();

    assert!(report.scratch_dir.is_none());
    assert_eq!(recording(&driver).config.unwrap().stub_directory(), Some(stubs.as_path()));
    assert!(stubs.join("pkg/Stub.java").exists());
    assert_eq!(entries(base.path()), 1);
}

struct DeniedFactory;

impl DirectoryFactory for DeniedFactory {
    fn create_dir(&self, _base: &Path) -> io::Result<PathBuf> {
        Err(io::Error::from(io::ErrorKind::PermissionDenied))
    }
}

#[test]
fn test_scratch_failure_aborts_before_engine() {
    init_logger();
    let driver = CompilationDriver::with_scratch(
        RecordingFactory::new(Outcome::Succeed),
        ScratchDirectoryManager::with_factory("/scratch", DeniedFactory).with_retry_delay(Duration::ZERO),
    );

    let err = driver.run(joint_config(), &sources(&["A.src"])).unwrap_err();

    assert!(matches!(
        err,
        DriverError::ScratchDir(ScratchDirError::AccessDenied { attempts: 3, .. })
    ));
    let rec = driver.factory().recording();
    assert!(rec.config.is_none());
    assert!(!rec.compiled);
}

#[test]
fn test_concurrent_runs_use_distinct_directories() {
    let base = tempfile::tempdir().unwrap();
    let base_path = base.path().to_path_buf();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let base_path = base_path.clone();
            std::thread::spawn(move || {
                let driver = CompilationDriver::with_scratch(
                    RecordingFactory::new(Outcome::Succeed),
                    ScratchDirectoryManager::new(base_path),
                );
                let report = driver.run(joint_config(), &sources(&["A.src"])).unwrap();
                report.scratch_dir.unwrap()
            })
        })
        .collect();

    let mut dirs: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    dirs.sort();
    dirs.dedup();
    assert_eq!(dirs.len(), 4);
    assert_eq!(entries(base.path()), 0);
}

#[test]
fn test_supplied_engine_gets_stub_directory() {
    let base = tempfile::tempdir().unwrap();
    let driver = driver(&base, Outcome::Succeed);
    let config = joint_config();
    let settings = EngineSettings {
        mode: EngineMode::Joint,
        source_lookup: SourceLookup::Never,
    };
    let mut engine = driver.factory().create(&config, settings).unwrap();

    let report = driver
        .run_with_engine(config, &sources(&["A.src", "J.java"]), &mut engine)
        .expect("compilation failed");

    let scratch = report.scratch_dir.expect("scratch directory");
    let rec = recording(&driver);
    assert_eq!(rec.injected_stub_dir.as_deref(), Some(scratch.as_path()));
    assert!(rec.stub_dir_existed);
    assert_eq!(rec.sources, vec!["A.src", "J.java"]);
    assert!(!scratch.exists());
    assert_eq!(entries(base.path()), 0);
}

#[test]
fn test_supplied_engine_failure_removes_stub_directory() {
    let base = tempfile::tempdir().unwrap();
    let driver = driver(&base, Outcome::Fail("1 error".into()));
    let settings = EngineSettings {
        mode: EngineMode::Joint,
        source_lookup: SourceLookup::Never,
    };
    let mut engine = driver.factory().create(&joint_config(), settings).unwrap();

    let err = driver
        .run_with_engine(joint_config(), &sources(&["A.src"]), &mut engine)
        .unwrap_err();

    assert!(matches!(err, DriverError::Engine(_)));
    assert!(recording(&driver).injected_stub_dir.is_some());
    assert_eq!(entries(base.path()), 0);
}

#[test]
fn test_supplied_engine_without_scratch_directory() {
    let base = tempfile::tempdir().unwrap();
    let driver = driver(&base, Outcome::Succeed);
    let settings = EngineSettings {
        mode: EngineMode::Plain,
        source_lookup: SourceLookup::Never,
    };
    let mut engine = driver.factory().create(&BuildConfiguration::default(), settings).unwrap();

    let report = driver
        .run_with_engine(BuildConfiguration::default(), &sources(&["A.src"]), &mut engine)
        .unwrap();

    assert!(report.scratch_dir.is_none());
    assert!(recording(&driver).injected_stub_dir.is_none());
    assert!(recording(&driver).compiled);
}

#[cfg(target_os = "linux")]
mod cleanup_failure {
    use super::*;
    use crate::engine::{CompilationEngine, EngineError};

    /// Engine that leaves the stub directory untouched.
    struct QuietEngine {
        failure: Option<&'static str>,
    }

    impl CompilationEngine for QuietEngine {
        fn use_stub_directory(&mut self, _dir: &Path) {}

        fn add_sources(&mut self, _paths: &[String]) {}

        fn compile(&mut self) -> Result<(), EngineError> {
            match self.failure {
                Some(message) => Err(EngineError::msg(message)),
                None => Ok(()),
            }
        }
    }

    struct QuietFactory(Option<&'static str>);

    impl EngineFactory for QuietFactory {
        type Engine = QuietEngine;

        fn create(&self, _config: &BuildConfiguration, _settings: EngineSettings) -> Result<QuietEngine, EngineError> {
            Ok(QuietEngine { failure: self.0 })
        }
    }

    /// Hands out a procfs directory, which can't be deleted.
    struct UndeletableFactory;

    impl DirectoryFactory for UndeletableFactory {
        fn create_dir(&self, _base: &Path) -> io::Result<PathBuf> {
            Ok(PathBuf::from("/proc/self/fdinfo"))
        }
    }

    #[test]
    fn test_cleanup_failure_does_not_fail_the_run() {
        init_logger();
        let driver = CompilationDriver::with_scratch(
            QuietFactory(None),
            ScratchDirectoryManager::with_factory("/scratch", UndeletableFactory),
        );

        let report = driver.run(joint_config(), &sources(&["A.src"])).unwrap();

        assert_eq!(report.scratch_dir.as_deref(), Some(Path::new("/proc/self/fdinfo")));
        let failure = report.cleanup_failure.expect("cleanup failure");
        assert_eq!(failure.path, PathBuf::from("/proc/self/fdinfo"));
        assert_eq!(failure.to_string(), "could not delete temp files - /proc/self/fdinfo");
    }

    #[test]
    fn test_cleanup_failure_does_not_mask_engine_error() {
        init_logger();
        let driver = CompilationDriver::with_scratch(
            QuietFactory(Some("boom")),
            ScratchDirectoryManager::with_factory("/scratch", UndeletableFactory),
        );

        match driver.run(joint_config(), &sources(&["A.src"])) {
            Err(DriverError::Engine(e)) => assert_eq!(e.to_string(), "boom"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
