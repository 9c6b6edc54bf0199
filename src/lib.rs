//! A command-line compiler driver that hands source files to an external
//! compilation engine and manages the stub directory used for joint compilation.

/// Contains the compiler driver.
pub mod driver;
/// Contains the compilation engine seam.
pub mod engine;
/// Contains the error types and the error reporter.
pub mod error;
pub mod file;
/// Contains the logger setup.
pub mod logger;
pub mod scratch;

pub mod test_utils;

pub use driver::cli::Cli;
pub use driver::compiler::{CompilationDriver, RunReport};
pub use driver::config::{BuildConfiguration, JointOptions};
pub use error::DriverError;
