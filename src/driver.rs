// Compiler driver module

use std::io::Write;

use clap::CommandFactory;
use log::debug;

use crate::engine::ProcessEngineFactory;
use crate::error::{DriverError, report, report_message};
use crate::file::{FileList, check_files};
use crate::scratch::ScratchDirectoryManager;

pub mod cli;
pub mod compiler;
pub mod config;

#[cfg(test)]
mod tests_compiler;

use cli::Cli;
use compiler::CompilationDriver;

/// Run a compilation as requested on the command line.
///
/// Prints the help text when no source files are given. Unreadable file
/// lists and missing or unreadable sources are reported on `err_out`, one
/// line each, before failing.
pub fn command_line_compile(cli: &Cli, err_out: &mut dyn Write) -> Result<(), DriverError> {
    let files = match FileList::resolve(&cli.files) {
        Ok(files) => files,
        Err(err) => {
            for failure in &err.failures {
                let _ = report(failure, cli.exception, err_out);
            }
            return Err(err.into());
        }
    };
    if files.is_empty() {
        let _ = Cli::command().print_help();
        return Ok(());
    }

    let errors = check_files(&files);
    if !errors.is_empty() {
        for error in &errors {
            let _ = report_message(error, err_out);
        }
        return Err(DriverError::InvalidSources { count: errors.len() });
    }

    let config = cli.into_config();
    let program = cli.engine.clone().ok_or(DriverError::NoEngine)?;
    debug!("Using compilation engine {}", program.display());

    let scratch = match &config.temp_directory {
        Some(base) => ScratchDirectoryManager::new(base),
        None => ScratchDirectoryManager::in_system_temp(),
    };
    let driver = CompilationDriver::with_scratch(ProcessEngineFactory::new(program), scratch);
    let report = driver.run(config, &files)?;
    if report.cleanup_failure.is_none()
        && let Some(dir) = &report.scratch_dir
    {
        debug!("Stub directory {} removed", dir.display());
    }
    Ok(())
}
