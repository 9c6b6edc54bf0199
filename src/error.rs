use std::error::Error as StdError;
use std::io::{self, Write};

use thiserror::Error;

use crate::engine::EngineError;
use crate::file::ResolveError;
use crate::scratch::ScratchDirError;

/// Error types for the compiler driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{count} source file(s) missing or unreadable")]
    InvalidSources { count: usize },

    #[error("could not create a stub directory")]
    ScratchDir(#[from] ScratchDirError),

    #[error("compilation failed")]
    Engine(#[from] EngineError),

    #[error("no compilation engine configured, use --engine or set FSC_ENGINE")]
    NoEngine,
}

/// Write `err` for the user.
///
/// The short form puts the error and its causes on one line. With
/// `show_trace` every cause gets its own line, followed by the debug
/// representation of the whole error.
pub fn report(err: &dyn StdError, show_trace: bool, out: &mut dyn Write) -> io::Result<()> {
    let causes = std::iter::successors(err.source(), |&e| e.source());

    if show_trace {
        writeln!(out, "error: {}", err)?;
        for (i, cause) in causes.enumerate() {
            if i == 0 {
                writeln!(out, "caused by:")?;
            }
            writeln!(out, "    {}: {}", i, cause)?;
        }
        writeln!(out, "trace: {:#?}", err)?;
    } else {
        write!(out, "error: {}", err)?;
        for cause in causes {
            write!(out, ": {}", cause)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write a plain `error: ...` line.
pub fn report_message(message: impl std::fmt::Display, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "error: {}", message)
}
