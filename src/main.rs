use clap::Parser as ClapParser;
use fsc::Cli;
use fsc::driver::command_line_compile;
use fsc::{error, logger};
use std::io;
use std::process::exit;

/// The main entry point for the application.
///
/// Parses command-line arguments and runs the compiler.
fn main() {
    if !run() {
        exit(1);
    }
}

/// Runs the compiler and reports a failure on stderr.
///
/// # Returns
///
/// `true` when the compilation succeeded.
fn run() -> bool {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let mut stderr = io::stderr().lock();
    match command_line_compile(&cli, &mut stderr) {
        Ok(()) => true,
        Err(e) => {
            let _ = error::report(&e, cli.exception, &mut stderr);
            false
        }
    }
}
