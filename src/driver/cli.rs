//! CLI parsing and configuration module
//!
//! This module handles command-line argument parsing using clap and
//! maps the parsed options onto a [`BuildConfiguration`].

use clap::Parser as CliParser;
use std::path::PathBuf;

use super::config::{BuildConfiguration, JointOptions};

/// CLI interface using clap
#[derive(CliParser, Debug, Default)]
#[clap(
    name = "fsc",
    about = "Compile source files with an external compilation engine",
    override_usage = "fsc [OPTIONS] <SOURCE_FILES>...",
    version,
    disable_version_flag = true
)]
pub struct Cli {
    /// Source files; `@FILE` reads one file name per line from FILE
    #[clap(value_name = "SOURCE_FILES")]
    pub files: Vec<String>,

    /// Specify where to find the class files
    #[clap(long = "classpath", visible_alias = "cp", value_name = "PATH")]
    pub classpath: Option<String>,

    /// Specify where to find the source files
    #[clap(long, value_name = "PATH")]
    pub sourcepath: Option<String>,

    /// Specify the directory that holds temporary stub directories
    #[clap(long = "temp", value_name = "DIR")]
    pub temp: Option<PathBuf>,

    /// Specify the encoding of the source files
    #[clap(long, value_name = "ENCODING")]
    pub encoding: Option<String>,

    /// Specify where to place generated class files
    #[clap(short = 'd', value_name = "DIR")]
    pub target_directory: Option<PathBuf>,

    /// Print the version
    #[clap(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub version: Option<bool>,

    /// Print the full error trace on failure
    #[clap(short = 'e', long = "exception")]
    pub exception: bool,

    /// Attach the foreign-language compiler to compile its sources jointly
    #[clap(short = 'j', long = "jointCompilation")]
    pub joint_compilation: bool,

    /// Name-value pairs to pass to the foreign compiler
    #[clap(short = 'J', value_name = "property=value", action = clap::ArgAction::Append)]
    pub named_values: Vec<String>,

    /// Flags to pass to the foreign compiler during joint compilation
    #[clap(short = 'F', value_name = "flag", action = clap::ArgAction::Append)]
    pub flags: Vec<String>,

    /// Compilation engine executable
    #[clap(long, env = "FSC_ENGINE", value_name = "PROGRAM")]
    pub engine: Option<PathBuf>,

    /// Enable verbose diagnostic output
    #[clap(long)]
    pub verbose: bool,
}

impl Cli {
    /// Convert CLI arguments into a build configuration
    pub fn into_config(&self) -> BuildConfiguration {
        // -J and -F only matter when joint compilation is on
        let joint = self
            .joint_compilation
            .then(|| JointOptions::new(self.named_values.clone(), self.flags.clone()));

        BuildConfiguration {
            classpath: self.classpath.clone(),
            sourcepath: self.sourcepath.clone(),
            target_directory: self.target_directory.clone(),
            source_encoding: self.encoding.clone(),
            temp_directory: self.temp.clone(),
            joint,
        }
    }
}
