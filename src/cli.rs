use clap::Parser;
use std::path::PathBuf;

/// Interactive 3D scene editor shell
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Scene document to open - its name feeds the title bar and export file names
    #[arg(value_name = "FILE")]
    pub document: Option<PathBuf>,

    /// Camera preset to start from (home, front, back, left, right, top)
    #[arg(long = "preset", value_name = "KEY")]
    pub preset: Option<String>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}
