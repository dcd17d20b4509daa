//! meetcheck - conformance harness for the meeting-recorder backend
//!
//! Drives the backend's HTTP and WebSocket surfaces the way the browser
//! extension does and checks the records it leaves in the database.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use meetcheck::common::logging;
use meetcheck::{cli, commands};

#[derive(Parser)]
#[command(name = "meetcheck", about = "Conformance harness for the meeting-recorder backend")]
#[command(version, long_about = None)]
struct Cli {
    /// Debug-level logging, including raw WebSocket frames
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to a file (default location when no path is given)
    #[arg(long, global = true, num_args = 0..=1, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_path = match cli.log_file {
        Some(Some(path)) => Some(path),
        Some(None) => logging::default_log_path(),
        None => None,
    };
    let guard = logging::init_cli(log_path.as_deref(), cli.verbose);

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        // exit() skips destructors; flush the log file first
        drop(guard);
        std::process::exit(1);
    }
}
