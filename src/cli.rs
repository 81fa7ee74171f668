use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pdf-locker",
    version,
    about = "Add password protection (AES-256) to PDF files in batches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// qpdf executable used for encryption
    #[arg(long, global = true, value_name = "PROGRAM", env = "PDF_LOCKER_QPDF")]
    pub qpdf: Option<PathBuf>,
    /// Accepted document extensions (comma separated)
    #[arg(long = "ext", global = true, value_delimiter = ',', value_name = "EXT")]
    pub extensions: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Protect the given files (or folders with --recursive)
    Lock(LockArgs),
    /// Show how a drag-and-drop payload is split into files
    Scan(ScanArgs),
    /// Interactive session: drop files into the terminal, then lock them
    Wizard(WizardArgs),
}

#[derive(Args, Clone)]
pub struct LockArgs {
    /// Input files
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,
    /// Write protected copies here instead of next to each source
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    /// Password (prompted with confirmation when omitted)
    #[arg(
        short,
        long,
        value_name = "PASSWORD",
        env = "PDF_LOCKER_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,
    /// Descend into folders and pick up every document inside
    #[arg(short, long)]
    pub recursive: bool,
    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Raw payload, e.g. "{/a/b c.pdf} {/d.pdf}"; read from stdin when omitted
    #[arg(value_name = "PAYLOAD")]
    pub payload: Option<String>,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct WizardArgs {
    /// Default output folder offered by the session
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}
