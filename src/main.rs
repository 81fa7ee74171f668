use clap::Parser;
use pdf_locker::utils;
use pdf_locker::{cli, error, lock, wizard, LockerConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

fn run() -> error::Result<i32> {
    let cli = cli::Cli::parse();
    let config = LockerConfig::default()
        .with_qpdf(cli.qpdf)
        .with_extensions(&cli.extensions);
    match cli.command {
        cli::Command::Lock(args) => {
            if !args.json {
                utils::print_banner();
            }
            let report = lock::lock(args, &config)?;
            Ok(exit_code(&report))
        }
        cli::Command::Scan(args) => {
            lock::scan(args, &config)?;
            Ok(0)
        }
        cli::Command::Wizard(args) => {
            utils::print_banner();
            let report = wizard::run(args, &config)?;
            Ok(exit_code(&report))
        }
    }
}

fn exit_code(report: &pdf_locker::ResultReport) -> i32 {
    if report.is_clean() {
        0
    } else {
        2
    }
}
