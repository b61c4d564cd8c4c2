//! bootmeta - boot metadata editor for consoles reachable as a mounted
//! filesystem
//!
//! Usage:
//!   bootmeta --root <dir> <command> [args]
//!   bootmeta --help

use tracing_subscriber::EnvFilter;

mod cli;
mod worker;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        cli::print_help();
        return Ok(());
    }

    match cli::parse_args(&args) {
        Ok((command, options)) => cli::run(command, options),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            cli::print_help();
            std::process::exit(1);
        }
    }
}
