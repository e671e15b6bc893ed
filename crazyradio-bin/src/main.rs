mod config;
mod info;
mod os_signal;
mod rx;
mod scan;
mod tx;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::Context;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Open one specific Crazyradio, by its position in the USB device list
    #[arg(short = 'd', long, global = true)]
    index: Option<usize>,

    /// Log more detail to stderr. Repeat for library debug output.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Info(info::Cmd),
    Rx(rx::Cmd),
    Tx(tx::Cmd),
    Scan(scan::Cmd),
}

fn log_filter(verbose: u8) -> EnvFilter {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.verbose))
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Info(c) = &args.command {
        return c.cmd(args.index);
    }

    let radio = crazyradio::open_radio(args.index).wrap_err("Failed to open Crazyradio")?;
    tracing::info!(
        "Using {} (serial {}), firmware {}",
        radio.model().unwrap_or("Crazyradio"),
        radio.serial().unwrap_or("unknown"),
        radio.firmware()
    );

    match args.command {
        Commands::Info(_) => unreachable!("Should've executed the Info command earlier"),
        Commands::Rx(c) => c.cmd(radio),
        Commands::Tx(c) => c.cmd(radio),
        Commands::Scan(c) => c.cmd(radio),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_subcommands() {
        let cli = Cli::try_parse_from(["crazyradio", "-d", "1", "rx", "-c", "80", "--rate", "250k"])
            .unwrap();
        assert_eq!(cli.index, Some(1));
        assert!(matches!(cli.command, Commands::Rx(_)));

        let cli = Cli::try_parse_from(["crazyradio", "tx", "-p", "-12", "-n", "5", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Commands::Tx(_)));

        let cli = Cli::try_parse_from(["crazyradio", "scan", "--start", "10", "--packet", "ff01"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Scan(_)));

        assert!(Cli::try_parse_from(["crazyradio", "rx", "--rate", "5M"]).is_err());
        assert!(
            Cli::try_parse_from(["crazyradio", "tx", "--ard_us", "500", "--ard_bytes", "4"])
                .is_err()
        );
    }
}
