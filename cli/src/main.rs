//! OBSCURA CLI
//!
//! Runs complete sealed rounds against an in-process FHE service.
//!
//! # Usage
//!
//! ```bash
//! # Tally three encrypted yes/no votes over a one-hour window
//! obscura ballot --votes 1,0,1 --window 3600
//!
//! # Resolve a sealed-bid auction
//! obscura auction --bids alice=5,bob=8,carol=3
//!
//! # Show version information
//! obscura version
//! ```

use clap::{Parser, Subcommand};

mod commands;
mod logging;

use commands::{AuctionCommand, BallotCommand};

/// OBSCURA sealed-round demo
#[derive(Parser)]
#[command(name = "obscura")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sealed-round engine for encrypted ballots and auctions", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a private ballot round
    Ballot(BallotCommand),

    /// Run a sealed-bid auction round
    Auction(AuctionCommand),

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Ballot(cmd) => cmd.execute(),
        Commands::Auction(cmd) => cmd.execute(),
        Commands::Version => {
            println!("obscura {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
