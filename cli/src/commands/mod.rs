//! CLI command implementations

mod auction;
mod ballot;

pub use auction::AuctionCommand;
pub use ballot::BallotCommand;
