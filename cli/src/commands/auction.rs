//! Auction round command

use anyhow::{bail, Context};
use clap::Args;
use tracing::info;

use obscura::prelude::*;

/// Run a complete sealed-bid auction round in-process
#[derive(Args)]
pub struct AuctionCommand {
    /// Comma-separated name=amount bids
    #[arg(long, default_value = "alice=5,bob=8,carol=3")]
    bids: String,

    /// Bidding window in seconds
    #[arg(long, default_value_t = 3600)]
    window: u64,

    /// Flat escrow deposit per bidder (deliberately unrelated to the bid,
    /// which stays sealed)
    #[arg(long, default_value_t = 100)]
    deposit: u64,
}

impl AuctionCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let bids = parse_bids(&self.bids)?;
        if bids.is_empty() {
            bail!("at least one bid is required");
        }

        info!("setting up FHE service (key generation takes a while)");
        let mut host = LocalHost::new().context("FHE service setup failed")?;
        let encryptor = host.encryptor();

        let creator = Identity::derive("auction-creator");
        let opened_at = 0;
        let closes_at = self.window;
        let id = host.open_auction(creator, opened_at, closes_at)?;
        println!("auction {} open for {} seconds", id.short_hex(), self.window);

        for (i, (name, amount)) in bids.iter().enumerate() {
            let bidder = Identity::derive(name);
            let input = encryptor.encrypt_u64(*amount)?;
            host.place_bid(&id, bidder, &input, self.deposit, opened_at + 1 + i as u64)?;
            println!("{name} placed a sealed bid (escrow {})", self.deposit);
        }

        let result = host.reveal_auction(&id, &creator, closes_at + 1)?;
        let RevealedResult::Auction { winning_bid, winner } = result else {
            bail!("auction reveal returned a non-auction result");
        };

        let winner_name = winner.and_then(|identity| {
            bids.iter()
                .map(|(name, _)| name)
                .find(|name| Identity::derive(name) == identity)
        });
        match winner_name {
            Some(name) => println!("winner: {name} at {winning_bid}"),
            None => println!("no bid beat the zero floor"),
        }

        // Losing bidders reclaim their deposits
        for (name, _) in &bids {
            if Some(name) == winner_name {
                continue;
            }
            let refunded = host.refund(&id, &Identity::derive(name), closes_at + 2)?;
            println!("{name} refunded {refunded}");
        }

        host.remove(&id);
        Ok(())
    }
}

fn parse_bids(raw: &str) -> anyhow::Result<Vec<(String, u64)>> {
    raw.split(',')
        .map(|entry| {
            let (name, amount) = entry
                .trim()
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("invalid bid {entry:?}: expected name=amount"))?;
            let amount: u64 = amount
                .parse()
                .with_context(|| format!("invalid amount in bid {entry:?}"))?;
            Ok((name.trim().to_string(), amount))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bids() {
        assert_eq!(
            parse_bids("alice=5, bob=8").unwrap(),
            vec![("alice".to_string(), 5), ("bob".to_string(), 8)]
        );
        assert!(parse_bids("alice").is_err());
        assert!(parse_bids("alice=high").is_err());
    }
}
