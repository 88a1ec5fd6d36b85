//! Ballot round command

use anyhow::{bail, Context};
use clap::Args;
use tracing::info;

use obscura::prelude::*;

/// Run a complete private ballot round in-process
#[derive(Args)]
pub struct BallotCommand {
    /// Comma-separated 0/1 votes to cast
    #[arg(long, default_value = "1,0,1")]
    votes: String,

    /// Collection window in seconds
    #[arg(long, default_value_t = 3600)]
    window: u64,
}

impl BallotCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let votes = parse_votes(&self.votes)?;
        if votes.is_empty() {
            bail!("at least one vote is required");
        }

        info!("setting up FHE service (key generation takes a while)");
        let mut host = LocalHost::new().context("FHE service setup failed")?;
        let encryptor = host.encryptor();

        let creator = Identity::derive("ballot-creator");
        let opened_at = 0;
        let closes_at = self.window;
        let id = host.open_ballot(creator, opened_at, closes_at)?;
        println!("ballot {} open for {} seconds", id.short_hex(), self.window);

        for (i, &choice) in votes.iter().enumerate() {
            let voter = Identity::derive(&format!("voter-{i}"));
            let input = encryptor.encrypt_choice(choice)?;
            host.cast_vote(&id, voter, &input, opened_at + 1 + i as u64)?;
            println!("voter-{i} cast an encrypted vote");
        }

        let result = host.reveal_ballot(&id, &creator, closes_at + 1)?;
        if let RevealedResult::Tally { yes, no } = result {
            println!("revealed tally: yes={yes} no={no}");
        }

        host.remove(&id);
        Ok(())
    }
}

fn parse_votes(raw: &str) -> anyhow::Result<Vec<bool>> {
    raw.split(',')
        .map(|vote| match vote.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => bail!("invalid vote {other:?}: expected 0 or 1"),
        })
        .collect()
}
