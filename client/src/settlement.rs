// NFT Raffle Client - Winner settlement
use log::{debug, info};
use nft_raffle::{error::RaffleError, instruction, utils::find_raffle_address};
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use spl_associated_token_account::instruction::create_associated_token_account;

use crate::{
    client::RaffleClient, connection::RaffleConnection, error::ClientError,
    events::find_winner_selected, resolver::PrizeAccounts,
};

/// Outcome of a completed settlement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub winner: Pubkey,
    /// `None` when the winner was already recorded by an earlier attempt
    pub pick_winner_signature: Option<Signature>,
    /// `None` when the winner already had a token account for the mint
    pub token_account_signature: Option<Signature>,
    pub claim_signature: Signature,
}

impl<C: RaffleConnection> RaffleClient<C> {
    /// Draw the winner of an expired raffle and hand over the NFT.
    ///
    /// The draw is durable: if a later step fails the winner stays recorded,
    /// and calling this again resumes at the token account resolution.
    pub async fn settle_winner(&mut self, creator: &Keypair, cid: u64) -> Result<Settlement, ClientError> {
        let raffle = self.fetch_raffle(cid).await?;
        if !raffle.active {
            return Err(RaffleError::RaffleNotActive.into());
        }

        let (winner, pick_winner_signature) = if raffle.has_winner() {
            info!("Raffle {} already drawn for {}, resuming at claim", cid, raffle.winner);
            (raffle.winner, None)
        } else {
            // A winner must not be recorded for a prize that cannot move
            let variant = self.resolve_token_program(&raffle.nft_mint).await?;
            let creator_token_account =
                variant.associated_token_address(&creator.pubkey(), &raffle.nft_mint);
            if self.connection.get_account(&creator_token_account).await?.is_none() {
                return Err(ClientError::CreatorTokenAccountMissing(creator_token_account));
            }

            let (winner, signature) = self.draw_winner(creator, cid).await?;
            (winner, Some(signature))
        };

        let variant = self.resolve_token_program(&raffle.nft_mint).await?;
        let accounts = PrizeAccounts::derive(variant, &raffle.nft_mint, &creator.pubkey(), &winner);

        let token_account_signature = if self
            .connection
            .get_account(&accounts.winner_token_account)
            .await?
            .is_none()
        {
            let instructions = [
                ComputeBudgetInstruction::set_compute_unit_limit(self.config.compute_unit_limit),
                ComputeBudgetInstruction::set_compute_unit_price(
                    self.config.priority_fee_micro_lamports,
                ),
                create_associated_token_account(
                    &creator.pubkey(),
                    &winner,
                    &raffle.nft_mint,
                    &variant.token_program_id(),
                ),
            ];
            let signature = self.send(&instructions, creator).await?;
            info!(
                "Created token account {} for winner {}: {}",
                accounts.winner_token_account, winner, signature
            );
            Some(signature)
        } else {
            debug!("Winner token account {} exists", accounts.winner_token_account);
            None
        };

        let ix = instruction::claim_nft(
            &self.program_id,
            &creator.pubkey(),
            cid,
            &raffle.nft_mint,
            &accounts.creator_token_account,
            &accounts.winner_token_account,
            &variant.token_program_id(),
        );
        let claim_signature = self.send(&[ix], creator).await?;
        info!("Raffle {} settled, NFT sent to {}: {}", cid, winner, claim_signature);

        Ok(Settlement {
            winner,
            pick_winner_signature,
            token_account_signature,
            claim_signature,
        })
    }

    /// Submit `PickWinner` and read the winner back from its event
    async fn draw_winner(&mut self, creator: &Keypair, cid: u64) -> Result<(Pubkey, Signature), ClientError> {
        let ix = instruction::pick_winner(&self.program_id, &creator.pubkey(), cid);
        let signature = self.send(&[ix], creator).await?;
        info!("Winner drawn for raffle {}: {}", cid, signature);

        let logs = self.connection.get_transaction_logs(&signature).await?;
        let event = find_winner_selected(&logs, &self.program_id)
            .ok_or(ClientError::WinnerEventNotFound(signature))?;

        let (expected, _) = find_raffle_address(&self.program_id, cid);
        if event.raffle != expected {
            return Err(ClientError::EventRaffleMismatch {
                expected,
                found: event.raffle,
            });
        }
        Ok((event.winner, signature))
    }
}
