// NFT Raffle Client - Token account resolver
use log::debug;
use nft_raffle::token::TokenVariant;
use solana_sdk::pubkey::Pubkey;

use crate::{connection::RaffleConnection, error::ClientError};

/// Token accounts the prize moves between, derived under one variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrizeAccounts {
    pub variant: TokenVariant,
    pub creator_token_account: Pubkey,
    pub winner_token_account: Pubkey,
}

impl PrizeAccounts {
    pub fn derive(variant: TokenVariant, mint: &Pubkey, creator: &Pubkey, winner: &Pubkey) -> Self {
        let accounts = Self {
            variant,
            creator_token_account: variant.associated_token_address(creator, mint),
            winner_token_account: variant.associated_token_address(winner, mint),
        };
        debug!(
            "Prize accounts for mint {} under {:?}: creator={} winner={}",
            mint, variant, accounts.creator_token_account, accounts.winner_token_account
        );
        accounts
    }
}

/// Classify `mint` by the program that owns its account.
///
/// Nothing is cached; every call reads the mint again.
pub async fn resolve_token_program<C: RaffleConnection>(
    connection: &mut C,
    mint: &Pubkey,
) -> Result<TokenVariant, ClientError> {
    let account = connection
        .get_account(mint)
        .await?
        .ok_or(ClientError::MintNotFound(*mint))?;
    let variant = TokenVariant::from_program_id(&account.owner).ok_or(
        ClientError::UnsupportedTokenProgram {
            mint: *mint,
            owner: account.owner,
        },
    )?;
    debug!("Mint {} is held by the {:?} token program", mint, variant);
    Ok(variant)
}
