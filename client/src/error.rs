// NFT Raffle Client - Errors
use nft_raffle::error::RaffleError;
use solana_sdk::{
    instruction::InstructionError, program_error::ProgramError, pubkey::Pubkey,
    signature::Signature, transaction::TransactionError,
};
use std::convert::TryFrom;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The connection could not complete a round trip
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transaction failed: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    /// Rejected before submission with the code the program would return
    #[error(transparent)]
    Raffle(#[from] RaffleError),

    #[error("Raffle {0} not found")]
    RaffleNotFound(u64),

    #[error("Program ledger is not initialized")]
    LedgerNotInitialized,

    #[error("Sysvar {0} is unavailable")]
    MissingSysvar(Pubkey),

    #[error("Mint {0} not found")]
    MintNotFound(Pubkey),

    #[error("Mint {mint} is owned by {owner}, which is not a token program")]
    UnsupportedTokenProgram { mint: Pubkey, owner: Pubkey },

    #[error("Creator token account {0} does not exist")]
    CreatorTokenAccountMissing(Pubkey),

    #[error("No WinnerSelected event in transaction {0}")]
    WinnerEventNotFound(Signature),

    #[error("WinnerSelected event names raffle {found}, expected {expected}")]
    EventRaffleMismatch { expected: Pubkey, found: Pubkey },
}

impl ClientError {
    /// The raffle condition behind this error, whether it was raised on-chain
    /// or caught before submission
    pub fn raffle_error(&self) -> Option<RaffleError> {
        match self {
            ClientError::Raffle(e) => Some(*e),
            ClientError::Transaction(TransactionError::InstructionError(
                _,
                InstructionError::Custom(code),
            ))
            | ClientError::Program(ProgramError::Custom(code)) => RaffleError::try_from(*code).ok(),
            _ => None,
        }
    }
}
