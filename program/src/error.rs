// NFT Raffle Program - Errors
use solana_program::{decode_error::DecodeError, program_error::ProgramError};
use std::convert::TryFrom;
use thiserror::Error;

/// Errors that may be returned by the raffle program.
///
/// Codes start at 6000 and keep the order of the deployed program so existing
/// clients decode them unchanged. New conditions are only ever appended.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    #[error("This program has already been initialized")]
    AlreadyInitialized = 6000,

    #[error("Entry fee must be greater than 0")]
    InvalidEntryFee,

    #[error("Maximum entries must be greater than 1 and less than 255")]
    InvalidMaxEntries,

    #[error("Invalid NFT mint address")]
    InvalidNftMint,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Raffle is not active")]
    RaffleNotActive,

    #[error("Raffle is not found")]
    RaffleNotFound,

    #[error("Amount is less than raffle entry fee")]
    InvalidRaffleEntryFee,

    #[error("Maximum number of entries reached")]
    MaxEntriesReached,

    #[error("User has already entered this raffle")]
    AlreadyEntered,

    #[error("Not enough entries found, must be at least 1")]
    NotEnoughEntries,

    #[error("Cannot close raffle when there are entries")]
    CannotCloseRaffleWithEntries,

    #[error("Operation is locked")]
    OperationLocked,

    #[error("NFT not transferred to raffle account")]
    NftNotTransferred,

    #[error("Invalid NFT supply")]
    InvalidNftSupply,

    #[error("Missing token accounts")]
    MissingTokenAccounts,

    #[error("Raffle has expired")]
    RaffleExpired,

    #[error("Invalid expiry date - must be in the future")]
    InvalidExpiryDate,

    #[error("Raffle has not expired yet")]
    RaffleNotExpired,

    #[error("Invalid token program")]
    InvalidTokenProgram,

    #[error("Raffle is still active")]
    RaffleStillActive,

    #[error("Winner is not the winner of the raffle")]
    WinnerNotTheWinner,

    #[error("No winner has been selected for this raffle")]
    NoWinnerSelected,

    #[error("A winner has already been selected for this raffle")]
    WinnerAlreadySelected,
}

impl RaffleError {
    pub const ALL: [RaffleError; 24] = [
        RaffleError::AlreadyInitialized,
        RaffleError::InvalidEntryFee,
        RaffleError::InvalidMaxEntries,
        RaffleError::InvalidNftMint,
        RaffleError::Unauthorized,
        RaffleError::RaffleNotActive,
        RaffleError::RaffleNotFound,
        RaffleError::InvalidRaffleEntryFee,
        RaffleError::MaxEntriesReached,
        RaffleError::AlreadyEntered,
        RaffleError::NotEnoughEntries,
        RaffleError::CannotCloseRaffleWithEntries,
        RaffleError::OperationLocked,
        RaffleError::NftNotTransferred,
        RaffleError::InvalidNftSupply,
        RaffleError::MissingTokenAccounts,
        RaffleError::RaffleExpired,
        RaffleError::InvalidExpiryDate,
        RaffleError::RaffleNotExpired,
        RaffleError::InvalidTokenProgram,
        RaffleError::RaffleStillActive,
        RaffleError::WinnerNotTheWinner,
        RaffleError::NoWinnerSelected,
        RaffleError::WinnerAlreadySelected,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for RaffleError {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        RaffleError::ALL
            .iter()
            .copied()
            .find(|e| e.code() == code)
            .ok_or(code)
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}
