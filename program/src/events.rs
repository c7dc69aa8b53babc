// NFT Raffle Program - Events
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, pubkey::Pubkey};

/// `sha256("event:WinnerSelected")[..8]`
pub const WINNER_SELECTED_DISCRIMINATOR: [u8; 8] =
    [0xf5, 0x6e, 0x98, 0xad, 0xc1, 0x30, 0x85, 0x05];

/// Emitted by `PickWinner` once the winner is recorded
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinnerSelected {
    /// Address of the raffle record
    pub raffle: Pubkey,
    pub winner: Pubkey,
}

/// Every event the program logs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    WinnerSelected(WinnerSelected),
}

impl RaffleEvent {
    /// Discriminator followed by the borsh payload
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + 64);
        match self {
            RaffleEvent::WinnerSelected(event) => {
                buf.extend_from_slice(&WINNER_SELECTED_DISCRIMINATOR);
                buf.extend_from_slice(event.raffle.as_ref());
                buf.extend_from_slice(event.winner.as_ref());
            }
        }
        buf
    }

    /// Decode one logged payload. Unknown discriminators and short payloads
    /// yield `None`.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let (discriminator, mut payload) = data.split_at(8);
        if discriminator == WINNER_SELECTED_DISCRIMINATOR.as_ref() {
            WinnerSelected::deserialize(&mut payload)
                .ok()
                .map(RaffleEvent::WinnerSelected)
        } else {
            None
        }
    }

    /// Write the event to the transaction log as a `Program data:` entry
    pub fn emit(&self) {
        sol_log_data(&[&self.encode()]);
    }
}
