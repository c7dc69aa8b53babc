// NFT Raffle Client
// Submit raffle instructions and settle expired raffles from off-chain

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod resolver;
pub mod settlement;

pub use client::{RaffleClient, RaffleFilter};
pub use config::SettlementConfig;
pub use connection::RaffleConnection;
pub use error::ClientError;
pub use settlement::Settlement;
