// NFT Raffle Client - Connection
use async_trait::async_trait;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};

use crate::error::ClientError;

/// Round trips the client needs from a cluster.
///
/// `send_and_confirm` returns only once the transaction has reached the
/// commitment the implementation targets. An on-chain failure is reported as
/// `ClientError::Transaction` so the program's error code survives.
#[async_trait]
pub trait RaffleConnection: Send {
    async fn get_account(&mut self, address: &Pubkey) -> Result<Option<Account>, ClientError>;

    async fn get_latest_blockhash(&mut self) -> Result<Hash, ClientError>;

    async fn send_and_confirm(&mut self, transaction: Transaction) -> Result<Signature, ClientError>;

    /// Log messages of a confirmed transaction
    async fn get_transaction_logs(&mut self, signature: &Signature) -> Result<Vec<String>, ClientError>;
}
