// NFT Raffle Client - Instruction wrappers
use log::{debug, info};
use nft_raffle::{
    instruction,
    state::{ProgramLedger, RaffleRecord},
    token::TokenVariant,
    utils::{find_ledger_address, find_raffle_address},
};
use solana_sdk::{
    account::from_account,
    clock::{Clock, UnixTimestamp},
    instruction::Instruction,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    sysvar,
    transaction::Transaction,
};

use crate::{
    config::SettlementConfig, connection::RaffleConnection, error::ClientError,
    resolver::resolve_token_program,
};

/// Which raffles `fetch_raffles` returns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleFilter {
    All,
    /// Still accepting entries or awaiting settlement
    Active,
    /// Settled, the NFT has been claimed
    Closed,
}

impl RaffleFilter {
    pub fn matches(self, raffle: &RaffleRecord) -> bool {
        match self {
            RaffleFilter::All => true,
            RaffleFilter::Active => raffle.active,
            RaffleFilter::Closed => !raffle.active,
        }
    }
}

/// Drives one deployment of the raffle program through a connection
pub struct RaffleClient<C> {
    pub(crate) connection: C,
    pub(crate) program_id: Pubkey,
    pub(crate) config: SettlementConfig,
}

impl<C: RaffleConnection> RaffleClient<C> {
    pub fn new(connection: C, program_id: Pubkey) -> Self {
        Self::with_config(connection, program_id, SettlementConfig::default())
    }

    pub fn with_config(connection: C, program_id: Pubkey, config: SettlementConfig) -> Self {
        Self {
            connection,
            program_id,
            config,
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn into_connection(self) -> C {
        self.connection
    }

    pub async fn fetch_ledger(&mut self) -> Result<ProgramLedger, ClientError> {
        let (address, _) = find_ledger_address(&self.program_id);
        let account = self
            .connection
            .get_account(&address)
            .await?
            .filter(|account| account.owner == self.program_id)
            .ok_or(ClientError::LedgerNotInitialized)?;
        Ok(ProgramLedger::unpack(&account.data)?)
    }

    pub async fn fetch_raffle(&mut self, cid: u64) -> Result<RaffleRecord, ClientError> {
        let (address, _) = find_raffle_address(&self.program_id, cid);
        let account = self
            .connection
            .get_account(&address)
            .await?
            .filter(|account| account.owner == self.program_id)
            .ok_or(ClientError::RaffleNotFound(cid))?;
        RaffleRecord::unpack(&account.data)
            .ok()
            .filter(|raffle| raffle.cid == cid)
            .ok_or(ClientError::RaffleNotFound(cid))
    }

    /// Every stored raffle matching `filter`, in cid order.
    ///
    /// Cids run from 1 to the ledger count; records removed by `close` are
    /// skipped.
    pub async fn fetch_raffles(&mut self, filter: RaffleFilter) -> Result<Vec<RaffleRecord>, ClientError> {
        let count = self.fetch_ledger().await?.raffle_count;
        let mut raffles = Vec::new();
        for cid in 1..=count {
            match self.fetch_raffle(cid).await {
                Ok(raffle) if filter.matches(&raffle) => raffles.push(raffle),
                Ok(_) => {}
                Err(ClientError::RaffleNotFound(_)) => debug!("Raffle {} was closed", cid),
                Err(e) => return Err(e),
            }
        }
        Ok(raffles)
    }

    pub async fn fetch_raffles_by_creator(&mut self, creator: &Pubkey) -> Result<Vec<RaffleRecord>, ClientError> {
        let raffles = self.fetch_raffles(RaffleFilter::All).await?;
        Ok(raffles
            .into_iter()
            .filter(|raffle| raffle.creator == *creator)
            .collect())
    }

    pub async fn resolve_token_program(&mut self, mint: &Pubkey) -> Result<TokenVariant, ClientError> {
        resolve_token_program(&mut self.connection, mint).await
    }

    pub async fn initialize_ledger(&mut self, deployer: &Keypair) -> Result<Signature, ClientError> {
        let ix = instruction::initialize_ledger(&self.program_id, &deployer.pubkey());
        let signature = self.send(&[ix], deployer).await?;
        info!("Ledger initialized by {}: {}", deployer.pubkey(), signature);
        Ok(signature)
    }

    /// Create a raffle for an NFT the creator holds in its associated account.
    ///
    /// The parameters are checked against the cluster clock first so a doomed
    /// raffle costs no fee. Returns the new cid.
    pub async fn create_raffle(
        &mut self,
        creator: &Keypair,
        nft_mint: &Pubkey,
        entry_fee: u64,
        max_entries: u8,
        expiry_date: UnixTimestamp,
    ) -> Result<(u64, Signature), ClientError> {
        let clock = self.fetch_clock().await?;
        RaffleRecord::validate_params(entry_fee, max_entries, expiry_date, clock.unix_timestamp)?;

        let variant = self.resolve_token_program(nft_mint).await?;
        let creator_token_account = variant.associated_token_address(&creator.pubkey(), nft_mint);

        let cid = self
            .fetch_ledger()
            .await?
            .next_cid()
            .ok_or(ClientError::LedgerNotInitialized)?;
        let ix = instruction::create_raffle(
            &self.program_id,
            &creator.pubkey(),
            cid,
            nft_mint,
            &creator_token_account,
            entry_fee,
            max_entries,
            expiry_date,
        );
        let signature = self.send(&[ix], creator).await?;
        info!("Raffle {} created for mint {}: {}", cid, nft_mint, signature);
        Ok((cid, signature))
    }

    pub async fn enter_raffle(
        &mut self,
        participant: &Keypair,
        cid: u64,
        amount: u64,
    ) -> Result<Signature, ClientError> {
        let ix = instruction::enter_raffle(&self.program_id, &participant.pubkey(), cid, amount);
        let signature = self.send(&[ix], participant).await?;
        info!("{} entered raffle {}: {}", participant.pubkey(), cid, signature);
        Ok(signature)
    }

    pub async fn close_raffle(&mut self, creator: &Keypair, cid: u64) -> Result<Signature, ClientError> {
        let ix = instruction::close_raffle(&self.program_id, &creator.pubkey(), cid);
        let signature = self.send(&[ix], creator).await?;
        info!("Raffle {} closed: {}", cid, signature);
        Ok(signature)
    }

    pub(crate) async fn fetch_clock(&mut self) -> Result<Clock, ClientError> {
        let account = self
            .connection
            .get_account(&sysvar::clock::id())
            .await?
            .ok_or(ClientError::MissingSysvar(sysvar::clock::id()))?;
        from_account::<Clock, _>(&account).ok_or(ClientError::MissingSysvar(sysvar::clock::id()))
    }

    /// Sign with `payer` alone and wait for confirmation
    pub(crate) async fn send(
        &mut self,
        instructions: &[Instruction],
        payer: &Keypair,
    ) -> Result<Signature, ClientError> {
        let blockhash = self.connection.get_latest_blockhash().await?;
        let transaction =
            Transaction::new_signed_with_payer(instructions, Some(&payer.pubkey()), &[payer], blockhash);
        self.connection.send_and_confirm(transaction).await
    }
}
