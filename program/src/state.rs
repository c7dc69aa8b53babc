// NFT Raffle Program - State
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::error::RaffleError;

/// Length of the account discriminator that prefixes every record.
pub const DISCRIMINATOR_LEN: usize = 8;

/// `sha256("account:ProgramState")[..8]`
pub const LEDGER_DISCRIMINATOR: [u8; DISCRIMINATOR_LEN] =
    [0x4d, 0xd1, 0x89, 0xe5, 0x95, 0x43, 0xa7, 0xe6];

/// `sha256("account:Raffle")[..8]`
pub const RAFFLE_DISCRIMINATOR: [u8; DISCRIMINATOR_LEN] =
    [0x8f, 0x85, 0x3f, 0xad, 0x8a, 0x0a, 0x8e, 0xc8];

/// Smallest accepted `max_entries` is one above this.
pub const MIN_MAX_ENTRIES_EXCLUSIVE: u8 = 1;
/// Largest accepted `max_entries` is one below this.
pub const MAX_MAX_ENTRIES_EXCLUSIVE: u8 = u8::MAX;

/// Singleton ledger tracking raffle creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLedger {
    pub initialized: bool,
    /// Number of raffles created so far, also the cid of the newest raffle
    pub raffle_count: u64,
    /// Account that initialized the program
    pub deployer: Pubkey,
}

impl ProgramLedger {
    /// Cid the next created raffle will receive
    pub fn next_cid(&self) -> Option<u64> {
        self.raffle_count.checked_add(1)
    }
}

impl Sealed for ProgramLedger {}

impl IsInitialized for ProgramLedger {
    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Pack for ProgramLedger {
    const LEN: usize = DISCRIMINATOR_LEN + 1 + 8 + 32;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, ProgramLedger::LEN];
        let (discriminator, initialized, raffle_count, deployer) =
            array_refs![src, DISCRIMINATOR_LEN, 1, 8, 32];

        if *discriminator != LEDGER_DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }

        let initialized = match initialized[0] {
            0 => false,
            1 => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(ProgramLedger {
            initialized,
            raffle_count: u64::from_le_bytes(*raffle_count),
            deployer: Pubkey::new_from_array(*deployer),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, ProgramLedger::LEN];
        let (discriminator_dst, initialized_dst, raffle_count_dst, deployer_dst) =
            mut_array_refs![dst, DISCRIMINATOR_LEN, 1, 8, 32];

        *discriminator_dst = LEDGER_DISCRIMINATOR;
        initialized_dst[0] = self.initialized as u8;
        *raffle_count_dst = self.raffle_count.to_le_bytes();
        deployer_dst.copy_from_slice(self.deployer.as_ref());
    }
}

/// One raffle, stored at `["raffle", cid]`
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RaffleRecord {
    /// Sequential identifier, equal to the ledger count at creation
    pub cid: u64,
    pub creator: Pubkey,
    /// Mint of the prize NFT
    pub nft_mint: Pubkey,
    /// Minimum lamports accepted per entry
    pub entry_fee: u64,
    pub max_entries: u8,
    /// Entrants in entry order, never duplicated
    pub entries: Vec<Pubkey>,
    /// Selection slot written while a winner is being drawn
    pub partial_winner: Pubkey,
    /// Default pubkey until a winner is drawn, then never changes
    pub winner: Pubkey,
    pub active: bool,
    /// Held only for the duration of a single winner draw
    pub locked: bool,
    /// Unix timestamp after which entries are refused
    pub expiry_date: UnixTimestamp,
}

impl RaffleRecord {
    pub fn new(
        cid: u64,
        creator: Pubkey,
        nft_mint: Pubkey,
        entry_fee: u64,
        max_entries: u8,
        expiry_date: UnixTimestamp,
    ) -> Self {
        Self {
            cid,
            creator,
            nft_mint,
            entry_fee,
            max_entries,
            entries: Vec::with_capacity(max_entries as usize),
            partial_winner: Pubkey::default(),
            winner: Pubkey::default(),
            active: true,
            locked: false,
            expiry_date,
        }
    }

    /// Bytes needed to store a raffle holding up to `max_entries` entrants
    pub fn space(max_entries: u8) -> usize {
        DISCRIMINATOR_LEN
            + 8 // cid
            + 32 // creator
            + 32 // nft_mint
            + 8 // entry_fee
            + 1 // max_entries
            + 4 + 32 * max_entries as usize // entries
            + 32 // partial_winner
            + 32 // winner
            + 1 // active
            + 1 // locked
            + 8 // expiry_date
    }

    /// Check the creation parameters that do not depend on other accounts
    pub fn validate_params(
        entry_fee: u64,
        max_entries: u8,
        expiry_date: UnixTimestamp,
        now: UnixTimestamp,
    ) -> Result<(), RaffleError> {
        if entry_fee == 0 {
            return Err(RaffleError::InvalidEntryFee);
        }
        if max_entries <= MIN_MAX_ENTRIES_EXCLUSIVE || max_entries >= MAX_MAX_ENTRIES_EXCLUSIVE {
            return Err(RaffleError::InvalidMaxEntries);
        }
        if expiry_date <= now {
            return Err(RaffleError::InvalidExpiryDate);
        }
        Ok(())
    }

    pub fn has_winner(&self) -> bool {
        self.winner != Pubkey::default()
    }

    pub fn has_expired(&self, now: UnixTimestamp) -> bool {
        now >= self.expiry_date
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_entries as usize
    }

    pub fn has_entered(&self, participant: &Pubkey) -> bool {
        self.entries.contains(participant)
    }

    /// Decode a record from account data, ignoring trailing free space
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        if data.len() < DISCRIMINATOR_LEN || data[..DISCRIMINATOR_LEN] != RAFFLE_DISCRIMINATOR {
            return Err(ProgramError::InvalidAccountData);
        }
        let mut rest = &data[DISCRIMINATOR_LEN..];
        Self::deserialize(&mut rest).map_err(|_| ProgramError::InvalidAccountData)
    }

    /// Encode the record at the start of `dst`
    pub fn pack(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        if dst.len() < DISCRIMINATOR_LEN {
            return Err(ProgramError::AccountDataTooSmall);
        }
        let (discriminator_dst, mut body_dst) = dst.split_at_mut(DISCRIMINATOR_LEN);
        discriminator_dst.copy_from_slice(&RAFFLE_DISCRIMINATOR);
        self.serialize(&mut body_dst)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }
}
