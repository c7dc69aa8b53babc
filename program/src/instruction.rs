// NFT Raffle Program - Instructions
use solana_program::{
    clock::UnixTimestamp,
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
    sysvar::slot_hashes,
};
use std::convert::TryInto;

use crate::utils::{find_ledger_address, find_raffle_address};

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the singleton program ledger
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The deployer, pays for the ledger account
    /// 1. `[writable]` The ledger account (PDA `["program_state"]`)
    /// 2. `[]` The system program
    InitializeLedger,

    /// Create a raffle for an NFT held by the creator
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The creator, pays for the raffle account
    /// 1. `[writable]` The ledger account
    /// 2. `[writable]` The raffle account (PDA `["raffle", ledger count + 1]`)
    /// 3. `[]` The NFT mint
    /// 4. `[]` The creator's token account holding the NFT
    /// 5. `[]` The system program
    CreateRaffle {
        nft_mint: Pubkey,
        /// Minimum lamports per entry
        entry_fee: u64,
        max_entries: u8,
        /// Unix timestamp after which entries are refused
        expiry_date: UnixTimestamp,
    },

    /// Pay into a raffle and join its entry list
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The participant
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle { cid: u64, amount: u64 },

    /// Draw a winner once the raffle has expired
    ///
    /// Accounts expected:
    /// 0. `[signer]` The raffle creator
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The SlotHashes sysvar
    PickWinner { cid: u64 },

    /// Move the NFT to the winner and release the entry fees to the creator
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The raffle creator
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The NFT mint
    /// 3. `[writable]` The creator's associated token account
    /// 4. `[writable]` The winner's associated token account
    /// 5. `[]` The token program owning the mint
    ClaimNft { cid: u64 },

    /// Close a raffle nobody has entered
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The raffle creator, receives the rent
    /// 1. `[writable]` The raffle account
    CloseRaffle { cid: u64 },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input.split_first().ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match tag {
            0 => Self::InitializeLedger,
            1 => {
                let (nft_mint, rest) = Self::unpack_pubkey(rest)?;
                let (entry_fee, rest) = Self::unpack_u64(rest)?;
                let (max_entries, rest) = Self::unpack_u8(rest)?;
                let (expiry_date, _) = Self::unpack_u64(rest)?;
                Self::CreateRaffle {
                    nft_mint,
                    entry_fee,
                    max_entries,
                    expiry_date: expiry_date as UnixTimestamp,
                }
            }
            2 => {
                let (cid, rest) = Self::unpack_u64(rest)?;
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { cid, amount }
            }
            3 => Self::PickWinner {
                cid: Self::unpack_u64(rest)?.0,
            },
            4 => Self::ClaimNft {
                cid: Self::unpack_u64(rest)?.0,
            },
            5 => Self::CloseRaffle {
                cid: Self::unpack_u64(rest)?.0,
            },
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 32 + 8 + 1 + 8);
        match *self {
            Self::InitializeLedger => buf.push(0),
            Self::CreateRaffle {
                ref nft_mint,
                entry_fee,
                max_entries,
                expiry_date,
            } => {
                buf.push(1);
                buf.extend_from_slice(nft_mint.as_ref());
                buf.extend_from_slice(&entry_fee.to_le_bytes());
                buf.push(max_entries);
                buf.extend_from_slice(&expiry_date.to_le_bytes());
            }
            Self::EnterRaffle { cid, amount } => {
                buf.push(2);
                buf.extend_from_slice(&cid.to_le_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::PickWinner { cid } => {
                buf.push(3);
                buf.extend_from_slice(&cid.to_le_bytes());
            }
            Self::ClaimNft { cid } => {
                buf.push(4);
                buf.extend_from_slice(&cid.to_le_bytes());
            }
            Self::CloseRaffle { cid } => {
                buf.push(5);
                buf.extend_from_slice(&cid.to_le_bytes());
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }

    fn unpack_u8(input: &[u8]) -> Result<(u8, &[u8]), ProgramError> {
        let (&value, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, rest))
    }

    fn unpack_pubkey(input: &[u8]) -> Result<(Pubkey, &[u8]), ProgramError> {
        let key = input
            .get(..32)
            .and_then(|slice| slice.try_into().ok())
            .map(Pubkey::new_from_array)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((key, &input[32..]))
    }
}

/// Create initialize_ledger instruction
pub fn initialize_ledger(program_id: &Pubkey, deployer: &Pubkey) -> Instruction {
    let (ledger, _) = find_ledger_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*deployer, true),
            AccountMeta::new(ledger, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::InitializeLedger.pack(),
    }
}

/// Create create_raffle instruction. `cid` must be the ledger count plus one.
#[allow(clippy::too_many_arguments)]
pub fn create_raffle(
    program_id: &Pubkey,
    creator: &Pubkey,
    cid: u64,
    nft_mint: &Pubkey,
    creator_token_account: &Pubkey,
    entry_fee: u64,
    max_entries: u8,
    expiry_date: UnixTimestamp,
) -> Instruction {
    let (ledger, _) = find_ledger_address(program_id);
    let (raffle, _) = find_raffle_address(program_id, cid);
    let data = RaffleInstruction::CreateRaffle {
        nft_mint: *nft_mint,
        entry_fee,
        max_entries,
        expiry_date,
    }
    .pack();

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*creator, true),
            AccountMeta::new(ledger, false),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(*nft_mint, false),
            AccountMeta::new_readonly(*creator_token_account, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(program_id: &Pubkey, participant: &Pubkey, cid: u64, amount: u64) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id, cid);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*participant, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::EnterRaffle { cid, amount }.pack(),
    }
}

/// Create pick_winner instruction
pub fn pick_winner(program_id: &Pubkey, creator: &Pubkey, cid: u64) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id, cid);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*creator, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(slot_hashes::id(), false),
        ],
        data: RaffleInstruction::PickWinner { cid }.pack(),
    }
}

/// Create claim_nft instruction
pub fn claim_nft(
    program_id: &Pubkey,
    creator: &Pubkey,
    cid: u64,
    nft_mint: &Pubkey,
    creator_token_account: &Pubkey,
    winner_token_account: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id, cid);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*creator, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(*nft_mint, false),
            AccountMeta::new(*creator_token_account, false),
            AccountMeta::new(*winner_token_account, false),
            AccountMeta::new_readonly(*token_program, false),
        ],
        data: RaffleInstruction::ClaimNft { cid }.pack(),
    }
}

/// Create close_raffle instruction
pub fn close_raffle(program_id: &Pubkey, creator: &Pubkey, cid: u64) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id, cid);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*creator, true),
            AccountMeta::new(raffle, false),
        ],
        data: RaffleInstruction::CloseRaffle { cid }.pack(),
    }
}
