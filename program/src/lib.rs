// NFT Raffle Program
// Lock an NFT behind a fixed-fee raffle and hand it to a drawn winner after expiry

pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod randomness;
pub mod state;
pub mod token;
pub mod utils;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

solana_program::declare_id!("45fqb9u9AG2Jwjco4k8U8wdLUPjPjqCSY5iercuCBk8f");

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process_instruction(program_id, accounts, instruction_data)
}
