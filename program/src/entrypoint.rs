use solana_program::{
    account_info::AccountInfo, entrypoint, entrypoint::ProgramResult, msg,
    program_error::ProgramError, pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::{error::RaffleError, processor::Processor};

entrypoint!(process_instruction);

fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    Processor::process_instruction(program_id, accounts, instruction_data).map_err(|error| {
        if let ProgramError::Custom(code) = error {
            if let Ok(raffle_error) = RaffleError::try_from(code) {
                msg!("Error: {}", raffle_error);
            }
        }
        error
    })
}
