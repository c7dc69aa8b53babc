// NFT Raffle Program - Instruction Processor
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::{Clock, UnixTimestamp},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    error::RaffleError,
    events::{RaffleEvent, WinnerSelected},
    instruction::RaffleInstruction,
    randomness::{draw_index, EntropySource, SlotHashesEntropy},
    state::{ProgramLedger, RaffleRecord},
    token::{unpack_mint, unpack_token_account, TokenVariant},
    utils::{self, find_ledger_address, find_raffle_address, LEDGER_SEED, RAFFLE_SEED},
};

/// Program state handler.
pub struct Processor {}

impl Processor {
    /// Process a raffle instruction
    pub fn process_instruction(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeLedger => {
                msg!("Instruction: Initialize Ledger");
                Self::process_initialize_ledger(program_id, accounts)
            }
            RaffleInstruction::CreateRaffle {
                nft_mint,
                entry_fee,
                max_entries,
                expiry_date,
            } => {
                msg!("Instruction: Create Raffle");
                Self::process_create_raffle(
                    program_id,
                    accounts,
                    nft_mint,
                    entry_fee,
                    max_entries,
                    expiry_date,
                )
            }
            RaffleInstruction::EnterRaffle { cid, amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(program_id, accounts, cid, amount)
            }
            RaffleInstruction::PickWinner { cid } => {
                msg!("Instruction: Pick Winner");
                Self::process_pick_winner(program_id, accounts, cid)
            }
            RaffleInstruction::ClaimNft { cid } => {
                msg!("Instruction: Claim NFT");
                Self::process_claim_nft(program_id, accounts, cid)
            }
            RaffleInstruction::CloseRaffle { cid } => {
                msg!("Instruction: Close Raffle");
                Self::process_close_raffle(program_id, accounts, cid)
            }
        }
    }

    /// Process InitializeLedger instruction
    fn process_initialize_ledger(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let deployer_info = next_account_info(account_info_iter)?;
        let ledger_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !deployer_info.is_signer {
            msg!("Deployer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_ledger, bump_seed) = find_ledger_address(program_id);
        if *ledger_info.key != expected_ledger {
            msg!("Invalid ledger account address");
            return Err(ProgramError::InvalidSeeds);
        }

        if ledger_info.owner == program_id {
            let existing = ProgramLedger::unpack_unchecked(&ledger_info.data.borrow())?;
            if existing.initialized {
                return Err(RaffleError::AlreadyInitialized.into());
            }
        } else {
            Self::create_pda_account(
                deployer_info,
                ledger_info,
                system_program_info,
                ProgramLedger::LEN,
                program_id,
                &[LEDGER_SEED, &[bump_seed]],
            )?;
        }

        let ledger = ProgramLedger {
            initialized: true,
            raffle_count: 0,
            deployer: *deployer_info.key,
        };
        ProgramLedger::pack(ledger, &mut ledger_info.data.borrow_mut())?;

        msg!("Ledger initialized: Deployer={}", deployer_info.key);
        Ok(())
    }

    /// Process CreateRaffle instruction
    fn process_create_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        nft_mint: Pubkey,
        entry_fee: u64,
        max_entries: u8,
        expiry_date: UnixTimestamp,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let creator_info = next_account_info(account_info_iter)?;
        let ledger_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let mint_info = next_account_info(account_info_iter)?;
        let creator_token_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !creator_info.is_signer {
            msg!("Creator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let clock = Clock::get()?;
        RaffleRecord::validate_params(entry_fee, max_entries, expiry_date, clock.unix_timestamp)?;

        Self::check_nft_held(&nft_mint, mint_info, creator_token_info, creator_info.key)?;

        let mut ledger = Self::load_ledger(program_id, ledger_info)?;
        let cid = ledger
            .next_cid()
            .ok_or(ProgramError::InvalidArgument)?;

        let (expected_raffle, bump_seed) = find_raffle_address(program_id, cid);
        if *raffle_info.key != expected_raffle {
            msg!("Raffle account does not match cid {}", cid);
            return Err(ProgramError::InvalidSeeds);
        }
        if raffle_info.owner == program_id {
            msg!("Raffle {} already exists", cid);
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        Self::create_pda_account(
            creator_info,
            raffle_info,
            system_program_info,
            RaffleRecord::space(max_entries),
            program_id,
            &[RAFFLE_SEED, &cid.to_le_bytes(), &[bump_seed]],
        )?;

        let raffle = RaffleRecord::new(
            cid,
            *creator_info.key,
            nft_mint,
            entry_fee,
            max_entries,
            expiry_date,
        );
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        ledger.raffle_count = cid;
        ProgramLedger::pack(ledger, &mut ledger_info.data.borrow_mut())?;

        msg!(
            "Raffle {} created: Mint={}, EntryFee={} SOL, MaxEntries={}, Expiry={}",
            cid,
            nft_mint,
            utils::lamports_to_sol(entry_fee),
            max_entries,
            expiry_date
        );
        Ok(())
    }

    /// Process EnterRaffle instruction
    fn process_enter_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        cid: u64,
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let participant_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !participant_info.is_signer {
            msg!("Participant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info, cid)?;

        if !raffle.active {
            return Err(RaffleError::RaffleNotActive.into());
        }
        let clock = Clock::get()?;
        if raffle.has_expired(clock.unix_timestamp) {
            return Err(RaffleError::RaffleExpired.into());
        }
        if amount < raffle.entry_fee {
            msg!("Entry of {} lamports is below the fee of {}", amount, raffle.entry_fee);
            return Err(RaffleError::InvalidRaffleEntryFee.into());
        }
        if raffle.is_full() {
            return Err(RaffleError::MaxEntriesReached.into());
        }
        if raffle.has_entered(participant_info.key) {
            return Err(RaffleError::AlreadyEntered.into());
        }

        invoke(
            &system_instruction::transfer(participant_info.key, raffle_info.key, amount),
            &[
                participant_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        raffle.entries.push(*participant_info.key);
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Entered raffle {} with {} SOL ({}/{} entries)",
            cid,
            utils::lamports_to_sol(amount),
            raffle.entries.len(),
            raffle.max_entries
        );
        Ok(())
    }

    /// Process PickWinner instruction
    fn process_pick_winner(program_id: &Pubkey, accounts: &[AccountInfo], cid: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let creator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let slot_hashes_info = next_account_info(account_info_iter)?;

        if !creator_info.is_signer {
            msg!("Creator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info, cid)?;

        if raffle.creator != *creator_info.key {
            return Err(RaffleError::Unauthorized.into());
        }
        if raffle.locked {
            return Err(RaffleError::OperationLocked.into());
        }
        if !raffle.active {
            return Err(RaffleError::RaffleNotActive.into());
        }
        if raffle.has_winner() {
            return Err(RaffleError::WinnerAlreadySelected.into());
        }
        let clock = Clock::get()?;
        if !raffle.has_expired(clock.unix_timestamp) {
            return Err(RaffleError::RaffleNotExpired.into());
        }
        if raffle.entries.is_empty() {
            return Err(RaffleError::NotEnoughEntries.into());
        }

        raffle.locked = true;

        let entropy = SlotHashesEntropy::new(slot_hashes_info, &clock)?.entropy()?;
        let index = draw_index(entropy, raffle.entries.len()).ok_or(RaffleError::NotEnoughEntries)?;
        raffle.partial_winner = raffle.entries[index];
        raffle.winner = raffle.partial_winner;

        RaffleEvent::WinnerSelected(WinnerSelected {
            raffle: *raffle_info.key,
            winner: raffle.winner,
        })
        .emit();

        raffle.locked = false;
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle {} winner: {} (entry {} of {})",
            cid,
            raffle.winner,
            index + 1,
            raffle.entries.len()
        );
        Ok(())
    }

    /// Process ClaimNft instruction
    fn process_claim_nft(program_id: &Pubkey, accounts: &[AccountInfo], cid: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let creator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let mint_info = next_account_info(account_info_iter)?;
        let creator_token_info = next_account_info(account_info_iter)?;
        let winner_token_info = next_account_info(account_info_iter)?;
        let token_program_info = next_account_info(account_info_iter)?;

        if !creator_info.is_signer {
            msg!("Creator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info, cid)?;

        if raffle.creator != *creator_info.key {
            return Err(RaffleError::Unauthorized.into());
        }
        if !raffle.active {
            return Err(RaffleError::RaffleNotActive.into());
        }
        if !raffle.has_winner() {
            return Err(RaffleError::NoWinnerSelected.into());
        }
        let clock = Clock::get()?;
        if !raffle.has_expired(clock.unix_timestamp) {
            return Err(RaffleError::RaffleStillActive.into());
        }
        if *mint_info.key != raffle.nft_mint {
            return Err(RaffleError::InvalidNftMint.into());
        }

        let variant = TokenVariant::from_program_id(token_program_info.key)
            .ok_or(RaffleError::InvalidTokenProgram)?;
        if *winner_token_info.key != variant.associated_token_address(&raffle.winner, &raffle.nft_mint) {
            msg!("Winner token account does not belong to {}", raffle.winner);
            return Err(RaffleError::WinnerNotTheWinner.into());
        }
        if *creator_token_info.key
            != variant.associated_token_address(&raffle.creator, &raffle.nft_mint)
        {
            msg!("Creator token account does not belong to {}", raffle.creator);
            return Err(RaffleError::MissingTokenAccounts.into());
        }
        if mint_info.owner != token_program_info.key {
            msg!("Mint is owned by {}, not {}", mint_info.owner, token_program_info.key);
            return Err(RaffleError::InvalidTokenProgram.into());
        }
        if winner_token_info.owner != token_program_info.key
            || creator_token_info.owner != token_program_info.key
        {
            return Err(RaffleError::MissingTokenAccounts.into());
        }

        let source = unpack_token_account(creator_token_info)
            .map_err(|_| RaffleError::MissingTokenAccounts)?;
        if source.amount < 1 {
            return Err(RaffleError::NftNotTransferred.into());
        }
        let mint = unpack_mint(mint_info).map_err(|_| RaffleError::InvalidNftMint)?;

        invoke(
            &spl_token_2022::instruction::transfer_checked(
                token_program_info.key,
                creator_token_info.key,
                mint_info.key,
                winner_token_info.key,
                creator_info.key,
                &[],
                1,
                mint.decimals,
            )?,
            &[
                creator_token_info.clone(),
                mint_info.clone(),
                winner_token_info.clone(),
                creator_info.clone(),
                token_program_info.clone(),
            ],
        )?;

        // Entry fees above the rent-exempt minimum go to the creator
        let rent = Rent::get()?;
        let reserved = rent.minimum_balance(raffle_info.data_len());
        let released = raffle_info.lamports().saturating_sub(reserved);
        if released > 0 {
            **raffle_info.try_borrow_mut_lamports()? -= released;
            **creator_info.try_borrow_mut_lamports()? += released;
        }

        raffle.active = false;
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle {} claimed: NFT sent to {}, {} SOL released to creator",
            cid,
            raffle.winner,
            utils::lamports_to_sol(released)
        );
        Ok(())
    }

    /// Process CloseRaffle instruction
    fn process_close_raffle(program_id: &Pubkey, accounts: &[AccountInfo], cid: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let creator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        if !creator_info.is_signer {
            msg!("Creator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let raffle = Self::load_raffle(program_id, raffle_info, cid)?;

        if raffle.creator != *creator_info.key {
            return Err(RaffleError::Unauthorized.into());
        }
        if !raffle.active {
            return Err(RaffleError::RaffleNotActive.into());
        }
        if !raffle.entries.is_empty() {
            return Err(RaffleError::CannotCloseRaffleWithEntries.into());
        }

        let refund = raffle_info.lamports();
        **raffle_info.try_borrow_mut_lamports()? = 0;
        **creator_info.try_borrow_mut_lamports()? += refund;
        raffle_info.data.borrow_mut().fill(0);

        msg!("Raffle {} closed, {} SOL refunded", cid, utils::lamports_to_sol(refund));
        Ok(())
    }

    /// Create a program-owned account at a PDA.
    ///
    /// Anyone can send lamports to a derived address before it is created, so
    /// a funded address is topped up to rent exemption, then allocated and
    /// assigned instead.
    fn create_pda_account<'a>(
        payer_info: &AccountInfo<'a>,
        new_account_info: &AccountInfo<'a>,
        system_program_info: &AccountInfo<'a>,
        space: usize,
        owner: &Pubkey,
        signer_seeds: &[&[u8]],
    ) -> ProgramResult {
        let rent = Rent::get()?;
        let required_lamports = rent.minimum_balance(space);

        if new_account_info.lamports() == 0 {
            return invoke_signed(
                &system_instruction::create_account(
                    payer_info.key,
                    new_account_info.key,
                    required_lamports,
                    space as u64,
                    owner,
                ),
                &[
                    payer_info.clone(),
                    new_account_info.clone(),
                    system_program_info.clone(),
                ],
                &[signer_seeds],
            );
        }

        let top_up = required_lamports.saturating_sub(new_account_info.lamports());
        if top_up > 0 {
            invoke(
                &system_instruction::transfer(payer_info.key, new_account_info.key, top_up),
                &[
                    payer_info.clone(),
                    new_account_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }
        invoke_signed(
            &system_instruction::allocate(new_account_info.key, space as u64),
            &[new_account_info.clone(), system_program_info.clone()],
            &[signer_seeds],
        )?;
        invoke_signed(
            &system_instruction::assign(new_account_info.key, owner),
            &[new_account_info.clone(), system_program_info.clone()],
            &[signer_seeds],
        )
    }

    /// Load the ledger after checking its address and owner
    fn load_ledger(program_id: &Pubkey, ledger_info: &AccountInfo) -> Result<ProgramLedger, ProgramError> {
        let (expected_ledger, _) = find_ledger_address(program_id);
        if *ledger_info.key != expected_ledger {
            msg!("Invalid ledger account address");
            return Err(ProgramError::InvalidSeeds);
        }
        if ledger_info.owner != program_id {
            msg!("Ledger has not been initialized");
            return Err(ProgramError::UninitializedAccount);
        }
        ProgramLedger::unpack(&ledger_info.data.borrow())
    }

    /// Load the raffle stored for `cid`
    fn load_raffle(
        program_id: &Pubkey,
        raffle_info: &AccountInfo,
        cid: u64,
    ) -> Result<RaffleRecord, ProgramError> {
        let (expected_raffle, _) = find_raffle_address(program_id, cid);
        if *raffle_info.key != expected_raffle {
            msg!("Raffle account does not match cid {}", cid);
            return Err(ProgramError::InvalidSeeds);
        }
        if raffle_info.owner != program_id {
            return Err(RaffleError::RaffleNotFound.into());
        }
        let raffle = RaffleRecord::unpack(&raffle_info.data.borrow())
            .map_err(|_| RaffleError::RaffleNotFound)?;
        if raffle.cid != cid {
            return Err(RaffleError::RaffleNotFound.into());
        }
        Ok(raffle)
    }

    /// Check that `mint_info` is a one-of-one NFT mint and the creator holds it
    fn check_nft_held(
        nft_mint: &Pubkey,
        mint_info: &AccountInfo,
        creator_token_info: &AccountInfo,
        creator: &Pubkey,
    ) -> ProgramResult {
        if *nft_mint == Pubkey::default() || mint_info.key != nft_mint {
            return Err(RaffleError::InvalidNftMint.into());
        }
        let variant =
            TokenVariant::from_program_id(mint_info.owner).ok_or(RaffleError::InvalidNftMint)?;
        let mint = unpack_mint(mint_info).map_err(|_| RaffleError::InvalidNftMint)?;
        if mint.supply != 1 || mint.decimals != 0 {
            msg!("Mint supply {} with {} decimals is not an NFT", mint.supply, mint.decimals);
            return Err(RaffleError::InvalidNftSupply.into());
        }

        if *creator_token_info.owner != variant.token_program_id() {
            return Err(RaffleError::NftNotTransferred.into());
        }
        let holding = unpack_token_account(creator_token_info)
            .map_err(|_| RaffleError::NftNotTransferred)?;
        if holding.mint != *nft_mint || holding.owner != *creator || holding.amount < 1 {
            return Err(RaffleError::NftNotTransferred.into());
        }
        Ok(())
    }
}
