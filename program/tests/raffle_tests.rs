use solana_program::{program_pack::Pack, pubkey::Pubkey, system_instruction, sysvar::clock::Clock};
use solana_program_test::*;
use solana_sdk::{
    account::AccountSharedData,
    instruction::{Instruction, InstructionError},
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use spl_token_2022::{
    extension::StateWithExtensions,
    state::{Account as TokenAccount, Mint},
};

use nft_raffle::{
    error::RaffleError,
    instruction,
    process_instruction,
    state::{ProgramLedger, RaffleRecord},
    token::TokenVariant,
    utils::{find_ledger_address, find_raffle_address},
};

const ENTRY_FEE: u64 = 2_000_000_000;
const DAY: i64 = 86_400;

// Setup program test
async fn setup() -> ProgramTestContext {
    let program_test = ProgramTest::new(
        "nft_raffle",
        nft_raffle::id(),
        processor!(process_instruction),
    );
    program_test.start_with_context().await
}

// Same, with the Token-2022 program registered for the Extended variant
async fn setup_with_extended_token() -> ProgramTestContext {
    let mut program_test = ProgramTest::new(
        "nft_raffle",
        nft_raffle::id(),
        processor!(process_instruction),
    );
    program_test.add_program(
        "spl_token_2022",
        spl_token_2022::id(),
        processor!(spl_token_2022::processor::Processor::process),
    );
    program_test.start_with_context().await
}

async fn process(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let mut all_signers = vec![&context.payer];
    all_signers.extend_from_slice(signers);
    let transaction = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        &all_signers,
        context.last_blockhash,
    );
    context.banks_client.process_transaction(transaction).await
}

// Needed before resubmitting a byte-identical transaction
async fn refresh_blockhash(context: &mut ProgramTestContext) {
    context.last_blockhash = context
        .banks_client
        .get_new_latest_blockhash(&context.last_blockhash)
        .await
        .unwrap();
}

fn assert_instruction_error(result: Result<(), BanksClientError>, expected: InstructionError) {
    let error = match result {
        Ok(()) => panic!("expected {:?}, transaction succeeded", expected),
        Err(BanksClientError::TransactionError(error)) => error,
        Err(BanksClientError::SimulationError { err, .. }) => err,
        Err(other) => panic!("expected {:?}, got {:?}", expected, other),
    };
    assert_eq!(error, TransactionError::InstructionError(0, expected));
}

fn assert_raffle_error(result: Result<(), BanksClientError>, expected: RaffleError) {
    assert_instruction_error(result, InstructionError::Custom(expected as u32));
}

async fn funded_keypair(context: &mut ProgramTestContext, lamports: u64) -> Keypair {
    let keypair = Keypair::new();
    let payer = context.payer.pubkey();
    process(
        context,
        &[system_instruction::transfer(&payer, &keypair.pubkey(), lamports)],
        &[],
    )
    .await
    .unwrap();
    keypair
}

/// Create a zero-decimal mint and put `supply` units in `owner`'s associated account
async fn mint_nft(context: &mut ProgramTestContext, owner: &Pubkey, supply: u64) -> (Pubkey, Pubkey) {
    mint_nft_under(context, TokenVariant::Classic, owner, supply).await
}

async fn mint_nft_under(
    context: &mut ProgramTestContext,
    variant: TokenVariant,
    owner: &Pubkey,
    supply: u64,
) -> (Pubkey, Pubkey) {
    let mint = Keypair::new();
    let payer = context.payer.pubkey();
    let token_program = variant.token_program_id();
    let rent = context.banks_client.get_rent().await.unwrap();
    let owner_account = variant.associated_token_address(owner, &mint.pubkey());

    let instructions = [
        system_instruction::create_account(
            &payer,
            &mint.pubkey(),
            rent.minimum_balance(Mint::LEN),
            Mint::LEN as u64,
            &token_program,
        ),
        spl_token_2022::instruction::initialize_mint(&token_program, &mint.pubkey(), &payer, None, 0)
            .unwrap(),
        spl_associated_token_account::instruction::create_associated_token_account(
            &payer,
            owner,
            &mint.pubkey(),
            &token_program,
        ),
        spl_token_2022::instruction::mint_to(
            &token_program,
            &mint.pubkey(),
            &owner_account,
            &payer,
            &[],
            supply,
        )
        .unwrap(),
    ];
    process(context, &instructions, &[&mint]).await.unwrap();
    (mint.pubkey(), owner_account)
}

async fn create_token_account(context: &mut ProgramTestContext, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    create_token_account_under(context, TokenVariant::Classic, owner, mint).await
}

async fn create_token_account_under(
    context: &mut ProgramTestContext,
    variant: TokenVariant,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Pubkey {
    let payer = context.payer.pubkey();
    process(
        context,
        &[spl_associated_token_account::instruction::create_associated_token_account(
            &payer,
            owner,
            mint,
            &variant.token_program_id(),
        )],
        &[],
    )
    .await
    .unwrap();
    variant.associated_token_address(owner, mint)
}

async fn now(context: &mut ProgramTestContext) -> i64 {
    let clock: Clock = context.banks_client.get_sysvar().await.unwrap();
    clock.unix_timestamp
}

async fn set_unix_timestamp(context: &mut ProgramTestContext, unix_timestamp: i64) {
    let mut clock: Clock = context.banks_client.get_sysvar().await.unwrap();
    clock.unix_timestamp = unix_timestamp;
    context.set_sysvar(&clock);
}

async fn get_ledger(context: &mut ProgramTestContext) -> ProgramLedger {
    let (ledger, _) = find_ledger_address(&nft_raffle::id());
    let account = context.banks_client.get_account(ledger).await.unwrap().unwrap();
    ProgramLedger::unpack(&account.data).unwrap()
}

async fn get_raffle(context: &mut ProgramTestContext, cid: u64) -> RaffleRecord {
    let (raffle, _) = find_raffle_address(&nft_raffle::id(), cid);
    let account = context.banks_client.get_account(raffle).await.unwrap().unwrap();
    RaffleRecord::unpack(&account.data).unwrap()
}

async fn token_balance(context: &mut ProgramTestContext, address: Pubkey) -> u64 {
    let account = context.banks_client.get_account(address).await.unwrap().unwrap();
    StateWithExtensions::<TokenAccount>::unpack(&account.data)
        .unwrap()
        .base
        .amount
}

async fn initialize_ledger(context: &mut ProgramTestContext) {
    let payer = context.payer.pubkey();
    process(context, &[instruction::initialize_ledger(&nft_raffle::id(), &payer)], &[])
        .await
        .unwrap();
}

/// A creator holding a fresh NFT, with the ledger initialized
struct Fixture {
    creator: Keypair,
    nft_mint: Pubkey,
    creator_token_account: Pubkey,
}

async fn fixture(context: &mut ProgramTestContext) -> Fixture {
    initialize_ledger(context).await;
    let creator = funded_keypair(context, 10_000_000_000).await;
    let (nft_mint, creator_token_account) = mint_nft(context, &creator.pubkey(), 1).await;
    Fixture {
        creator,
        nft_mint,
        creator_token_account,
    }
}

async fn create_raffle(
    context: &mut ProgramTestContext,
    fixture: &Fixture,
    max_entries: u8,
    expiry_date: i64,
) -> Result<u64, BanksClientError> {
    let cid = get_ledger(context).await.raffle_count + 1;
    let ix = instruction::create_raffle(
        &nft_raffle::id(),
        &fixture.creator.pubkey(),
        cid,
        &fixture.nft_mint,
        &fixture.creator_token_account,
        ENTRY_FEE,
        max_entries,
        expiry_date,
    );
    process(context, &[ix], &[&fixture.creator]).await.map(|_| cid)
}

async fn enter(
    context: &mut ProgramTestContext,
    participant: &Keypair,
    cid: u64,
    amount: u64,
) -> Result<(), BanksClientError> {
    let ix = instruction::enter_raffle(&nft_raffle::id(), &participant.pubkey(), cid, amount);
    process(context, &[ix], &[participant]).await
}

async fn pick_winner(
    context: &mut ProgramTestContext,
    creator: &Keypair,
    cid: u64,
) -> Result<(), BanksClientError> {
    let ix = instruction::pick_winner(&nft_raffle::id(), &creator.pubkey(), cid);
    process(context, &[ix], &[creator]).await
}

// Test initializing the ledger
#[tokio::test]
async fn test_initialize_ledger() {
    let mut context = setup().await;
    initialize_ledger(&mut context).await;

    let ledger = get_ledger(&mut context).await;
    assert!(ledger.initialized);
    assert_eq!(ledger.raffle_count, 0);
    assert_eq!(ledger.deployer, context.payer.pubkey());

    refresh_blockhash(&mut context).await;
    let payer = context.payer.pubkey();
    let result = process(
        &mut context,
        &[instruction::initialize_ledger(&nft_raffle::id(), &payer)],
        &[],
    )
    .await;
    assert_raffle_error(result, RaffleError::AlreadyInitialized);
}

// Test initializing the ledger at an address someone already sent lamports to
#[tokio::test]
async fn test_initialize_ledger_at_funded_address() {
    let mut context = setup().await;
    let (ledger_address, _) = find_ledger_address(&nft_raffle::id());
    let payer = context.payer.pubkey();
    process(
        &mut context,
        &[system_instruction::transfer(&payer, &ledger_address, 1_000_000)],
        &[],
    )
    .await
    .unwrap();

    initialize_ledger(&mut context).await;

    let ledger = get_ledger(&mut context).await;
    assert!(ledger.initialized);
    assert_eq!(ledger.raffle_count, 0);
    let account = context.banks_client.get_account(ledger_address).await.unwrap().unwrap();
    let rent = context.banks_client.get_rent().await.unwrap();
    assert_eq!(account.owner, nft_raffle::id());
    assert_eq!(account.data.len(), ProgramLedger::LEN);
    assert_eq!(account.lamports, rent.minimum_balance(ProgramLedger::LEN).max(1_000_000));
}

// Test creating a raffle from an empty ledger
#[tokio::test]
async fn test_create_raffle() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;

    let cid = create_raffle(&mut context, &fixture, 8, expiry_date).await.unwrap();
    assert_eq!(cid, 1);
    assert_eq!(get_ledger(&mut context).await.raffle_count, 1);

    let raffle = get_raffle(&mut context, 1).await;
    assert_eq!(raffle.cid, 1);
    assert_eq!(raffle.creator, fixture.creator.pubkey());
    assert_eq!(raffle.nft_mint, fixture.nft_mint);
    assert_eq!(raffle.entry_fee, ENTRY_FEE);
    assert_eq!(raffle.max_entries, 8);
    assert_eq!(raffle.expiry_date, expiry_date);
    assert!(raffle.active);
    assert!(!raffle.locked);
    assert!(raffle.entries.is_empty());
    assert_eq!(raffle.winner, Pubkey::default());

    let (raffle_address, _) = find_raffle_address(&nft_raffle::id(), 1);
    let account = context.banks_client.get_account(raffle_address).await.unwrap().unwrap();
    assert_eq!(account.owner, nft_raffle::id());
    assert_eq!(account.data.len(), RaffleRecord::space(8));

    // The next raffle takes the next cid
    let cid = create_raffle(&mut context, &fixture, 3, expiry_date + 1).await.unwrap();
    assert_eq!(cid, 2);
    assert_eq!(get_ledger(&mut context).await.raffle_count, 2);
    assert_eq!(get_raffle(&mut context, 2).await.max_entries, 3);
}

// Test creating raffles at addresses that already hold lamports
#[tokio::test]
async fn test_create_raffle_at_funded_address() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;
    let rent = context.banks_client.get_rent().await.unwrap();
    let payer = context.payer.pubkey();
    let (first_address, _) = find_raffle_address(&nft_raffle::id(), 1);
    let (second_address, _) = find_raffle_address(&nft_raffle::id(), 2);

    // Below rent exemption, topped up by the creator
    process(
        &mut context,
        &[
            system_instruction::transfer(&payer, &first_address, 1_000_000),
            system_instruction::transfer(&payer, &second_address, 100_000_000),
        ],
        &[],
    )
    .await
    .unwrap();

    let cid = create_raffle(&mut context, &fixture, 8, expiry_date).await.unwrap();
    assert_eq!(cid, 1);
    let raffle = get_raffle(&mut context, 1).await;
    assert_eq!(raffle.creator, fixture.creator.pubkey());
    assert!(raffle.active);
    let account = context.banks_client.get_account(first_address).await.unwrap().unwrap();
    assert_eq!(account.owner, nft_raffle::id());
    assert_eq!(account.data.len(), RaffleRecord::space(8));
    assert_eq!(account.lamports, rent.minimum_balance(RaffleRecord::space(8)));

    // Already above rent exemption, nothing is added
    let creator_before = context.banks_client.get_balance(fixture.creator.pubkey()).await.unwrap();
    let cid = create_raffle(&mut context, &fixture, 3, expiry_date).await.unwrap();
    assert_eq!(cid, 2);
    assert_eq!(get_raffle(&mut context, 2).await.max_entries, 3);
    assert_eq!(
        context.banks_client.get_balance(second_address).await.unwrap(),
        100_000_000
    );
    let creator_after = context.banks_client.get_balance(fixture.creator.pubkey()).await.unwrap();
    assert_eq!(creator_before, creator_after);
    assert_eq!(get_ledger(&mut context).await.raffle_count, 2);
}

// Test a ledger with no cid left to hand out
#[tokio::test]
async fn test_create_raffle_rejects_exhausted_ledger() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;

    let (ledger_address, _) = find_ledger_address(&nft_raffle::id());
    let mut account = context.banks_client.get_account(ledger_address).await.unwrap().unwrap();
    let mut ledger = ProgramLedger::unpack(&account.data).unwrap();
    ledger.raffle_count = u64::MAX;
    ProgramLedger::pack(ledger, &mut account.data).unwrap();
    context.set_account(&ledger_address, &AccountSharedData::from(account));

    let ix = instruction::create_raffle(
        &nft_raffle::id(),
        &fixture.creator.pubkey(),
        1,
        &fixture.nft_mint,
        &fixture.creator_token_account,
        ENTRY_FEE,
        8,
        expiry_date,
    );
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_instruction_error(result, InstructionError::InvalidArgument);
    assert_eq!(get_ledger(&mut context).await.raffle_count, u64::MAX);
}

// Test every creation precondition
#[tokio::test]
async fn test_create_raffle_validation() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;
    let program_id = nft_raffle::id();
    let creator = fixture.creator.pubkey();

    let build = |nft_mint: &Pubkey, token_account: &Pubkey, entry_fee: u64, max_entries: u8, expiry: i64| {
        instruction::create_raffle(
            &program_id,
            &creator,
            1,
            nft_mint,
            token_account,
            entry_fee,
            max_entries,
            expiry,
        )
    };

    let ix = build(&fixture.nft_mint, &fixture.creator_token_account, 0, 8, expiry_date);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::InvalidEntryFee);

    for max_entries in [1u8, 255] {
        let ix = build(&fixture.nft_mint, &fixture.creator_token_account, ENTRY_FEE, max_entries, expiry_date);
        let result = process(&mut context, &[ix], &[&fixture.creator]).await;
        assert_raffle_error(result, RaffleError::InvalidMaxEntries);
    }

    let current = now(&mut context).await;
    let ix = build(&fixture.nft_mint, &fixture.creator_token_account, ENTRY_FEE, 8, current);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::InvalidExpiryDate);

    // An account no token program owns is not a mint
    let not_a_mint = Keypair::new().pubkey();
    let ix = build(&not_a_mint, &fixture.creator_token_account, ENTRY_FEE, 8, expiry_date);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::InvalidNftMint);

    // Fungible supply is not an NFT
    let (fungible_mint, fungible_account) = mint_nft(&mut context, &creator, 2).await;
    let ix = build(&fungible_mint, &fungible_account, ENTRY_FEE, 8, expiry_date);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::InvalidNftSupply);

    // The NFT sits with someone else
    let stranger = Keypair::new();
    let (foreign_mint, foreign_account) = mint_nft(&mut context, &stranger.pubkey(), 1).await;
    let ix = build(&foreign_mint, &foreign_account, ENTRY_FEE, 8, expiry_date);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::NftNotTransferred);

    // Nothing was created by the failed attempts
    assert_eq!(get_ledger(&mut context).await.raffle_count, 0);
    let (raffle_address, _) = find_raffle_address(&program_id, 1);
    assert!(context.banks_client.get_account(raffle_address).await.unwrap().is_none());
}

// Test entering a raffle with and without the full fee
#[tokio::test]
async fn test_enter_raffle() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;
    let cid = create_raffle(&mut context, &fixture, 8, expiry_date).await.unwrap();
    let (raffle_address, _) = find_raffle_address(&nft_raffle::id(), cid);
    let before = context.banks_client.get_balance(raffle_address).await.unwrap();

    let participant = funded_keypair(&mut context, 5_000_000_000).await;
    enter(&mut context, &participant, cid, ENTRY_FEE).await.unwrap();

    let raffle = get_raffle(&mut context, cid).await;
    assert_eq!(raffle.entries, vec![participant.pubkey()]);
    let after = context.banks_client.get_balance(raffle_address).await.unwrap();
    assert_eq!(after - before, ENTRY_FEE);

    let second = funded_keypair(&mut context, 5_000_000_000).await;
    let result = enter(&mut context, &second, cid, 1_000_000_000).await;
    assert_raffle_error(result, RaffleError::InvalidRaffleEntryFee);
    assert_eq!(get_raffle(&mut context, cid).await.entries.len(), 1);
}

// Test the entry cap and duplicate entrants
#[tokio::test]
async fn test_enter_raffle_limits() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;
    let cid = create_raffle(&mut context, &fixture, 2, expiry_date).await.unwrap();

    let first = funded_keypair(&mut context, 10_000_000_000).await;
    let second = funded_keypair(&mut context, 10_000_000_001).await;
    let third = funded_keypair(&mut context, 10_000_000_002).await;

    enter(&mut context, &first, cid, ENTRY_FEE).await.unwrap();
    let result = enter(&mut context, &first, cid, ENTRY_FEE + 1).await;
    assert_raffle_error(result, RaffleError::AlreadyEntered);

    enter(&mut context, &second, cid, ENTRY_FEE).await.unwrap();
    let result = enter(&mut context, &third, cid, ENTRY_FEE).await;
    assert_raffle_error(result, RaffleError::MaxEntriesReached);

    let raffle = get_raffle(&mut context, cid).await;
    assert_eq!(raffle.entries, vec![first.pubkey(), second.pubkey()]);
}

// Test entering after expiry and entering an unknown raffle
#[tokio::test]
async fn test_enter_raffle_expired_or_missing() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;
    let cid = create_raffle(&mut context, &fixture, 4, expiry_date).await.unwrap();
    let participant = funded_keypair(&mut context, 5_000_000_000).await;

    let result = enter(&mut context, &participant, cid + 1, ENTRY_FEE).await;
    assert_raffle_error(result, RaffleError::RaffleNotFound);

    set_unix_timestamp(&mut context, expiry_date).await;
    let result = enter(&mut context, &participant, cid, ENTRY_FEE).await;
    assert_raffle_error(result, RaffleError::RaffleExpired);
}

// Test drawing a winner among four entrants
#[tokio::test]
async fn test_pick_winner() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;
    let cid = create_raffle(&mut context, &fixture, 8, expiry_date).await.unwrap();

    let mut entrants = Vec::new();
    for i in 0..4u64 {
        let participant = funded_keypair(&mut context, 5_000_000_000 + i).await;
        enter(&mut context, &participant, cid, ENTRY_FEE).await.unwrap();
        entrants.push(participant.pubkey());
    }

    let result = pick_winner(&mut context, &fixture.creator, cid).await;
    assert_raffle_error(result, RaffleError::RaffleNotExpired);

    set_unix_timestamp(&mut context, expiry_date + 1).await;

    let impostor = funded_keypair(&mut context, 1_000_000_000).await;
    let result = pick_winner(&mut context, &impostor, cid).await;
    assert_raffle_error(result, RaffleError::Unauthorized);

    refresh_blockhash(&mut context).await;
    pick_winner(&mut context, &fixture.creator, cid).await.unwrap();

    let raffle = get_raffle(&mut context, cid).await;
    assert!(entrants.contains(&raffle.winner));
    assert_eq!(raffle.partial_winner, raffle.winner);
    assert!(!raffle.locked);
    assert!(raffle.active);

    // The recorded winner never changes
    refresh_blockhash(&mut context).await;
    let result = pick_winner(&mut context, &fixture.creator, cid).await;
    assert_raffle_error(result, RaffleError::WinnerAlreadySelected);
    assert_eq!(get_raffle(&mut context, cid).await.winner, raffle.winner);
}

// Test drawing from an expired raffle nobody entered
#[tokio::test]
async fn test_pick_winner_without_entries() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let expiry_date = now(&mut context).await + DAY;
    let cid = create_raffle(&mut context, &fixture, 8, expiry_date).await.unwrap();

    set_unix_timestamp(&mut context, expiry_date).await;
    let result = pick_winner(&mut context, &fixture.creator, cid).await;
    assert_raffle_error(result, RaffleError::NotEnoughEntries);
    assert_eq!(get_raffle(&mut context, cid).await.winner, Pubkey::default());
}

// Test moving the NFT to the winner
#[tokio::test]
async fn test_claim_nft() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let program_id = nft_raffle::id();
    let expiry_date = now(&mut context).await + DAY;
    let cid = create_raffle(&mut context, &fixture, 8, expiry_date).await.unwrap();

    let first = funded_keypair(&mut context, 5_000_000_000).await;
    let second = funded_keypair(&mut context, 5_000_000_001).await;
    enter(&mut context, &first, cid, ENTRY_FEE).await.unwrap();
    enter(&mut context, &second, cid, ENTRY_FEE).await.unwrap();

    let first_account = create_token_account(&mut context, &first.pubkey(), &fixture.nft_mint).await;
    let second_account = create_token_account(&mut context, &second.pubkey(), &fixture.nft_mint).await;

    let claim = |winner_account: &Pubkey, token_program: &Pubkey, creator_account: &Pubkey| {
        instruction::claim_nft(
            &program_id,
            &fixture.creator.pubkey(),
            cid,
            &fixture.nft_mint,
            creator_account,
            winner_account,
            token_program,
        )
    };

    let ix = claim(&first_account, &spl_token::id(), &fixture.creator_token_account);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::NoWinnerSelected);

    set_unix_timestamp(&mut context, expiry_date).await;
    pick_winner(&mut context, &fixture.creator, cid).await.unwrap();
    let winner = get_raffle(&mut context, cid).await.winner;
    let (winner_account, loser_account) = if winner == first.pubkey() {
        (first_account, second_account)
    } else {
        (second_account, first_account)
    };

    let ix = claim(&loser_account, &spl_token::id(), &fixture.creator_token_account);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::WinnerNotTheWinner);

    // Right program, but the source belongs to someone other than the creator
    let ix = claim(&winner_account, &spl_token::id(), &loser_account);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::MissingTokenAccounts);

    // Accounts derived for the other token standard
    let extended = TokenVariant::Extended;
    let ix = claim(
        &extended.associated_token_address(&winner, &fixture.nft_mint),
        &extended.token_program_id(),
        &extended.associated_token_address(&fixture.creator.pubkey(), &fixture.nft_mint),
    );
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::InvalidTokenProgram);

    refresh_blockhash(&mut context).await;
    let creator_before = context.banks_client.get_balance(fixture.creator.pubkey()).await.unwrap();
    let ix = claim(&winner_account, &spl_token::id(), &fixture.creator_token_account);
    process(&mut context, &[ix], &[&fixture.creator]).await.unwrap();

    assert_eq!(token_balance(&mut context, winner_account).await, 1);
    assert_eq!(token_balance(&mut context, fixture.creator_token_account).await, 0);
    let raffle = get_raffle(&mut context, cid).await;
    assert!(!raffle.active);
    assert_eq!(raffle.winner, winner);

    // Escrowed fees went to the creator, the record keeps its rent
    let creator_after = context.banks_client.get_balance(fixture.creator.pubkey()).await.unwrap();
    assert_eq!(creator_after - creator_before, 2 * ENTRY_FEE);
    let (raffle_address, _) = find_raffle_address(&program_id, cid);
    let rent = context.banks_client.get_rent().await.unwrap();
    assert_eq!(
        context.banks_client.get_balance(raffle_address).await.unwrap(),
        rent.minimum_balance(RaffleRecord::space(8))
    );

    // A settled raffle accepts nothing further
    refresh_blockhash(&mut context).await;
    let ix = claim(&winner_account, &spl_token::id(), &fixture.creator_token_account);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::RaffleNotActive);
    let result = pick_winner(&mut context, &fixture.creator, cid).await;
    assert_raffle_error(result, RaffleError::RaffleNotActive);
    let ix = instruction::close_raffle(&program_id, &fixture.creator.pubkey(), cid);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::RaffleNotActive);
    assert!(context.banks_client.get_account(raffle_address).await.unwrap().is_some());
}

// Test a full raffle over a Token-2022 NFT
#[tokio::test]
async fn test_claim_nft_extended() {
    let mut context = setup_with_extended_token().await;
    initialize_ledger(&mut context).await;
    let program_id = nft_raffle::id();
    let extended = TokenVariant::Extended;

    let creator = funded_keypair(&mut context, 10_000_000_000).await;
    let (nft_mint, creator_token_account) = mint_nft_under(&mut context, extended, &creator.pubkey(), 1).await;
    let fixture = Fixture {
        creator,
        nft_mint,
        creator_token_account,
    };
    let expiry_date = now(&mut context).await + DAY;
    let cid = create_raffle(&mut context, &fixture, 4, expiry_date).await.unwrap();
    assert_eq!(get_raffle(&mut context, cid).await.nft_mint, nft_mint);

    let participant = funded_keypair(&mut context, 5_000_000_000).await;
    enter(&mut context, &participant, cid, ENTRY_FEE).await.unwrap();
    set_unix_timestamp(&mut context, expiry_date).await;
    pick_winner(&mut context, &fixture.creator, cid).await.unwrap();
    assert_eq!(get_raffle(&mut context, cid).await.winner, participant.pubkey());

    let winner_account =
        create_token_account_under(&mut context, extended, &participant.pubkey(), &nft_mint).await;

    // Classic accounts and program cannot move an Extended NFT
    let classic = TokenVariant::Classic;
    let ix = instruction::claim_nft(
        &program_id,
        &fixture.creator.pubkey(),
        cid,
        &nft_mint,
        &classic.associated_token_address(&fixture.creator.pubkey(), &nft_mint),
        &classic.associated_token_address(&participant.pubkey(), &nft_mint),
        &classic.token_program_id(),
    );
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::InvalidTokenProgram);

    let ix = instruction::claim_nft(
        &program_id,
        &fixture.creator.pubkey(),
        cid,
        &nft_mint,
        &creator_token_account,
        &winner_account,
        &extended.token_program_id(),
    );
    process(&mut context, &[ix], &[&fixture.creator]).await.unwrap();

    assert_eq!(token_balance(&mut context, winner_account).await, 1);
    assert_eq!(token_balance(&mut context, creator_token_account).await, 0);
    assert!(!get_raffle(&mut context, cid).await.active);
}

// Test closing raffles with and without entries
#[tokio::test]
async fn test_close_raffle() {
    let mut context = setup().await;
    let fixture = fixture(&mut context).await;
    let program_id = nft_raffle::id();
    let expiry_date = now(&mut context).await + DAY;
    let empty_cid = create_raffle(&mut context, &fixture, 8, expiry_date).await.unwrap();
    let entered_cid = create_raffle(&mut context, &fixture, 8, expiry_date + 1).await.unwrap();

    let participant = funded_keypair(&mut context, 5_000_000_000).await;
    enter(&mut context, &participant, entered_cid, ENTRY_FEE).await.unwrap();

    let ix = instruction::close_raffle(&program_id, &participant.pubkey(), empty_cid);
    let result = process(&mut context, &[ix], &[&participant]).await;
    assert_raffle_error(result, RaffleError::Unauthorized);

    let ix = instruction::close_raffle(&program_id, &fixture.creator.pubkey(), entered_cid);
    let result = process(&mut context, &[ix], &[&fixture.creator]).await;
    assert_raffle_error(result, RaffleError::CannotCloseRaffleWithEntries);
    assert_eq!(get_raffle(&mut context, entered_cid).await.entries.len(), 1);

    let (raffle_address, _) = find_raffle_address(&program_id, empty_cid);
    let rent = context.banks_client.get_balance(raffle_address).await.unwrap();
    let creator_before = context.banks_client.get_balance(fixture.creator.pubkey()).await.unwrap();

    let ix = instruction::close_raffle(&program_id, &fixture.creator.pubkey(), empty_cid);
    process(&mut context, &[ix], &[&fixture.creator]).await.unwrap();

    assert!(context.banks_client.get_account(raffle_address).await.unwrap().is_none());
    let creator_after = context.banks_client.get_balance(fixture.creator.pubkey()).await.unwrap();
    assert_eq!(creator_after - creator_before, rent);

    // Closing does not rewind the sequence
    assert_eq!(get_ledger(&mut context).await.raffle_count, 2);
}
