// NFT Raffle Program - Address derivation and small helpers
use solana_program::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};

/// Seed of the singleton program ledger.
pub const LEDGER_SEED: &[u8] = b"program_state";
/// Seed prefix of every raffle record, followed by the cid in little-endian.
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Derive a program address from an ordered list of seeds.
///
/// Every address in the program goes through here; callers never cache the
/// result across lookups.
pub fn derive_address(seeds: &[&[u8]], program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(seeds, program_id)
}

/// Find the program derived address of the ledger
pub fn find_ledger_address(program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(&[LEDGER_SEED], program_id)
}

/// Find the program derived address of a raffle
pub fn find_raffle_address(program_id: &Pubkey, cid: u64) -> (Pubkey, u8) {
    let cid_bytes = cid.to_le_bytes();
    derive_address(&[RAFFLE_SEED, &cid_bytes], program_id)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}
