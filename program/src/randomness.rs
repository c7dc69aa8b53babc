// NFT Raffle Program - Winner selection randomness
use arrayref::array_ref;
use solana_program::{
    account_info::AccountInfo, clock::Clock, msg, program_error::ProgramError, sysvar,
};

/// Source of the 64-bit seed used to draw a winner.
///
/// The draw itself only needs `entropy`; swapping the source (for example to
/// an oracle-backed one) does not touch the state machine.
pub trait EntropySource {
    fn entropy(&self) -> Result<u64, ProgramError>;
}

/// Entropy from the newest SlotHashes entry mixed with the current clock
pub struct SlotHashesEntropy<'a, 'b> {
    slot_hashes: &'a AccountInfo<'b>,
    clock: &'a Clock,
}

impl<'a, 'b> SlotHashesEntropy<'a, 'b> {
    pub fn new(slot_hashes: &'a AccountInfo<'b>, clock: &'a Clock) -> Result<Self, ProgramError> {
        if !sysvar::slot_hashes::check_id(slot_hashes.key) {
            msg!("Expected the SlotHashes sysvar, got {}", slot_hashes.key);
            return Err(ProgramError::InvalidArgument);
        }
        Ok(Self { slot_hashes, clock })
    }
}

impl<'a, 'b> EntropySource for SlotHashesEntropy<'a, 'b> {
    fn entropy(&self) -> Result<u64, ProgramError> {
        let data = self.slot_hashes.try_borrow_data()?;

        // Layout: u64 entry count, then (u64 slot, [u8; 32] hash) newest first
        let mut value = mix(self.clock.slot, self.clock.unix_timestamp as u64);
        if data.len() >= 48 {
            let hash = array_ref![data, 16, 32];
            for chunk in hash.chunks_exact(8) {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                value = mix(value, u64::from_le_bytes(word));
            }
        }
        Ok(value)
    }
}

/// splitmix64 finalizer over the sum of both inputs
pub fn mix(a: u64, b: u64) -> u64 {
    let mut z = a.wrapping_add(b).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Reduce a seed to an index in `0..len`
pub fn draw_index(entropy: u64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some((entropy % len as u64) as usize)
}
