// NFT Raffle Client - Configuration

/// Compute-unit ceiling for the winner token account transaction
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 400_000;

/// Priority fee for the winner token account transaction
pub const DEFAULT_PRIORITY_FEE_MICRO_LAMPORTS: u64 = 1_000_000;

/// Budget attached to the auxiliary transaction of the settlement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementConfig {
    pub compute_unit_limit: u32,
    /// Price per compute unit, in micro-lamports
    pub priority_fee_micro_lamports: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            compute_unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            priority_fee_micro_lamports: DEFAULT_PRIORITY_FEE_MICRO_LAMPORTS,
        }
    }
}
