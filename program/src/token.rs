// NFT Raffle Program - Token program variants
use solana_program::{account_info::AccountInfo, program_error::ProgramError, pubkey::Pubkey};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_token_2022::{
    extension::StateWithExtensions,
    state::{Account as TokenAccount, Mint},
};

/// The two token standards a prize NFT can live under.
///
/// The variant is never stored; it is read from the owner of the mint
/// account every time it is needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenVariant {
    /// The original SPL token program
    Classic,
    /// The token program with extensions (Token-2022)
    Extended,
}

impl TokenVariant {
    /// Classify an account owner, `None` for anything that is not a token program
    pub fn from_program_id(program_id: &Pubkey) -> Option<Self> {
        if *program_id == spl_token::id() {
            Some(TokenVariant::Classic)
        } else if *program_id == spl_token_2022::id() {
            Some(TokenVariant::Extended)
        } else {
            None
        }
    }

    pub fn token_program_id(self) -> Pubkey {
        match self {
            TokenVariant::Classic => spl_token::id(),
            TokenVariant::Extended => spl_token_2022::id(),
        }
    }

    pub fn associated_token_program_id(self) -> Pubkey {
        match self {
            TokenVariant::Classic | TokenVariant::Extended => spl_associated_token_account::id(),
        }
    }

    /// Canonical receiving account of `wallet` for `mint` under this variant
    pub fn associated_token_address(self, wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(wallet, mint, &self.token_program_id())
    }
}

/// Decode a mint account of either variant
pub fn unpack_mint(info: &AccountInfo) -> Result<Mint, ProgramError> {
    let data = info.try_borrow_data()?;
    Ok(StateWithExtensions::<Mint>::unpack(&data)?.base)
}

/// Decode a token account of either variant
pub fn unpack_token_account(info: &AccountInfo) -> Result<TokenAccount, ProgramError> {
    let data = info.try_borrow_data()?;
    Ok(StateWithExtensions::<TokenAccount>::unpack(&data)?.base)
}
