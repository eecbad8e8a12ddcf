use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Deposit amount must be positive and keep the vault rent-exempt")]
    InvalidAmount,
    #[msg("Signer cannot cover the deposit")]
    InsufficientFunds,
    #[msg("Vault address does not derive from the signer")]
    Unauthorized,
    #[msg("Vault account must be a data-less system account")]
    InvalidVault,
    #[msg("Vault holds no lamports")]
    NothingToWithdraw,
    #[msg("No valid bump found for vault derivation")]
    DerivationExhausted,
}
