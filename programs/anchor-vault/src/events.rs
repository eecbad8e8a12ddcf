use anchor_lang::prelude::*;

#[event]
pub struct VaultDeposited {
    pub owner: Pubkey,
    pub vault: Pubkey,
    pub amount: u64,
    /// Vault balance after the transfer
    pub balance: u64,
}

#[event]
pub struct VaultWithdrawn {
    pub owner: Pubkey,
    pub vault: Pubkey,
    /// Entire pre-withdrawal balance; the vault is closed afterwards
    pub amount: u64,
}
