use anchor_lang::prelude::*;
use anchor_lang::system_program::{transfer, Transfer};

use crate::constants::VAULT_SPACE;
use crate::error::VaultError;
use crate::events::VaultDeposited;
use crate::state::{assert_vault_address, checked_deposit};

#[derive(Accounts)]
pub struct Deposit<'info> {
    /// The vault owner, funding the deposit
    #[account(mut)]
    pub signer: Signer<'info>,

    /// Lamport-only PDA derived from the signer; created by the first deposit
    #[account(mut)]
    pub vault: SystemAccount<'info>,

    /// CHECK: Only its address is used, as an extra derivation seed
    pub extra_seed: Option<UncheckedAccount<'info>>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    let signer = &ctx.accounts.signer;
    let vault = &ctx.accounts.vault;
    let extra = ctx.accounts.extra_seed.as_ref().map(|seed| seed.key());

    assert_vault_address(&vault.key(), &signer.key(), extra.as_ref(), ctx.program_id)?;

    require!(vault.data_is_empty(), VaultError::InvalidVault);

    let rent_floor = Rent::get()?.minimum_balance(VAULT_SPACE);
    let balance = checked_deposit(vault.lamports(), signer.lamports(), amount, rent_floor)?;

    let cpi_ctx = CpiContext::new(
        ctx.accounts.system_program.to_account_info(),
        Transfer {
            from: signer.to_account_info(),
            to: vault.to_account_info(),
        },
    );

    transfer(cpi_ctx, amount)?;

    emit!(VaultDeposited {
        owner: signer.key(),
        vault: vault.key(),
        amount,
        balance,
    });

    msg!("Deposit successful!");
    msg!("Vault: {}", vault.key());
    msg!("Deposited: {} lamports", amount);
    msg!("Vault balance: {}", balance);

    Ok(())
}
