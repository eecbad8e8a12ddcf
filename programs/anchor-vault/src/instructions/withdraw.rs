use anchor_lang::prelude::*;
use anchor_lang::system_program::{transfer, Transfer};

use crate::error::VaultError;
use crate::events::VaultWithdrawn;
use crate::state::{assert_vault_address, checked_withdraw};

#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Must be the identity the vault was derived from
    #[account(mut)]
    pub signer: Signer<'info>,

    /// Drained to zero lamports, which closes it
    #[account(mut)]
    pub vault: SystemAccount<'info>,

    /// CHECK: Only its address is used, as an extra derivation seed
    pub extra_seed: Option<UncheckedAccount<'info>>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Withdraw>) -> Result<()> {
    let signer = &ctx.accounts.signer;
    let vault = &ctx.accounts.vault;
    let extra = ctx.accounts.extra_seed.as_ref().map(|seed| seed.key());

    // There is no stored owner: reproducing the derivation from the signer is
    // the only proof of ownership.
    let vault_seeds =
        assert_vault_address(&vault.key(), &signer.key(), extra.as_ref(), ctx.program_id)?;

    require!(vault.data_is_empty(), VaultError::InvalidVault);

    let amount = checked_withdraw(vault.lamports())?;

    let seeds = vault_seeds.signer_seeds();
    let signer_seeds = &[seeds.as_slice()];

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.system_program.to_account_info(),
        Transfer {
            from: vault.to_account_info(),
            to: signer.to_account_info(),
        },
        signer_seeds,
    );

    transfer(cpi_ctx, amount)?;

    emit!(VaultWithdrawn {
        owner: signer.key(),
        vault: vault.key(),
        amount,
    });

    msg!("Withdraw successful!");
    msg!("Vault: {}", vault.key());
    msg!("Withdrawn: {} lamports", amount);
    msg!("Vault bump: {}", vault_seeds.bump());

    Ok(())
}
