use anchor_lang::prelude::*;

use crate::{constants::VAULT_SEED, error::VaultError};

/// Seeds of a vault PDA, without the bump.
///
/// Layout is `[VAULT_SEED, owner, extra?]`; clients must reproduce it byte
/// for byte to locate an existing vault.
pub fn vault_seeds<'a>(owner: &'a Pubkey, extra: Option<&'a Pubkey>) -> Vec<&'a [u8]> {
    let mut seeds = vec![VAULT_SEED, owner.as_ref()];
    if let Some(extra) = extra {
        seeds.push(extra.as_ref());
    }
    seeds
}

/// Derive the vault address and canonical bump for `owner` (and `extra`).
pub fn derive_vault_address(
    owner: &Pubkey,
    extra: Option<&Pubkey>,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&vault_seeds(owner, extra), program_id)
        .ok_or_else(|| error!(VaultError::DerivationExhausted))
}

/// A validated vault derivation, kept around so the withdraw CPI signs with
/// exactly the seeds that were checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultSeeds {
    pub owner: Pubkey,
    pub extra: Option<Pubkey>,
    bump: [u8; 1],
}

impl VaultSeeds {
    pub fn bump(&self) -> u8 {
        self.bump[0]
    }

    pub fn signer_seeds(&self) -> Vec<&[u8]> {
        let mut seeds = vault_seeds(&self.owner, self.extra.as_ref());
        seeds.push(&self.bump);
        seeds
    }
}

/// Re-derive the vault from `owner` and `extra` and require that it is the
/// account the caller supplied.
pub fn assert_vault_address(
    supplied: &Pubkey,
    owner: &Pubkey,
    extra: Option<&Pubkey>,
    program_id: &Pubkey,
) -> Result<VaultSeeds> {
    let (expected, bump) = derive_vault_address(owner, extra, program_id)?;

    require_keys_eq!(*supplied, expected, VaultError::Unauthorized);

    Ok(VaultSeeds {
        owner: *owner,
        extra: extra.copied(),
        bump: [bump],
    })
}

/// Vault balance after depositing `amount`.
///
/// Both accounts are data-less, so one `rent_floor` applies to each. The
/// signer may be emptied but never left below the floor. An empty vault is
/// being (re)created, so the deposit alone has to lift it to the floor.
pub fn checked_deposit(
    vault_balance: u64,
    signer_balance: u64,
    amount: u64,
    rent_floor: u64,
) -> Result<u64> {
    require_gt!(amount, 0, VaultError::InvalidAmount);

    let remaining = signer_balance
        .checked_sub(amount)
        .ok_or(VaultError::InsufficientFunds)?;
    require!(
        remaining == 0 || remaining >= rent_floor,
        VaultError::InsufficientFunds
    );

    let balance = vault_balance
        .checked_add(amount)
        .ok_or(VaultError::InvalidAmount)?;

    if vault_balance == 0 {
        require_gte!(balance, rent_floor, VaultError::InvalidAmount);
    }

    Ok(balance)
}

/// Lamports a withdrawal moves: always the whole balance.
pub fn checked_withdraw(vault_balance: u64) -> Result<u64> {
    require_gt!(vault_balance, 0, VaultError::NothingToWithdraw);
    Ok(vault_balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::error::Error;

    const RENT_FLOOR: u64 = 890_880;

    fn code(err: Error) -> u32 {
        match err {
            Error::AnchorError(e) => e.error_code_number,
            Error::ProgramError(e) => panic!("expected a vault error, got {:?}", e),
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let owner = Pubkey::new_unique();
        let extra = Pubkey::new_unique();

        let first = derive_vault_address(&owner, Some(&extra), &crate::ID).unwrap();
        let second = derive_vault_address(&owner, Some(&extra), &crate::ID).unwrap();
        assert_eq!(first, second);

        let plain = derive_vault_address(&owner, None, &crate::ID).unwrap();
        assert_eq!(plain, derive_vault_address(&owner, None, &crate::ID).unwrap());
    }

    #[test]
    fn derivation_matches_find_program_address() {
        let owner = Pubkey::new_unique();
        let expected = Pubkey::find_program_address(&[b"vault", owner.as_ref()], &crate::ID);

        assert_eq!(derive_vault_address(&owner, None, &crate::ID).unwrap(), expected);
    }

    #[test]
    fn derived_address_is_off_curve() {
        let owner = Pubkey::new_unique();
        let (vault, _) = derive_vault_address(&owner, None, &crate::ID).unwrap();
        assert!(!vault.is_on_curve());
    }

    #[test]
    fn owners_and_discriminators_separate_vaults() {
        let owner = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let extra_a = Pubkey::new_unique();
        let extra_b = Pubkey::new_unique();

        let addresses = [
            derive_vault_address(&owner, None, &crate::ID).unwrap().0,
            derive_vault_address(&other, None, &crate::ID).unwrap().0,
            derive_vault_address(&owner, Some(&extra_a), &crate::ID).unwrap().0,
            derive_vault_address(&owner, Some(&extra_b), &crate::ID).unwrap().0,
            derive_vault_address(&other, Some(&extra_a), &crate::ID).unwrap().0,
        ];

        for (i, a) in addresses.iter().enumerate() {
            for b in &addresses[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn derivation_is_program_scoped() {
        let owner = Pubkey::new_unique();
        let foreign = Pubkey::new_unique();

        assert_ne!(
            derive_vault_address(&owner, None, &crate::ID).unwrap(),
            derive_vault_address(&owner, None, &foreign).unwrap()
        );
    }

    #[test]
    fn assert_vault_address_accepts_own_vault() {
        let owner = Pubkey::new_unique();
        let extra = Pubkey::new_unique();
        let (vault, bump) = derive_vault_address(&owner, Some(&extra), &crate::ID).unwrap();

        let seeds = assert_vault_address(&vault, &owner, Some(&extra), &crate::ID).unwrap();
        assert_eq!(seeds.bump(), bump);
        assert_eq!(seeds.owner, owner);
        assert_eq!(seeds.extra, Some(extra));
    }

    #[test]
    fn assert_vault_address_rejects_foreign_vault() {
        let owner = Pubkey::new_unique();
        let attacker = Pubkey::new_unique();
        let (vault, _) = derive_vault_address(&owner, None, &crate::ID).unwrap();

        let err = assert_vault_address(&vault, &attacker, None, &crate::ID).unwrap_err();
        assert_eq!(code(err), u32::from(VaultError::Unauthorized));
    }

    #[test]
    fn assert_vault_address_rejects_missing_discriminator() {
        let owner = Pubkey::new_unique();
        let extra = Pubkey::new_unique();
        let (vault, _) = derive_vault_address(&owner, Some(&extra), &crate::ID).unwrap();

        let err = assert_vault_address(&vault, &owner, None, &crate::ID).unwrap_err();
        assert_eq!(code(err), u32::from(VaultError::Unauthorized));
    }

    #[test]
    fn signer_seeds_recreate_the_vault() {
        let owner = Pubkey::new_unique();
        let extra = Pubkey::new_unique();
        let (vault, _) = derive_vault_address(&owner, Some(&extra), &crate::ID).unwrap();
        let seeds = assert_vault_address(&vault, &owner, Some(&extra), &crate::ID).unwrap();

        let signer_seeds = seeds.signer_seeds();
        assert_eq!(signer_seeds.len(), 4);
        assert_eq!(
            Pubkey::create_program_address(&signer_seeds, &crate::ID).unwrap(),
            vault
        );
    }

    #[test]
    fn deposits_accumulate() {
        let first = checked_deposit(0, 50_000_000, 10_000_000, RENT_FLOOR).unwrap();
        assert_eq!(first, 10_000_000);

        let second = checked_deposit(first, 40_000_000, 10_000_000, RENT_FLOOR).unwrap();
        assert_eq!(second, 20_000_000);
    }

    #[test]
    fn deposit_rejects_zero() {
        let err = checked_deposit(0, 50_000_000, 0, RENT_FLOOR).unwrap_err();
        assert_eq!(code(err), u32::from(VaultError::InvalidAmount));
    }

    #[test]
    fn deposit_rejects_short_signer() {
        let err = checked_deposit(0, 9_999_999, 10_000_000, RENT_FLOOR).unwrap_err();
        assert_eq!(code(err), u32::from(VaultError::InsufficientFunds));
    }

    #[test]
    fn deposit_keeps_signer_rent_exempt() {
        let err = checked_deposit(0, 10_000_000 + RENT_FLOOR - 1, 10_000_000, RENT_FLOOR)
            .unwrap_err();
        assert_eq!(code(err), u32::from(VaultError::InsufficientFunds));

        // draining the signer completely is fine
        assert_eq!(
            checked_deposit(0, 10_000_000, 10_000_000, RENT_FLOOR).unwrap(),
            10_000_000
        );
        assert_eq!(
            checked_deposit(0, 10_000_000 + RENT_FLOOR, 10_000_000, RENT_FLOOR).unwrap(),
            10_000_000
        );
    }

    #[test]
    fn deposit_rejects_overflow() {
        let err = checked_deposit(u64::MAX, u64::MAX, 1, RENT_FLOOR).unwrap_err();
        assert_eq!(code(err), u32::from(VaultError::InvalidAmount));
    }

    #[test]
    fn opening_deposit_must_cover_rent() {
        let err = checked_deposit(0, 50_000_000, RENT_FLOOR - 1, RENT_FLOOR).unwrap_err();
        assert_eq!(code(err), u32::from(VaultError::InvalidAmount));

        assert_eq!(
            checked_deposit(0, 50_000_000, RENT_FLOOR, RENT_FLOOR).unwrap(),
            RENT_FLOOR
        );
        // funded vaults already sit above the floor
        assert_eq!(
            checked_deposit(RENT_FLOOR, 50_000_000, 1, RENT_FLOOR).unwrap(),
            RENT_FLOOR + 1
        );
    }

    #[test]
    fn withdraw_takes_everything() {
        assert_eq!(checked_withdraw(20_000_000).unwrap(), 20_000_000);
    }

    #[test]
    fn withdraw_from_empty_vault_fails() {
        let err = checked_withdraw(0).unwrap_err();
        assert_eq!(code(err), u32::from(VaultError::NothingToWithdraw));
    }
}
