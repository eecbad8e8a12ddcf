#![no_main]

use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;
use fuzz_helpers::*;
use solana_sdk::{pubkey::Pubkey, signature::Signer};

/// Fuzzable input for a run of deposits against one vault
#[derive(Debug, Clone, Arbitrary)]
struct DepositFuzzInput {
    /// Amounts to deposit in order (fuzzed)
    amounts: Vec<u64>,
    /// Extra owner balance on top of the rent floor (for setup)
    owner_balance: u64,
    /// Whether the vault is derived with an extra discriminator
    use_extra_seed: bool,
    /// Whether to drain the vault after the deposits
    withdraw_after: bool,
}

/// Execute a single fuzz iteration for the deposit instruction
async fn fuzz_deposit_once(input: DepositFuzzInput) -> FuzzResult<()> {
    // Keep runs short and balances within what the test bank can fund
    let owner_balance = input.owner_balance % (100 * OWNER_FUNDING);
    let amounts: Vec<u64> = input
        .amounts
        .iter()
        .take(8)
        .map(|amount| amount % (2 * OWNER_FUNDING))
        .collect();

    let extra_seed = input.use_extra_seed.then(Pubkey::new_unique);

    let (mut env, owner, vault) = match setup_complete_environment(owner_balance, extra_seed).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Setup failed: {}", e);
            return Ok(()); // Skip this iteration if setup fails
        }
    };

    let floor = rent_floor(&mut env.context).await?;
    let mut expected_vault = 0u64;

    for amount in amounts {
        let vault_before = get_lamports(&mut env.context, &vault.vault).await?;
        let owner_before = get_lamports(&mut env.context, &owner.pubkey()).await?;

        match deposit(&mut env, &owner, &vault, amount).await {
            Ok(_) => {
                let vault_after = get_lamports(&mut env.context, &vault.vault).await?;
                let owner_after = get_lamports(&mut env.context, &owner.pubkey()).await?;

                // PROPERTY 1: the vault grows by exactly the deposit
                assert_eq!(
                    vault_after,
                    vault_before + amount,
                    "Vault balance should increase by exact deposit amount"
                );

                // PROPERTY 2: the owner pays the deposit plus at most one fee
                assert!(
                    owner_before - owner_after >= amount
                        && owner_before - owner_after <= amount + MAX_TX_FEE,
                    "Owner paid {} for a deposit of {}",
                    owner_before - owner_after,
                    amount
                );

                // PROPERTY 3: a funded vault is always rent-exempt
                assert!(
                    vault_after >= floor,
                    "Vault left below rent floor: {} < {}",
                    vault_after,
                    floor
                );

                expected_vault += amount;
            }
            Err(e) => {
                // Rejections must leave the vault alone
                let acceptable = is_vault_error(&e, VaultError::InvalidAmount)
                    || is_vault_error(&e, VaultError::InsufficientFunds)
                    || is_fee_rejection(&e);

                if !acceptable {
                    panic!("Unexpected error during deposit: {:?}\nInput: {:?}", e, input);
                }

                assert_eq!(
                    get_lamports(&mut env.context, &vault.vault).await?,
                    vault_before,
                    "Rejected deposit moved vault lamports"
                );
            }
        }
    }

    // PROPERTY 4: deposits accumulate
    assert_eq!(get_lamports(&mut env.context, &vault.vault).await?, expected_vault);

    if input.withdraw_after {
        let owner_before = get_lamports(&mut env.context, &owner.pubkey()).await?;
        let result = withdraw(&mut env, &owner, &vault).await;

        if let Err(e) = &result {
            if is_fee_rejection(e) {
                return Ok(());
            }
        }

        if expected_vault == 0 {
            let err = result.expect_err("Withdraw from an empty vault must fail");
            assert!(is_vault_error(&err, VaultError::NothingToWithdraw), "{:?}", err);
        } else {
            result?;

            // PROPERTY 5: withdraw drains the vault into the owner
            let owner_after = get_lamports(&mut env.context, &owner.pubkey()).await?;
            assert_eq!(get_lamports(&mut env.context, &vault.vault).await?, 0);
            assert!(
                owner_after + MAX_TX_FEE >= owner_before + expected_vault,
                "Owner recovered {} of {}",
                owner_after.saturating_sub(owner_before),
                expected_vault
            );
        }
    }

    println!(
        "✓ PASS - deposits settled at {} lamports (extra seed: {}, withdrawn: {})",
        expected_vault,
        vault.extra_seed.is_some(),
        input.withdraw_after
    );

    Ok(())
}

fuzz_target!(|input: DepositFuzzInput| {
    // Run the async fuzz test
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        if let Err(e) = fuzz_deposit_once(input).await {
            eprintln!("Fuzz iteration failed: {}", e);
        }
    });
});
