use arbitrary::{Arbitrary, Unstructured};
use fuzz_helpers::*;
use honggfuzz::fuzz;
use solana_sdk::{pubkey::Pubkey, signature::Signer};

/// Who signs a withdraw attempt and which discriminator it claims
#[derive(Debug, Clone, Copy, Arbitrary)]
enum WithdrawAttempt {
    Owner,
    OwnerWithoutSeed,
    OwnerWithWrongSeed,
    Attacker,
    AttackerWithOwnerSeed,
}

/// Fuzzable input for withdraw authorization
#[derive(Debug, Clone, Arbitrary)]
struct WithdrawFuzzInput {
    /// Amount the owner deposits up front (fuzzed)
    deposit_amount: u64,
    /// Whether the vault is derived with an extra discriminator
    use_extra_seed: bool,
    /// Withdraw attempts, in order
    attempts: Vec<WithdrawAttempt>,
}

async fn fuzz_withdraw_once(input: WithdrawFuzzInput) -> FuzzResult<()> {
    let extra_seed = input.use_extra_seed.then(Pubkey::new_unique);

    let (mut env, owner, vault) = setup_complete_environment(OWNER_FUNDING, extra_seed).await?;
    let attacker = setup_owner(&mut env.context, OWNER_FUNDING).await?;

    let floor = rent_floor(&mut env.context).await?;
    let deposit_amount = floor + input.deposit_amount % OWNER_FUNDING / 2;

    deposit(&mut env, &owner, &vault, deposit_amount).await?;

    let mut vault_balance = deposit_amount;

    for attempt in input.attempts.iter().take(6) {
        let (signer, claimed_seed) = match attempt {
            WithdrawAttempt::Owner => (&owner, vault.extra_seed),
            WithdrawAttempt::OwnerWithoutSeed => (&owner, None),
            WithdrawAttempt::OwnerWithWrongSeed => (&owner, Some(Pubkey::new_unique())),
            WithdrawAttempt::Attacker => (&attacker, None),
            WithdrawAttempt::AttackerWithOwnerSeed => (&attacker, vault.extra_seed),
        };

        let authorized = signer.pubkey() == owner.pubkey() && claimed_seed == vault.extra_seed;
        let signer_before = get_lamports(&mut env.context, &signer.pubkey()).await?;

        let ix = withdraw_ix(&env.program_id, &signer.pubkey(), &vault.vault, claimed_seed);
        let result = process_ix(&mut env.context, ix, signer).await;

        let signer_after = get_lamports(&mut env.context, &signer.pubkey()).await?;
        let vault_after = get_lamports(&mut env.context, &vault.vault).await?;

        match (authorized, vault_balance, result) {
            (true, 0, Err(e)) => {
                assert!(is_vault_error(&e, VaultError::NothingToWithdraw), "{:?}", e);
                assert_eq!(vault_after, 0);
            }
            (true, balance, Ok(())) if balance > 0 => {
                assert_eq!(vault_after, 0, "Withdraw must drain the vault");
                assert!(
                    signer_after + MAX_TX_FEE >= signer_before + balance,
                    "Owner recovered {} of {}",
                    signer_after.saturating_sub(signer_before),
                    balance
                );
                vault_balance = 0;
            }
            (false, balance, Err(e)) => {
                assert!(is_vault_error(&e, VaultError::Unauthorized), "{:?}", e);
                assert_eq!(vault_after, balance, "Rejected withdraw moved vault lamports");
                assert!(signer_after <= signer_before, "Attacker gained lamports");
            }
            (authorized, balance, result) => panic!(
                "Unexpected outcome: authorized={} vault={} result={:?}\nInput: {:?}",
                authorized, balance, result, input
            ),
        }
    }

    Ok(())
}

fn main() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    loop {
        fuzz!(|data: &[u8]| {
            let Ok(input) = WithdrawFuzzInput::arbitrary(&mut Unstructured::new(data)) else {
                return;
            };

            runtime.block_on(async {
                if let Err(e) = fuzz_withdraw_once(input).await {
                    eprintln!("Fuzz iteration failed: {}", e);
                }
            });
        });
    }
}
