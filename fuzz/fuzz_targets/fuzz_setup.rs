use anchor_lang::prelude::AccountInfo;
use anchor_lang::solana_program::entrypoint::ProgramResult;
use anchor_lang::InstructionData;
use anchor_lang::ToAccountMetas;
use solana_program_test::*;
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};

// Re-export for convenience
pub use anchor_vault::error::VaultError;
pub use solana_program_test::{BanksClientError, ProgramTestContext};

// Custom error type for fuzzing
pub type FuzzResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Upper bound on the fee a single-signature transaction pays in the test bank
pub const MAX_TX_FEE: u64 = 10_000;

/// Lamports every fresh owner starts with
pub const OWNER_FUNDING: u64 = 1_000_000_000;

/// Test environment with program loaded
pub struct FuzzTestEnv {
    pub program_id: Pubkey,
    pub context: ProgramTestContext,
}

/// A vault address together with the inputs it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultAccounts {
    pub vault: Pubkey,
    pub bump: u8,
    pub owner: Pubkey,
    pub extra_seed: Option<Pubkey>,
}

// ============================================================================
// Core Setup Functions
// ============================================================================

// Anchor's entrypoint wants a single lifetime for the slice and its accounts.
fn process_instruction<'a, 'b, 'c, 'd>(
    program_id: &'a Pubkey,
    accounts: &'b [AccountInfo<'c>],
    data: &'d [u8],
) -> ProgramResult {
    let accounts: &'c [AccountInfo<'c>] = Box::leak(Box::new(accounts.to_vec()));
    anchor_vault::entry(program_id, accounts, data)
}

/// Creates the program test environment with the vault program loaded in-process
pub async fn setup_program_test() -> FuzzTestEnv {
    let program_id = anchor_vault::id();
    let program_test = ProgramTest::new(
        "anchor_vault",
        program_id,
        processor!(process_instruction),
    );

    let context = program_test.start_with_context().await;

    FuzzTestEnv {
        program_id,
        context,
    }
}

/// Moves lamports from the bank's payer to `to`
pub async fn fund_account(
    context: &mut ProgramTestContext,
    to: &Pubkey,
    lamports: u64,
) -> FuzzResult<()> {
    let ix = solana_sdk::system_instruction::transfer(&context.payer.pubkey(), to, lamports);

    let blockhash = context.get_new_latest_blockhash().await?;
    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer],
        blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(())
}

/// Creates a new vault owner funded with `lamports` on top of the rent floor
pub async fn setup_owner(context: &mut ProgramTestContext, lamports: u64) -> FuzzResult<Keypair> {
    let owner = Keypair::new();

    let rent = context.banks_client.get_rent().await?;
    fund_account(context, &owner.pubkey(), rent.minimum_balance(0) + lamports).await?;

    Ok(owner)
}

/// Derives the vault for `owner` (and optional discriminator)
pub fn setup_vault(program_id: &Pubkey, owner: &Pubkey, extra_seed: Option<Pubkey>) -> VaultAccounts {
    let (vault, bump) = derive_vault_pda(program_id, owner, extra_seed.as_ref());

    VaultAccounts {
        vault,
        bump,
        owner: *owner,
        extra_seed,
    }
}

// ============================================================================
// Instruction Builders
// ============================================================================

/// Builds a deposit instruction; `vault` is passed through unchecked so callers
/// can probe substitution
pub fn deposit_ix(
    program_id: &Pubkey,
    signer: &Pubkey,
    vault: &Pubkey,
    extra_seed: Option<Pubkey>,
    amount: u64,
) -> Instruction {
    let accounts = anchor_vault::accounts::Deposit {
        signer: *signer,
        vault: *vault,
        extra_seed,
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: anchor_vault::instruction::Deposit { amount }.data(),
    }
}

/// Builds a withdraw instruction
pub fn withdraw_ix(
    program_id: &Pubkey,
    signer: &Pubkey,
    vault: &Pubkey,
    extra_seed: Option<Pubkey>,
) -> Instruction {
    let accounts = anchor_vault::accounts::Withdraw {
        signer: *signer,
        vault: *vault,
        extra_seed,
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: anchor_vault::instruction::Withdraw {}.data(),
    }
}

/// Signs `ix` with `signer` as fee payer and processes it against a fresh
/// blockhash, so repeated identical instructions are not deduplicated
pub async fn process_ix(
    context: &mut ProgramTestContext,
    ix: Instruction,
    signer: &Keypair,
) -> Result<(), BanksClientError> {
    let blockhash = context.get_new_latest_blockhash().await?;

    let tx = Transaction::new_signed_with_payer(&[ix], Some(&signer.pubkey()), &[signer], blockhash);

    context.banks_client.process_transaction(tx).await
}

/// Owner deposits `amount` into its own vault
pub async fn deposit(
    env: &mut FuzzTestEnv,
    owner: &Keypair,
    vault: &VaultAccounts,
    amount: u64,
) -> Result<(), BanksClientError> {
    let ix = deposit_ix(&env.program_id, &owner.pubkey(), &vault.vault, vault.extra_seed, amount);
    process_ix(&mut env.context, ix, owner).await
}

/// `signer` asks to drain `vault`
pub async fn withdraw(
    env: &mut FuzzTestEnv,
    signer: &Keypair,
    vault: &VaultAccounts,
) -> Result<(), BanksClientError> {
    let ix = withdraw_ix(&env.program_id, &signer.pubkey(), &vault.vault, vault.extra_seed);
    process_ix(&mut env.context, ix, signer).await
}

/// Sets up everything: program + funded owner + derived vault
pub async fn setup_complete_environment(
    owner_lamports: u64,
    extra_seed: Option<Pubkey>,
) -> FuzzResult<(FuzzTestEnv, Keypair, VaultAccounts)> {
    let mut env = setup_program_test().await;

    let owner = setup_owner(&mut env.context, owner_lamports).await?;
    let vault = setup_vault(&env.program_id, &owner.pubkey(), extra_seed);

    Ok((env, owner, vault))
}

// ============================================================================
// PDA Derivation Helpers
// ============================================================================

/// Client-side mirror of the program's vault derivation
pub fn derive_vault_pda(
    program_id: &Pubkey,
    owner: &Pubkey,
    extra_seed: Option<&Pubkey>,
) -> (Pubkey, u8) {
    match extra_seed {
        Some(extra) => Pubkey::find_program_address(
            &[anchor_vault::VAULT_SEED, owner.as_ref(), extra.as_ref()],
            program_id,
        ),
        None => Pubkey::find_program_address(&[anchor_vault::VAULT_SEED, owner.as_ref()], program_id),
    }
}

// ============================================================================
// Account State Verification Helpers
// ============================================================================

/// Lamports held at `address`; zero when the account does not exist
pub async fn get_lamports(context: &mut ProgramTestContext, address: &Pubkey) -> FuzzResult<u64> {
    Ok(context.banks_client.get_balance(*address).await?)
}

/// Whether the runtime still holds an account at `address`
pub async fn account_exists(context: &mut ProgramTestContext, address: &Pubkey) -> FuzzResult<bool> {
    Ok(context.banks_client.get_account(*address).await?.is_some())
}

/// Rent-exempt floor for a data-less account
pub async fn rent_floor(context: &mut ProgramTestContext) -> FuzzResult<u64> {
    Ok(context.banks_client.get_rent().await?.minimum_balance(0))
}

/// Extracts the custom program error code from a failed transaction
pub fn custom_error_code(err: &BanksClientError) -> Option<u32> {
    match err {
        BanksClientError::TransactionError(TransactionError::InstructionError(
            _,
            InstructionError::Custom(code),
        ))
        | BanksClientError::SimulationError {
            err: TransactionError::InstructionError(_, InstructionError::Custom(code)),
            ..
        } => Some(*code),
        _ => None,
    }
}

/// Whether `err` is the given vault error
pub fn is_vault_error(err: &BanksClientError, expected: VaultError) -> bool {
    custom_error_code(err) == Some(u32::from(expected))
}

/// Whether the runtime refused the transaction before the program decided
/// anything, because the fee payer ran dry (or was emptied outright)
pub fn is_fee_rejection(err: &BanksClientError) -> bool {
    matches!(
        err,
        BanksClientError::TransactionError(
            TransactionError::AccountNotFound
                | TransactionError::InsufficientFundsForFee
                | TransactionError::InsufficientFundsForRent { .. }
        )
    )
}
