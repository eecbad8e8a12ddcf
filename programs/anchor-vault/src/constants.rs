/// Tag prefixed to every vault derivation. Changing it orphans existing vaults.
pub const VAULT_SEED: &[u8] = b"vault";

/// Vaults are plain lamport accounts and never allocate data.
pub const VAULT_SPACE: usize = 0;
