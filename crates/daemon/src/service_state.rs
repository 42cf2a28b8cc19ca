use crate::vault::Vault;

/// Main service state shared by the HTTP handlers and the IPC listener
///
/// The vault is the single piece of server-wide mutable state; everything
/// else a handler touches is its own socket and file I/O.
#[derive(Debug, Clone)]
pub struct State {
    vault: Vault,
}

impl State {
    pub fn new() -> Self {
        Self {
            vault: Vault::new(),
        }
    }

    /// Build state around an existing vault (tests inject their own).
    pub fn with_vault(vault: Vault) -> Self {
        Self { vault }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
