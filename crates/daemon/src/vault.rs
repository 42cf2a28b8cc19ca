use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use common::crypto::Secret;

/// Authorization record for one shared path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub secret: Secret,
    pub otp: String,
}

/// Server-resident store mapping file path -> current authorization record
///
/// The vault is the only shared mutable state in the server. Download
/// handlers read it concurrently; the IPC listener is the sole writer.
/// `insert` replaces any existing entry for the path - re-sharing a path
/// invalidates every token signed with the superseded secret. Entries
/// live for the lifetime of the server process; there is no eviction.
///
/// The vault is an owned, injected handle (cheap to clone), never a
/// process-global, so tests can substitute isolated instances.
#[derive(Debug, Default, Clone)]
pub struct Vault {
    inner: Arc<RwLock<HashMap<PathBuf, Record>>>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replace the record for `path` (last write wins).
    pub fn insert(&self, path: PathBuf, record: Record) {
        self.inner.write().insert(path, record);
    }

    /// Current record for `path`, if the path has been shared.
    pub fn get(&self, path: &Path) -> Option<Record> {
        self.inner.read().get(path).cloned()
    }
}
