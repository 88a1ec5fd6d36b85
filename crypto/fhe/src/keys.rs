//! FHE key management
//!
//! The client key encrypts and decrypts; the server key evaluates
//! homomorphic operations. TFHE-rs requires the server key to be installed
//! in a process-global slot before any operation runs.

use crate::FheResult;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::Arc;
use tfhe::{generate_keys, ConfigBuilder};
use tfhe::{ClientKey as TfheClientKey, ServerKey as TfheServerKey};

static GLOBAL_SERVER_KEY: OnceCell<Arc<RwLock<Option<TfheServerKey>>>> = OnceCell::new();

fn global_slot() -> &'static Arc<RwLock<Option<TfheServerKey>>> {
    GLOBAL_SERVER_KEY.get_or_init(|| Arc::new(RwLock::new(None)))
}

/// Install a server key for homomorphic operations
pub fn install_server_key(key: &ServerKey) {
    let mut guard = global_slot().write();
    *guard = Some(key.inner.clone());

    // Also set in the TFHE-rs global context
    tfhe::set_server_key(key.inner.clone());
}

/// Client key for encryption and decryption
///
/// Held by the decryption oracle; never shared with evaluators.
#[derive(Clone)]
pub struct ClientKey {
    pub(crate) inner: TfheClientKey,
}

impl ClientKey {
    /// Get reference to the inner TFHE-rs key
    pub fn inner(&self) -> &TfheClientKey {
        &self.inner
    }
}

impl std::fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientKey").finish()
    }
}

/// Server key for homomorphic evaluation
///
/// Safe to share with evaluators; grants no decryption ability.
#[derive(Clone)]
pub struct ServerKey {
    pub(crate) inner: TfheServerKey,
}

impl ServerKey {
    /// Install this key in the process-global slot
    pub fn install(&self) {
        install_server_key(self);
    }
}

impl std::fmt::Debug for ServerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerKey").finish()
    }
}

/// Client/server key pair for a local deployment
#[derive(Clone, Debug)]
pub struct ServiceKeys {
    /// Client key (secret)
    pub client: ClientKey,
    /// Server key (shareable)
    pub server: ServerKey,
}

impl ServiceKeys {
    /// Generate a fresh key pair
    ///
    /// WARNING: key generation is slow (tens of seconds)
    pub fn generate() -> FheResult<Self> {
        let config = ConfigBuilder::default().build();
        let (client, server) = generate_keys(config);

        Ok(Self {
            client: ClientKey { inner: client },
            server: ServerKey { inner: server },
        })
    }

    /// Install the server key in the process-global slot
    pub fn install(&self) {
        self.server.install();
    }
}
