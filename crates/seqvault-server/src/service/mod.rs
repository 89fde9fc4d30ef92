//! Application state and dependency injection.

mod auth_keys;
mod config;
mod directory;

use seqvault_storage::ObjectStorage;

pub use crate::service::auth_keys::{AuthKeys, DEFAULT_AUDIENCE, DEFAULT_ISSUER};
pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::directory::{Directory, LaboratoryDirectory, StaticDirectory};
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    // External services:
    pub storage: ObjectStorage,
    pub directory: Directory,

    // Internal services:
    pub auth_keys: AuthKeys,
}

impl ServiceState {
    /// Assembles state from already constructed services.
    pub fn new(storage: ObjectStorage, directory: Directory, auth_keys: AuthKeys) -> Self {
        Self {
            storage,
            directory,
            auth_keys,
        }
    }

    /// Initializes application state from configuration.
    ///
    /// Loads the laboratory directory and key material, then connects to
    /// the object store.
    pub async fn from_config(service_config: &ServiceConfig) -> Result<Self> {
        let service_state = Self {
            directory: service_config.load_directory().await?,
            auth_keys: service_config.load_auth_keys().await?,
            storage: service_config.connect_storage().await?,
        };

        Ok(service_state)
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(storage: ObjectStorage);
impl_di!(directory: Directory);

// Internal services:
impl_di!(auth_keys: AuthKeys);
