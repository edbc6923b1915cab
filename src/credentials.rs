// src/credentials.rs - Persisted network credentials
use crate::{error::Result, storage::FileStore};
use tracing::info;

pub const SSID_KEY: &str = "ssid.txt";
pub const PASSWORD_KEY: &str = "password.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

/// The two plain-text credential records written by network provisioning.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    store: FileStore,
}

impl CredentialStore {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// Stored credentials, or `None` if either record is absent or empty.
    ///
    /// Only the first line of each record is significant.
    pub fn load(&self) -> Result<Option<Credentials>> {
        let first_line = |key: &str| -> Result<Option<String>> {
            Ok(self
                .store
                .read(key)?
                .and_then(|s| s.lines().next().map(str::to_owned))
                .filter(|s| !s.is_empty()))
        };

        match (first_line(SSID_KEY)?, first_line(PASSWORD_KEY)?) {
            (Some(ssid), Some(password)) => Ok(Some(Credentials { ssid, password })),
            _ => Ok(None),
        }
    }

    pub fn save(&self, credentials: &Credentials) -> Result<()> {
        self.store.write(SSID_KEY, &credentials.ssid)?;
        self.store.write(PASSWORD_KEY, &credentials.password)?;
        info!("Network credentials saved for '{}'", credentials.ssid);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(SSID_KEY)?;
        self.store.remove(PASSWORD_KEY)?;
        info!("Network credentials cleared");
        Ok(())
    }
}
