use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_PREFIX: &str = "optica-admin";

/// Admin passwords remembered in the OS keychain.
///
/// Entries are scoped to one backend, so a staging login never answers for
/// production with the same username.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
}

impl CredentialStore {
    pub fn for_backend(base_url: &str) -> Self {
        Self {
            service: service_name(base_url),
        }
    }

    fn entry(&self, username: &str) -> Result<Entry> {
        Entry::new(&self.service, username).context("Failed to create keyring entry")
    }

    pub fn remember(&self, username: &str, password: &str) -> Result<()> {
        self.entry(username)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// `None` when nothing was remembered for this user.
    pub fn recall(&self, username: &str) -> Result<Option<String>> {
        match self.entry(username)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve password from keychain"),
        }
    }

    /// Forgetting a user that was never remembered is not an error.
    pub fn forget(&self, username: &str) -> Result<()> {
        match self.entry(username)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

fn service_name(base_url: &str) -> String {
    format!("{}:{}", SERVICE_PREFIX, base_url.trim_end_matches('/'))
}
