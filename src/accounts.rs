use std::collections::HashSet;

use async_trait::async_trait;

use tokio::sync::RwLock;

use crate::config::SiteConfiguration;

/// Account store as seen by the username validator.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn is_username_taken(&self, username: &str) -> anyhow::Result<bool>;
}

/// Process-local account registry. Usernames compare case-insensitively.
#[derive(Default)]
pub struct InMemoryAccounts {
    usernames: RwLock<HashSet<String>>,
}

impl InMemoryAccounts {
    pub fn with_usernames<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            usernames: RwLock::new(
                usernames
                    .into_iter()
                    .map(|username| username.as_ref().to_lowercase())
                    .collect(),
            ),
        }
    }

    /// Seeds the registry with the configured `registered_usernames`.
    pub fn from_configuration(site_configuration: &SiteConfiguration) -> Self {
        Self::with_usernames(site_configuration.registered_usernames())
    }

    /// Returns false if the username was already registered.
    pub async fn register(&self, username: &str) -> bool {
        self.usernames.write().await.insert(username.to_lowercase())
    }
}

#[async_trait]
impl AccountLookup for InMemoryAccounts {
    async fn is_username_taken(&self, username: &str) -> anyhow::Result<bool> {
        Ok(self
            .usernames
            .read()
            .await
            .contains(&username.to_lowercase()))
    }
}
