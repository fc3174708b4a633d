use std::{path::PathBuf, sync::Arc};

use getset::Getters;

use crate::{accounts::AccountLookup, config::SiteConfiguration};

/// Process-wide, read-only context shared by every controller.
#[derive(Getters)]
#[getset(get = "pub")]
pub struct Site {
    site_name: String,
    protocol: String,
    views_directory: PathBuf,
    password_hash_cost: u32,
    disallowed_usernames: Vec<String>,
    accounts: Arc<dyn AccountLookup>,
}

impl Site {
    pub fn new(site_configuration: &SiteConfiguration, accounts: Arc<dyn AccountLookup>) -> Self {
        Self {
            site_name: site_configuration.site_name().clone(),
            protocol: site_configuration.protocol().clone(),
            views_directory: PathBuf::from(site_configuration.views_directory()),
            password_hash_cost: *site_configuration.password_hash_cost(),
            disallowed_usernames: site_configuration.disallowed_usernames().clone(),
            accounts,
        }
    }
}
