use anyhow::Context;

use getset::Getters;

use log::info;

use serde::{Deserialize, Serialize};

use tokio::{fs::File, io::AsyncReadExt};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum ServerType {
    TCP,
    UNIX,
}

#[derive(Debug, Clone, Deserialize, Serialize, Getters)]
#[getset(get = "pub")]
pub struct FastCGIConnectionConfiguration {
    max_concurrent_connections: u8,
    max_requests_per_connection: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize, Getters)]
#[getset(get = "pub")]
pub struct ServerConfiguration {
    server_type: ServerType,
    bind_address: String,
    fastcgi_connection_configuration: FastCGIConnectionConfiguration,
}

fn default_password_hash_cost() -> u32 {
    12
}

#[derive(Debug, Clone, Deserialize, Serialize, Getters)]
#[getset(get = "pub")]
pub struct SiteConfiguration {
    site_name: String,
    protocol: String,
    views_directory: String,
    #[serde(default = "default_password_hash_cost")]
    password_hash_cost: u32,
    #[serde(default)]
    disallowed_usernames: Vec<String>,
    #[serde(default)]
    registered_usernames: Vec<String>,
}

impl SiteConfiguration {
    pub fn new(
        site_name: impl Into<String>,
        protocol: impl Into<String>,
        views_directory: impl Into<String>,
        password_hash_cost: u32,
        disallowed_usernames: Vec<String>,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            protocol: protocol.into(),
            views_directory: views_directory.into(),
            password_hash_cost,
            disallowed_usernames,
            registered_usernames: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Getters)]
#[getset(get = "pub")]
pub struct Configuration {
    server_configuration: ServerConfiguration,
    site_configuration: SiteConfiguration,
}

pub async fn read_configuration(config_file: String) -> anyhow::Result<Configuration> {
    info!("reading {}", config_file);

    let mut file = File::open(&config_file)
        .await
        .with_context(|| format!("error opening config file '{}'", config_file))?;

    let mut file_contents = Vec::new();

    file.read_to_end(&mut file_contents)
        .await
        .with_context(|| format!("error reading config file '{}'", config_file))?;

    let configuration: Configuration = ::serde_json::from_slice(&file_contents)
        .with_context(|| format!("error unmarshalling config file '{}'", config_file))?;

    info!("configuration\n{:#?}", configuration);

    Ok(configuration)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CONFIG_JSON: &str = r#"{
        "server_configuration": {
            "server_type": "UNIX",
            "bind_address": "/tmp/scripting-thoughts.sock",
            "fastcgi_connection_configuration": {
                "max_concurrent_connections": 10,
                "max_requests_per_connection": 10
            }
        },
        "site_configuration": {
            "site_name": "Scripting Thoughts",
            "protocol": "https://",
            "views_directory": "./views",
            "disallowed_usernames": ["admin", "root"],
            "registered_usernames": ["scripter"]
        }
    }"#;

    #[tokio::test]
    async fn reads_configuration_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG_JSON.as_bytes()).unwrap();

        let configuration = read_configuration(file.path().display().to_string())
            .await
            .unwrap();

        let server_configuration = configuration.server_configuration();
        assert_eq!(*server_configuration.server_type(), ServerType::UNIX);
        assert_eq!(
            server_configuration.bind_address(),
            "/tmp/scripting-thoughts.sock"
        );
        assert_eq!(
            *server_configuration
                .fastcgi_connection_configuration()
                .max_requests_per_connection(),
            10
        );

        let site_configuration = configuration.site_configuration();
        assert_eq!(site_configuration.site_name(), "Scripting Thoughts");
        assert_eq!(*site_configuration.password_hash_cost(), 12);
        assert_eq!(
            site_configuration.disallowed_usernames(),
            &vec!["admin".to_string(), "root".to_string()]
        );
        assert_eq!(
            site_configuration.registered_usernames(),
            &vec!["scripter".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_configuration_file_is_an_error() {
        let result = read_configuration("/nonexistent/config.json".to_string()).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("error opening config file"));
    }
}
