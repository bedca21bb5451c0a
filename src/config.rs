use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub address: String,
    pub token: String,
    /// Enterprise namespace sent as `X-Vault-Namespace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Self = toml::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let address =
            std::env::var("VAULT_ADDR").context("VAULT_ADDR environment variable not set")?;
        let token =
            std::env::var("VAULT_TOKEN").context("VAULT_TOKEN environment variable not set")?;

        let config = Self::with_credentials(address, token);
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from explicit credentials; the optional settings
    /// still come from `VAULT_NAMESPACE` and `VAULT_CLIENT_TIMEOUT`
    pub fn with_credentials(address: String, token: String) -> Self {
        let vault = VaultConfig {
            address,
            token,
            namespace: std::env::var("VAULT_NAMESPACE")
                .ok()
                .filter(|ns| !ns.is_empty()),
            timeout_seconds: std::env::var("VAULT_CLIENT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_timeout_seconds),
        };

        Self { vault }
    }

    /// Check the values a client cannot work without
    pub fn validate(&self) -> Result<()> {
        let address = self.vault.address.trim();
        if address.is_empty() {
            anyhow::bail!("Vault address must not be empty");
        }
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            anyhow::bail!(
                "Vault address must start with http:// or https://, got {}",
                address
            );
        }
        if self.vault.token.trim().is_empty() {
            anyhow::bail!("Vault token must not be empty");
        }
        if self.vault.timeout_seconds == 0 {
            anyhow::bail!("Vault timeout_seconds must be greater than zero");
        }
        Ok(())
    }

    /// Create a sample configuration file
    pub fn create_sample<P: AsRef<Path>>(path: P) -> Result<()> {
        let sample = Self {
            vault: VaultConfig {
                address: "http://127.0.0.1:8200".to_string(),
                token: "your-vault-token-here".to_string(),
                namespace: None,
                timeout_seconds: default_timeout_seconds(),
            },
        };

        let toml_string =
            toml::to_string_pretty(&sample).context("Failed to serialize sample config")?;
        fs::write(path.as_ref(), toml_string)
            .with_context(|| format!("Failed to write sample config to {:?}", path.as_ref()))?;

        Ok(())
    }
}
