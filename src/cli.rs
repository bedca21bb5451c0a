//! CLI parsing and command execution
//!
//! This module handles command-line argument parsing and routes commands to the appropriate handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use vault_key_list::{Config, KeyListReader, ListingRequest, ReadResult, VaultClient};

#[derive(Parser)]
#[command(name = "vkl")]
#[command(about = "List secret keys stored at a HashiCorp Vault path", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "VKL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Vault address (overrides config file)
    #[arg(long, env = "VAULT_ADDR")]
    pub vault_addr: Option<String>,

    /// Vault token (overrides config file)
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub vault_token: Option<String>,

    /// Vault enterprise namespace (overrides config file)
    #[arg(long, env = "VAULT_NAMESPACE")]
    pub vault_namespace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a sample configuration file
    Init {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "vkl-config.toml")]
        output: PathBuf,
    },

    /// List the keys stored at a path
    List {
        /// Full path from which the key list is read
        path: String,

        /// Print the JSON-encoded listing instead of key names
        #[arg(long, conflicts_with = "full")]
        json: bool,

        /// Print the whole read result (identity, key names, JSON) as JSON
        #[arg(long)]
        full: bool,

        /// Sort key names before printing
        #[arg(long, conflicts_with = "json")]
        sort: bool,
    },
}

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    // Handle init command separately as it doesn't need a Vault connection
    if let Commands::Init { ref output } = cli.command {
        Config::create_sample(output)
            .with_context(|| format!("Failed to create sample config at {:?}", output))?;
        info!("Sample configuration created at {:?}", output);
        return Ok(());
    }

    let config = load_config(&cli)?;
    let client = VaultClient::from_config(&config.vault).context("Failed to create Vault client")?;
    let reader = KeyListReader::new(client);

    match cli.command {
        Commands::Init { .. } => unreachable!(), // Handled above

        Commands::List {
            path,
            json,
            full,
            sort,
        } => {
            let request = ListingRequest::new(path)?;
            let result = reader
                .read(&request)
                .await
                .context("Failed to list keys")?;

            if json {
                println!("{}", result.key_list_json);
            } else if full {
                let result = if sort { sorted(result) } else { result };
                let rendered = serde_json::to_string_pretty(&result)
                    .context("Failed to serialize read result")?;
                println!("{}", rendered);
            } else {
                print!("{}", render_key_names(&result, sort));
            }
        }
    }

    Ok(())
}

/// Build configuration from the config file or environment, then apply flag overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else if let (Some(address), Some(token)) = (&cli.vault_addr, &cli.vault_token) {
        // Both may come from flags or from the clap env fallbacks
        Config::with_credentials(address.clone(), token.clone())
    } else {
        Config::from_env().context("Failed to load config from environment")?
    };

    if let Some(ref addr) = cli.vault_addr {
        config.vault.address = addr.clone();
    }
    if let Some(ref token) = cli.vault_token {
        config.vault.token = token.clone();
    }
    if let Some(ref namespace) = cli.vault_namespace {
        config.vault.namespace = Some(namespace.clone()).filter(|ns| !ns.is_empty());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn sorted(result: ReadResult) -> ReadResult {
    ReadResult {
        key_names: result.sorted_key_names(),
        ..result
    }
}

fn render_key_names(result: &ReadResult, sort: bool) -> String {
    let names = if sort {
        result.sorted_key_names()
    } else {
        result.key_names.clone()
    };

    if names.is_empty() {
        return format!("No keys at {}\n", result.identity);
    }

    let mut out = format!("Keys at {}:\n", result.identity);
    for name in names {
        out.push_str(&format!("  - {}\n", name));
    }
    out
}
