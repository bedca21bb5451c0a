//! Vault Key List Library
//!
//! Lists the secret keys stored at a path in HashiCorp Vault, transparently
//! targeting the metadata namespace of KV v2 mounts.

pub mod backends;
pub mod config;
pub mod error;
pub mod key_list;

pub use backends::{Backend, KeyListBackend, VaultClient};
pub use config::Config;
pub use error::KeyListError;
pub use key_list::{KeyListReader, ListingRequest, ReadResult};
