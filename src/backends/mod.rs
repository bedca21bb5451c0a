//! Key listing backends
//!
//! This module provides the backend abstraction consumed by the key list reader
//! and its HashiCorp Vault implementation.

mod secret_backend;
mod vault;

pub use secret_backend::{
    add_prefix_to_versioned_path, BackendMount, KeyListBackend, KeyListing, METADATA_SEGMENT,
};
pub use vault::VaultClient;

/// Type alias for backend trait object
pub type Backend = Box<dyn KeyListBackend>;

#[async_trait::async_trait]
impl<B: KeyListBackend + ?Sized> KeyListBackend for Box<B> {
    async fn resolve_mount(&self, path: &str) -> anyhow::Result<BackendMount> {
        (**self).resolve_mount(path).await
    }

    fn add_metadata_prefix(&self, path: &str, mount_path: &str) -> String {
        (**self).add_metadata_prefix(path, mount_path)
    }

    async fn list(&self, path: &str) -> anyhow::Result<Option<KeyListing>> {
        (**self).list(path).await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}
