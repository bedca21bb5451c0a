//! Key list reader
//!
//! Resolves the listing path for a logical secret location, asks the backend
//! for the entries there and projects them into key names plus a JSON blob.

use serde::Serialize;
use tracing::{debug, warn};

use crate::backends::{KeyListBackend, KeyListing};
use crate::error::{KeyListError, Result};

/// Path whose keys should be listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    path: String,
}

impl ListingRequest {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(KeyListError::invalid_input("path must not be empty"));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Outcome of a successful listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadResult {
    /// Resolved listing path, stable identifier for this read
    pub identity: String,
    /// Key names in the listing's iteration order
    pub key_names: Vec<String>,
    /// JSON encoding of the full listing payload
    pub key_list_json: String,
}

impl ReadResult {
    /// Key names in lexical order, for callers that need stable output
    pub fn sorted_key_names(&self) -> Vec<String> {
        let mut names = self.key_names.clone();
        names.sort();
        names
    }
}

/// Reads key listings through an injected backend
pub struct KeyListReader<B> {
    backend: B,
}

impl<B: KeyListBackend> KeyListReader<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// List the keys stored under `request`'s path.
    ///
    /// Versioned mounts are listed through their metadata namespace, so the
    /// returned identity may differ from the requested path.
    pub async fn read(&self, request: &ListingRequest) -> Result<ReadResult> {
        let mut path = request.path().to_string();

        let mount = self
            .backend
            .resolve_mount(&path)
            .await
            .map_err(|e| KeyListError::backend("version detection failed", &e))?;

        if mount.is_versioned {
            path = self.backend.add_metadata_prefix(&path, &mount.mount_path);
        }

        let listing = self
            .backend
            .list(&path)
            .await
            .map_err(|e| {
                let context = format!("error reading from {}", self.backend.backend_type());
                KeyListError::backend(context, &e)
            })?
            .ok_or_else(|| KeyListError::not_found(path.as_str()))?;

        let key_list_json = encode_listing(&listing, &path);
        let key_names: Vec<String> = listing.keys().cloned().collect();
        debug!("Keys at {}: {:?}", path, key_names);

        Ok(ReadResult {
            identity: path,
            key_names,
            key_list_json,
        })
    }
}

/// The payload was decoded from JSON, so re-encoding is not expected to fail;
/// if it does, the read still succeeds with an empty string.
fn encode_listing(listing: &KeyListing, path: &str) -> String {
    match serde_json::to_string(listing) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to encode key listing at {}: {}", path, e);
            String::new()
        }
    }
}
