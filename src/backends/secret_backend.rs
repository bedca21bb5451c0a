use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path segment under which versioned (KV v2) engines expose listings
pub const METADATA_SEGMENT: &str = "metadata";

/// Mount information resolved for a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendMount {
    pub mount_path: String,
    pub is_versioned: bool,
}

impl BackendMount {
    pub fn unversioned(mount_path: impl Into<String>) -> Self {
        Self {
            mount_path: mount_path.into(),
            is_versioned: false,
        }
    }

    pub fn versioned(mount_path: impl Into<String>) -> Self {
        Self {
            mount_path: mount_path.into(),
            is_versioned: true,
        }
    }
}

/// Raw listing payload returned by a backend, keyed by entry name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyListing {
    pub entries: Map<String, Value>,
}

impl KeyListing {
    pub fn new(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Map<String, Value>> for KeyListing {
    fn from(entries: Map<String, Value>) -> Self {
        Self::new(entries)
    }
}

/// Trait for backends that can enumerate secret keys under a path
#[async_trait::async_trait]
pub trait KeyListBackend: Send + Sync {
    /// Resolve the mount a path belongs to and whether it is versioned
    async fn resolve_mount(&self, path: &str) -> Result<BackendMount>;

    /// Rewrite a path so it targets the metadata namespace of a versioned mount
    fn add_metadata_prefix(&self, path: &str, mount_path: &str) -> String {
        add_prefix_to_versioned_path(path, mount_path, METADATA_SEGMENT)
    }

    /// List entries under a path.
    ///
    /// `Ok(None)` means the call succeeded but nothing exists at the path,
    /// which is distinct from an empty listing.
    async fn list(&self, path: &str) -> Result<Option<KeyListing>>;

    /// Get the backend type name for display purposes
    fn backend_type(&self) -> &'static str;
}

/// Insert `api_prefix` right after the mount portion of `path`.
///
/// Paths already carrying the prefix are left alone, and a path equal to the
/// mount itself maps to `<mount>/<api_prefix>`.
pub fn add_prefix_to_versioned_path(path: &str, mount_path: &str, api_prefix: &str) -> String {
    let mount = mount_path.trim_matches('/');
    let path = path.trim_matches('/');

    if path == mount {
        return join_segments(&[mount, api_prefix]);
    }

    let remainder = match path.strip_prefix(mount) {
        Some(rest) if mount.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => path,
    };

    let already_prefixed = remainder == api_prefix
        || remainder
            .strip_prefix(api_prefix)
            .is_some_and(|rest| rest.starts_with('/'));

    if already_prefixed {
        join_segments(&[mount, remainder])
    } else {
        join_segments(&[mount, api_prefix, remainder])
    }
}

/// Join path parts with single slashes, dropping empty segments
pub(crate) fn join_segments(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
