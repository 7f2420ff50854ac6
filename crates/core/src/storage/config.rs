//! Proof storage settings.

use std::path::PathBuf;

use khata_shared::config::StorageSettings;

/// Backend the proofs are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// Directory on the local filesystem.
    LocalFs {
        /// Root directory; keys are resolved below it.
        root: PathBuf,
    },
    /// Process memory, lost on restart.
    Memory,
}

impl StorageProvider {
    /// Local filesystem backend rooted at `root`.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "fs",
            Self::Memory => "memory",
        }
    }
}

/// Upload limits and addressing for proof files.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend.
    pub provider: StorageProvider,
    /// Largest accepted file, in bytes.
    pub max_file_size: u64,
    /// Accepted content types, compared case-insensitively.
    pub allowed_mime_types: Vec<String>,
    /// Prefix of the URL returned for a stored key.
    pub public_base_url: String,
}

impl StorageConfig {
    /// 5 MiB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

    /// Receipts, cheque scans and transfer slips.
    pub const DEFAULT_MIME_TYPES: [&'static str; 4] =
        ["image/jpeg", "image/png", "image/webp", "application/pdf"];

    /// Default limits on the given backend.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Self::DEFAULT_MIME_TYPES.map(String::from).to_vec(),
            public_base_url: "/files".to_string(),
        }
    }

    /// Local filesystem storage built from the `storage` config section.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(StorageProvider::local_fs(&settings.root))
            .with_max_file_size(settings.max_file_size)
            .with_allowed_mime_types(settings.allowed_mime_types.clone())
            .with_public_base_url(settings.public_base_url.clone())
    }

    /// Overrides the size limit.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Overrides the accepted content types.
    #[must_use]
    pub fn with_allowed_mime_types(mut self, types: Vec<String>) -> Self {
        self.allowed_mime_types = types;
        self
    }

    /// Overrides the URL prefix.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Whether a content type may be stored.
    ///
    /// Parameters such as `; charset=binary` are ignored.
    #[must_use]
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/png", true)]
    #[case("IMAGE/JPEG", true)]
    #[case("application/pdf", true)]
    #[case("image/webp; charset=binary", true)]
    #[case("text/html", false)]
    #[case("image/gif", false)]
    #[case("", false)]
    fn test_accepted_content_types(#[case] content_type: &str, #[case] accepted: bool) {
        let config = StorageConfig::new(StorageProvider::Memory);
        assert_eq!(config.accepts(content_type), accepted);
    }

    #[test]
    fn test_from_settings_uses_local_root() {
        let settings = StorageSettings {
            root: "/var/lib/khata/proofs".into(),
            max_file_size: 1024,
            allowed_mime_types: vec!["image/png".into()],
            public_base_url: "https://cdn.example.com/p/".into(),
        };
        let config = StorageConfig::from_settings(&settings);
        assert_eq!(config.provider, StorageProvider::local_fs("/var/lib/khata/proofs"));
        assert_eq!(config.provider.name(), "fs");
        assert_eq!(config.max_file_size, 1024);
        assert!(!config.accepts("image/jpeg"));
    }
}
