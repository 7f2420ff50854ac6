//! OpenDAL-backed proof store.

use chrono::{DateTime, Datelike, Utc};
use opendal::{ErrorKind, Operator, services};
use serde::Serialize;
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Metadata of a stored proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProof {
    /// Key to send back as `proofImage`.
    pub key: String,
    /// URL the file is served under.
    pub url: String,
    /// Bytes written.
    pub size: u64,
    /// Content type as uploaded.
    pub content_type: String,
}

/// Writes proof-of-payment files to the configured backend.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Builds the backend operator for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the backend rejects its settings.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = match &config.provider {
            StorageProvider::LocalFs { root } => {
                let Some(root) = root.to_str() else {
                    return Err(StorageError::Backend(format!(
                        "storage root {} is not valid UTF-8",
                        root.display()
                    )));
                };
                Operator::new(services::Fs::default().root(root))?.finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())?.finish(),
        };
        Ok(Self { operator, config })
    }

    /// Checks size and content type before anything is written.
    ///
    /// # Errors
    ///
    /// Returns the first limit the upload breaks.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        let max = self.config.max_file_size;
        match size {
            0 => Err(StorageError::EmptyFile),
            size if size > max => Err(StorageError::FileTooLarge { size, max }),
            _ if !self.config.accepts(content_type) => Err(StorageError::UnsupportedType {
                content_type: content_type.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Key for a proof uploaded at `now`: `proofs/{yyyy}/{mm}/{uuid}-{name}`.
    #[must_use]
    pub fn proof_key(filename: &str, now: DateTime<Utc>) -> String {
        format!(
            "proofs/{:04}/{:02}/{}-{}",
            now.year(),
            now.month(),
            Uuid::new_v4(),
            safe_file_name(filename)
        )
    }

    /// URL a stored key is served under.
    #[must_use]
    pub fn url_for(&self, key: &str) -> String {
        let base = self.config.public_base_url.trim_end_matches('/');
        format!("{base}/{key}")
    }

    /// Validates and writes one proof.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or [`StorageError::Backend`] if the write fails.
    pub async fn upload_proof(
        &self,
        filename: &str,
        content_type: &str,
        content: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<StoredProof, StorageError> {
        let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
        self.validate_upload(content_type, size)?;

        let key = Self::proof_key(filename, now);
        self.operator
            .write_with(&key, content)
            .content_type(content_type)
            .await?;

        Ok(StoredProof {
            url: self.url_for(&key),
            key,
            size,
            content_type: content_type.to_string(),
        })
    }

    /// Whether a key has been written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the backend cannot answer.
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Backend name for logs.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Active limits.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Last path segment of an uploaded name, reduced to `[A-Za-z0-9._-]`.
fn safe_file_name(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn memory_store(max: u64) -> StorageService {
        StorageService::from_config(
            StorageConfig::new(StorageProvider::Memory).with_max_file_size(max),
        )
        .expect("memory backend always builds")
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("receipt.png"), "receipt.png");
        assert_eq!(safe_file_name("bank slip (1).pdf"), "bank_slip__1_.pdf");
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("C:\\scans\\chq.jpg"), "chq.jpg");
        assert_eq!(safe_file_name(".."), "upload");
        assert_eq!(safe_file_name("dir/"), "upload");
    }

    #[test]
    fn test_proof_key_layout() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let key = StorageService::proof_key("slip.png", now);
        assert!(key.starts_with("proofs/2025/03/"));
        assert!(key.ends_with("-slip.png"));
        assert_eq!(key.split('/').count(), 4);
    }

    #[test]
    fn test_validate_upload_order() {
        let store = memory_store(1024);
        assert!(store.validate_upload("image/png", 512).is_ok());
        assert!(matches!(
            store.validate_upload("text/html", 0),
            Err(StorageError::EmptyFile)
        ));
        assert!(matches!(
            store.validate_upload("text/html", 2048),
            Err(StorageError::FileTooLarge { size: 2048, max: 1024 })
        ));
        assert!(matches!(
            store.validate_upload("text/html", 10),
            Err(StorageError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let store = StorageService::from_config(
            StorageConfig::new(StorageProvider::Memory).with_public_base_url("https://cdn.test/p/"),
        )
        .unwrap();
        assert_eq!(store.url_for("proofs/a.png"), "https://cdn.test/p/proofs/a.png");
    }

    #[tokio::test]
    async fn test_upload_to_memory() {
        let store = memory_store(1024);
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();

        let stored = store
            .upload_proof("cheque.png", "image/png", vec![1, 2, 3, 4], now)
            .await
            .expect("upload should succeed");

        assert_eq!(stored.size, 4);
        assert_eq!(stored.url, format!("/files/{}", stored.key));
        assert!(store.exists(&stored.key).await.unwrap());
        assert!(!store.exists("proofs/2025/06/missing.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_fs_write_lands_under_root() {
        let root = std::env::temp_dir().join(format!("khata-proofs-{}", Uuid::new_v4()));
        let store = StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(&root)))
            .unwrap();

        let stored = store
            .upload_proof("slip.pdf", "application/pdf", b"%PDF".to_vec(), Utc::now())
            .await
            .unwrap();

        assert_eq!(std::fs::read(root.join(&stored.key)).unwrap(), b"%PDF");
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let root = std::env::temp_dir().join(format!("khata-proofs-{}", Uuid::new_v4()));
        let store = StorageService::from_config(
            StorageConfig::new(StorageProvider::local_fs(&root)).with_max_file_size(2),
        )
        .unwrap();

        let err = store
            .upload_proof("big.png", "image/png", vec![0; 3], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { size: 3, max: 2 }));
        assert!(!root.join("proofs").exists());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_content_type_gate_matches_config(content_type in "[a-z]+/[a-z0-9-]+") {
            let config = StorageConfig::new(StorageProvider::Memory);
            let store = StorageService::from_config(config.clone()).unwrap();

            let result = store.validate_upload(&content_type, 1024);
            if config.accepts(&content_type) {
                prop_assert!(result.is_ok());
            } else {
                let rejected = matches!(result, Err(StorageError::UnsupportedType { .. }));
                prop_assert!(rejected, "expected UnsupportedType for {}", content_type);
            }
        }

        #[test]
        fn prop_safe_file_name_charset(filename in ".*") {
            let cleaned = safe_file_name(&filename);
            prop_assert!(!cleaned.is_empty());
            prop_assert!(!cleaned.contains('/'));
            prop_assert!(cleaned
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')));
        }
    }
}
