//! Proof-of-payment storage on Apache OpenDAL.
//!
//! Receipts, cheque scans and transfer slips are written under
//! `proofs/{yyyy}/{mm}/{uuid}-{filename}`. The returned key is what
//! mutations, sales and expenses carry as `proofImage`. The server writes
//! to the local filesystem; the memory backend serves tests.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{StorageService, StoredProof};
