//! Record store and artefact persistence.
//!
//! The database engine proper is an external collaborator; this crate is
//! the thin interface in front of it. Entities live in process memory
//! behind a single lock, so store writes are the synchronisation points
//! between pipeline tasks, and each mutation happens atomically from the
//! perspective of readers. The filesystem side covers the upload
//! directory layout and the per-operation cleaning log documents.

pub mod files;
pub mod store;

pub use files::{LogSink, StoredUpload, UploadVault};
pub use store::{CleanedEntry, DataStore, cleaned_table_name};
