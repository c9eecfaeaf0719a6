//! Storage adapters for redirect configurations.
//!
//! Every adapter implements [`RedirectStore`]:
//!
//! - [`InMemoryStore`] keeps records in process memory (local mode).
//! - [`BlobStore`] keeps the whole collection as one JSON document behind a
//!   [`BlobBackend`], either [`JsonBinClient`] or [`MemoryBlob`].
//! - [`FirestoreStore`] keeps one Firestore document per record.

pub mod blob;
pub mod firestore;
mod http;
pub mod jsonbin;
pub mod memory;

pub use blob::{BlobBackend, BlobDocument, BlobStore, MemoryBlob};
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use jsonbin::{JsonBinClient, JsonBinConfig};
pub use memory::InMemoryStore;
pub use seolink_core::error::{StorageError, StorageResult};
pub use seolink_core::store::{ListOrder, ListQuery, RedirectStore};
