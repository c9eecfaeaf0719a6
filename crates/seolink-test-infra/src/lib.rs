//! Disposable fakes of the remote storage services, for integration tests.
//!
//! Each fake is a [`wiremock::MockServer`] with stateful responders that
//! keep just enough of the real service's behavior for the adapters to be
//! exercised end to end over HTTP.

mod firestore;
mod jsonbin;

pub use firestore::{FirestoreServer, FirestoreServerConfig};
pub use jsonbin::JsonBinServer;
