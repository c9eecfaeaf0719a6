use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "SEOLINK_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "SEOLINK_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SEOLINK_STORAGE_BACKEND";
pub const SEED_SAMPLES_ENV: &str = "SEOLINK_SEED_SAMPLES";
pub const JSONBIN_API_KEY_ENV: &str = "JSONBIN_API_KEY";
pub const JSONBIN_BIN_ID_ENV: &str = "JSONBIN_BIN_ID";
pub const JSONBIN_API_BASE_ENV: &str = "JSONBIN_API_BASE";
pub const FIRESTORE_PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
pub const FIRESTORE_API_KEY_ENV: &str = "FIREBASE_API_KEY";
pub const FIRESTORE_BEARER_TOKEN_ENV: &str = "FIREBASE_ID_TOKEN";
pub const FIRESTORE_API_BASE_ENV: &str = "FIRESTORE_API_BASE";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    /// Pick from the credentials that are present.
    #[value(name = "auto")]
    Auto,
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "jsonbin")]
    JsonBin,
    #[value(name = "firestore")]
    Firestore,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Auto => write!(f, "auto"),
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::JsonBin => write!(f, "jsonbin"),
            StorageBackendArg::Firestore => write!(f, "firestore"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "seolink")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Base URL the public landing pages are served from.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Auto
    )]
    pub storage: StorageBackendArg,

    /// Write the bundled sample redirects into storage on startup.
    #[arg(long, env = SEED_SAMPLES_ENV)]
    pub seed_samples: bool,

    #[arg(long, env = JSONBIN_API_KEY_ENV, hide_env_values = true)]
    pub jsonbin_api_key: Option<String>,

    #[arg(long, env = JSONBIN_BIN_ID_ENV)]
    pub jsonbin_bin_id: Option<String>,

    #[arg(long, env = JSONBIN_API_BASE_ENV, default_value = seolink_storage::jsonbin::DEFAULT_API_BASE)]
    pub jsonbin_api_base: String,

    #[arg(long, env = FIRESTORE_PROJECT_ID_ENV)]
    pub firestore_project_id: Option<String>,

    #[arg(long, env = FIRESTORE_API_KEY_ENV, hide_env_values = true)]
    pub firestore_api_key: Option<String>,

    #[arg(long, env = FIRESTORE_BEARER_TOKEN_ENV, hide_env_values = true)]
    pub firestore_bearer_token: Option<String>,

    #[arg(long, env = FIRESTORE_API_BASE_ENV, default_value = seolink_storage::firestore::DEFAULT_API_BASE)]
    pub firestore_api_base: String,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl CLI {
    /// Resolves `auto` to a concrete backend: Firestore if its project id
    /// and API key are set, else JSONBin if its key and bin id are set,
    /// else in-memory.
    pub fn storage_backend(&self) -> StorageBackendArg {
        match self.storage {
            StorageBackendArg::Auto => {
                if present(&self.firestore_project_id) && present(&self.firestore_api_key) {
                    StorageBackendArg::Firestore
                } else if present(&self.jsonbin_api_key) && present(&self.jsonbin_bin_id) {
                    StorageBackendArg::JsonBin
                } else {
                    StorageBackendArg::InMemory
                }
            }
            explicit => explicit,
        }
    }
}
