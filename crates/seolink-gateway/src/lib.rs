//! HTTP admin API for redirect configurations.
//!
//! The router is built from an [`AppState`] holding any
//! [`seolink_core::RedirectRepository`], so the same handlers serve every
//! storage backend.

pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::{AppState, Tenancy};
