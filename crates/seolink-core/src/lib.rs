//! Core types and traits for the SEO redirect manager.
//!
//! This crate provides the domain model shared by the storage adapters,
//! the repository implementation and the HTTP gateway.

pub mod clock;
pub mod error;
pub mod public_url;
pub mod redirect;
pub mod repository;
pub mod samples;
pub mod scope;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RedirectError, StorageError};
pub use public_url::build_public_url;
pub use redirect::{NewRedirect, OwnerId, PageType, RedirectConfig, RedirectId, RedirectPatch};
pub use repository::{RedirectListing, RedirectRepository, StorageStatus};
pub use samples::samples;
pub use scope::Scope;
pub use store::{sort_newest_first, ListOrder, ListQuery, RedirectStore};
