//! Redirect repository implementation.
//!
//! [`RedirectManager`] implements [`seolink_core::RedirectRepository`] over
//! any [`seolink_core::RedirectStore`], adding validation, id assignment,
//! timestamps, ownership checks and the read/write failure policy.

pub mod generator;
pub mod manager;

pub use generator::random::RandomIdGenerator;
pub use generator::seq::SequentialIdGenerator;
pub use generator::IdGenerator;
pub use manager::RedirectManager;
