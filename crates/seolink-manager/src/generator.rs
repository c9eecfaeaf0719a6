pub mod random;
pub mod seq;

use seolink_core::RedirectId;

/// Produces ids for new redirect configurations.
///
/// Implementations don't touch storage, so they are responsible for making
/// collisions unlikely enough on their own.
pub trait IdGenerator: Send + Sync + 'static {
    fn generate(&self) -> RedirectId;
}
