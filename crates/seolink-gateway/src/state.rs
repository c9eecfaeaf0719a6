use seolink_core::RedirectRepository;
use std::sync::Arc;

/// Whether records are partitioned by owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tenancy {
    /// One shared collection. Callers see and modify every record.
    Single,
    /// Callers identify themselves with the `x-owner-id` header and only
    /// see and modify their own records.
    Multi,
}

impl Tenancy {
    /// Whether records stored without an owner are visible to callers.
    pub fn sees_unowned_records(self) -> bool {
        matches!(self, Tenancy::Single)
    }
}

#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn RedirectRepository>,
    base_url: String,
    tenancy: Tenancy,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn RedirectRepository>,
        public_base_url: impl Into<String>,
        tenancy: Tenancy,
    ) -> Self {
        Self {
            repository,
            base_url: public_base_url.into(),
            tenancy,
        }
    }

    pub fn repository(&self) -> &dyn RedirectRepository {
        self.repository.as_ref()
    }

    /// Base URL of the public landing pages.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tenancy(&self) -> Tenancy {
        self.tenancy
    }
}
