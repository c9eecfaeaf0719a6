use crate::redirect::{OwnerId, RedirectConfig};

/// Visibility scope of a repository call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Every record, regardless of owner. Used by single-tenant deployments
    /// and by whole-collection consumers such as the sitemap.
    All,
    /// Records owned by one user.
    Owner(OwnerId),
}

impl Scope {
    pub fn owner(&self) -> Option<&OwnerId> {
        match self {
            Scope::All => None,
            Scope::Owner(owner) => Some(owner),
        }
    }

    /// Whether `record` is visible within this scope.
    pub fn permits(&self, record: &RedirectConfig) -> bool {
        match self {
            Scope::All => true,
            Scope::Owner(owner) => record.owner_id.as_ref() == Some(owner),
        }
    }
}

impl From<OwnerId> for Scope {
    fn from(owner: OwnerId) -> Self {
        Scope::Owner(owner)
    }
}
