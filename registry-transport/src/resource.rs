//! Actions and the resources they are scoped to.
//!
//! Bearer tokens are issued for a scope string naming a resource and the
//! capabilities requested on it. The transport only needs two things from a
//! resource: the registry host it lives on, and that scope string.

use std::fmt;
use std::str::FromStr;

use crate::error::InvalidAction;

/// The capability a transport is constructed for.
///
/// The scope requested during a token exchange embeds these as the action
/// list on the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read access.
    Pull,
    /// Write access, which implies read access.
    Push,
    /// Deletion, issued under the registry's read/write ACL.
    Delete,
    /// Listing the registry catalog.
    Catalog,
}

impl Action {
    /// The action list embedded in a token scope.
    ///
    /// Registries use a single read/write ACL, so `Delete` requests the same
    /// permissions as `Push`.
    pub fn permissions(&self) -> &'static str {
        match self {
            Action::Pull => "pull",
            Action::Push | Action::Delete => "push,pull",
            Action::Catalog => "catalog",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Pull => f.write_str("pull"),
            Action::Push => f.write_str("push"),
            Action::Delete => f.write_str("delete"),
            Action::Catalog => f.write_str("catalog"),
        }
    }
}

impl FromStr for Action {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pull" => Ok(Action::Pull),
            "push" | "push,pull" => Ok(Action::Push),
            "delete" => Ok(Action::Delete),
            "catalog" => Ok(Action::Catalog),
            other => Err(InvalidAction(other.to_owned())),
        }
    }
}

/// A named registry resource a transport can be scoped to.
///
/// Implementations stay deliberately small: the transport never inspects the
/// resource beyond the registry host and the token scope.
pub trait Resource: fmt::Debug + Send + Sync {
    /// The registry host (and optional port) this resource lives on.
    fn registry(&self) -> &str;

    /// The scope string to request from the authorization realm.
    fn scope(&self, action: Action) -> String;
}

/// A repository within a registry, such as `library/ubuntu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    registry: String,
    repository: String,
}

impl Repository {
    /// Create a new repository reference.
    pub fn new<R, N>(registry: R, repository: N) -> Self
    where
        R: Into<String>,
        N: Into<String>,
    {
        Repository {
            registry: registry.into(),
            repository: repository.into(),
        }
    }

    /// The repository name within the registry.
    pub fn name(&self) -> &str {
        &self.repository
    }
}

impl Resource for Repository {
    fn registry(&self) -> &str {
        &self.registry
    }

    fn scope(&self, action: Action) -> String {
        format!("repository:{}:{}", self.repository, action.permissions())
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)
    }
}

/// A registry itself, used when listing its catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    registry: String,
}

impl Catalog {
    /// Create a new catalog reference for a registry host.
    pub fn new<R: Into<String>>(registry: R) -> Self {
        Catalog {
            registry: registry.into(),
        }
    }
}

impl Resource for Catalog {
    fn registry(&self) -> &str {
        &self.registry
    }

    fn scope(&self, _action: Action) -> String {
        "registry:catalog:*".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_through_strings() {
        for action in [Action::Pull, Action::Push, Action::Delete, Action::Catalog] {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_actions_are_rejected() {
        assert!("mirror".parse::<Action>().is_err());
        assert!("".parse::<Action>().is_err());

        let error: crate::Error = "mirror".parse::<Action>().unwrap_err().into();
        assert!(matches!(error, crate::Error::Action(_)));
    }

    #[test]
    fn delete_scope_matches_push_scope() {
        let repository = Repository::new("registry.example.com", "library/ubuntu");
        assert_eq!(
            repository.scope(Action::Delete),
            repository.scope(Action::Push)
        );
        assert_eq!(
            repository.scope(Action::Push),
            "repository:library/ubuntu:push,pull"
        );
    }

    #[test]
    fn repository_scope_names_the_repository() {
        let repository = Repository::new("localhost:5000", "my/app");
        assert_eq!(repository.scope(Action::Pull), "repository:my/app:pull");
    }

    #[test]
    fn catalog_scope_is_fixed() {
        let catalog = Catalog::new("registry.example.com");
        assert_eq!(catalog.scope(Action::Catalog), "registry:catalog:*");
    }
}
