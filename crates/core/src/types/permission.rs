//! Permission model.
//!
//! Permissions form a closed set. Anything stored or received that is not
//! one of the variants below is rejected at the boundary rather than being
//! carried around as a loose string.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named capability gating specific operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    /// Granted to every account on signup.
    User,
    /// Full access, satisfies every permission-gated operation that lists it.
    Admin,
    /// May create items.
    ItemCreate,
    /// May update items owned by others.
    ItemUpdate,
    /// May delete items owned by others.
    ItemDelete,
    /// May change the permissions of other accounts.
    PermissionUpdate,
    /// May revoke permissions from other accounts.
    PermissionDelete,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::User,
        Self::Admin,
        Self::ItemCreate,
        Self::ItemUpdate,
        Self::ItemDelete,
        Self::PermissionUpdate,
        Self::PermissionDelete,
    ];

    /// The canonical wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::ItemCreate => "ITEMCREATE",
            Self::ItemUpdate => "ITEMUPDATE",
            Self::ItemDelete => "ITEMDELETE",
            Self::PermissionUpdate => "PERMISSIONUPDATE",
            Self::PermissionDelete => "PERMISSIONDELETE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known [`Permission`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl std::str::FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_owned()))
    }
}

/// The set of permissions held by an account.
///
/// Ordered so that serialized output is stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// The permissions every new account starts with: exactly `{USER}`.
    #[must_use]
    pub fn signup_default() -> Self {
        Self(BTreeSet::from([Permission::User]))
    }

    /// Whether the set holds `permission`.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// Whether the set shares at least one permission with `allowed`.
    #[must_use]
    pub fn intersects(&self, allowed: &[Permission]) -> bool {
        allowed.iter().any(|p| self.0.contains(p))
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of permissions held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// Canonical names, for storage.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|p| p.as_str().to_owned()).collect()
    }

    /// Parse stored names, rejecting the first unknown value.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownPermission`] if any name is not a known permission.
    pub fn from_strings<I, S>(names: I) -> Result<Self, UnknownPermission>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
