//! Component lifetimes.
//!
//! Lifetimes determine how long a resolved instance is reused:
//! - [`Lifetime::Singleton`]: one instance for the container's whole chain
//! - [`Lifetime::Scoped`]: one instance per lifetime scope
//! - [`Lifetime::Transient`]: new instance every time
//!
//! # Ordering
//! `Singleton > Scoped > Transient`: a Singleton outlives a Scoped,
//! which outlives a Transient.
use std::fmt;

use serde::Serialize;

/// Defines the reuse policy of a component's instances.
///
/// # Examples
/// ```
/// use tarkib_container::lifetime::Lifetime;
///
/// assert!(Lifetime::Singleton > Lifetime::Scoped);
/// assert!(Lifetime::Scoped > Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Lifetime {
    /// Constructed on every resolve; never cached, never tracked for disposal.
    #[default]
    Transient,

    /// One instance per lifetime scope.
    ///
    /// Resolved from a root container it behaves like a lazily created
    /// singleton of that root.
    Scoped,

    /// One instance for the container that owns it.
    ///
    /// Lifetime scopes never build their own copy: they forward to the
    /// parent's cached instance.
    Singleton,
}

impl Lifetime {
    /// Returns `true` if this lifetime caches instances.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }

    /// Returns the ordering value (higher = longer lifetime).
    #[inline]
    fn ordering(&self) -> u8 {
        match self {
            Lifetime::Singleton => 2,
            Lifetime::Scoped => 1,
            Lifetime::Transient => 0,
        }
    }
}

impl PartialOrd for Lifetime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lifetime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordering().cmp(&other.ordering())
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Scoped => write!(f, "Scoped"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_ordering() {
        assert!(Lifetime::Singleton > Lifetime::Scoped);
        assert!(Lifetime::Scoped > Lifetime::Transient);
        assert!(Lifetime::Singleton > Lifetime::Transient);
    }

    #[test]
    fn lifetime_is_cached() {
        assert!(Lifetime::Singleton.is_cached());
        assert!(Lifetime::Scoped.is_cached());
        assert!(!Lifetime::Transient.is_cached());
    }

    #[test]
    fn default_is_transient() {
        assert_eq!(Lifetime::default(), Lifetime::Transient);
    }

    #[test]
    fn lifetime_display() {
        assert_eq!(format!("{}", Lifetime::Singleton), "Singleton");
        assert_eq!(format!("{}", Lifetime::Scoped), "Scoped");
        assert_eq!(format!("{}", Lifetime::Transient), "Transient");
    }
}
