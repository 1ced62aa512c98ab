//! Dependency identification keys.
//!
//! [`DependencyKey`] identifies what a consumer asks for: either one
//! instance of a type (`of::<T>()`) or every implementation of it
//! gathered as a collection (`many::<T>()`).

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// Whether a key asks for one instance or for a collection of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyShape {
    /// A single instance, resolved through a single or conditional binding.
    Single,
    /// "Many of X", resolved through an aggregate binding.
    Many,
}

/// Uniquely identifies a dependency in the container.
///
/// # Examples
/// ```
/// use tarkib_container::key::DependencyKey;
///
/// trait Plugin {}
///
/// let one = DependencyKey::of::<dyn Plugin>();
/// let all = DependencyKey::many::<dyn Plugin>();
/// assert_ne!(one, all);
/// assert_eq!(all.element(), one);
/// ```
#[derive(Clone, Copy)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
    shape: KeyShape,
}

impl DependencyKey {
    /// Creates a key for a single `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            shape: KeyShape::Single,
        }
    }

    /// Creates a key for the collection of every `T` implementation.
    #[inline]
    pub fn many<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            shape: KeyShape::Many,
        }
    }

    /// Creates a key from a raw [`TypeId`] and type name.
    ///
    /// Prefer [`DependencyKey::of`] when possible.
    #[inline]
    pub fn from_raw(type_id: TypeId, type_name: &'static str, shape: KeyShape) -> Self {
        Self { type_id, type_name, shape }
    }

    /// Returns the [`TypeId`] of the element type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the human-readable element type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn shape(&self) -> KeyShape {
        self.shape
    }

    #[inline]
    pub fn is_many(&self) -> bool {
        self.shape == KeyShape::Many
    }

    /// Unwraps one level of "collection of X" to X.
    #[inline]
    pub fn element(&self) -> Self {
        Self { shape: KeyShape::Single, ..*self }
    }

    /// Wraps this key's element type as a collection key.
    #[inline]
    pub fn as_many(&self) -> Self {
        Self { shape: KeyShape::Many, ..*self }
    }

    /// Short display name with module paths stripped.
    pub fn short_name(&self) -> String {
        let short = tarkib_support::rendering::shorten_type_name(self.type_name);
        match self.shape {
            KeyShape::Single => short,
            KeyShape::Many => format!("[{short}]"),
        }
    }
}

// identity is TypeId + shape; the name is only for humans
impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.shape == other.shape
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.shape.hash(state);
    }
}

impl Serialize for DependencyKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape {
            KeyShape::Single => write!(f, "DependencyKey({})", self.type_name),
            KeyShape::Many => write!(f, "DependencyKey(many {})", self.type_name),
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape {
            KeyShape::Single => write!(f, "{}", self.type_name),
            KeyShape::Many => write!(f, "[{}]", self.type_name),
        }
    }
}
