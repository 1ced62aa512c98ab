//! Error types for Tarkib planning and container operations.
//!
//! Plan-build errors ([`TarkibError::CyclicDependency`],
//! [`TarkibError::UnsatisfiableConstruction`]) abort planning entirely.
//! Runtime errors surface at the point of use.

use std::fmt;

use tarkib_support::rendering::render_chain;

use crate::key::DependencyKey;

/// Main error type for all Tarkib operations.
#[derive(Debug, thiserror::Error)]
pub enum TarkibError {
    /// Requested type has no binding locally or in any base container.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// The descriptor graph contains a cycle.
    #[error("{}", .0)]
    CyclicDependency(CyclicDependencyError),

    /// A component has no usable construction path.
    #[error("{}", .0)]
    UnsatisfiableConstruction(UnsatisfiableConstructionError),

    /// A conditional binding ended in its "no fallback" terminal.
    #[error(
        "No instance of {interface} for the current flags\n  Hint: register an unconditional fallback implementation"
    )]
    AbsentInstance { interface: DependencyKey },

    /// Factory returned an error during construction.
    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: DependencyKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An erased instance did not hold the requested type.
    #[error("Type mismatch for {key}: expected {expected}")]
    TypeMismatch {
        key: DependencyKey,
        expected: &'static str,
    },

    /// A factory asked for an argument that was not planned for it.
    #[error("Argument `{parameter}` is not available as {expected}")]
    MissingArgument {
        parameter: String,
        expected: &'static str,
    },

    /// Resolution recursed deeper than the runtime guard allows.
    #[error(
        "Resolution of {key} exceeded depth {depth}\n  Hint: a factory member probably closes a dependency cycle"
    )]
    ResolutionDepthExceeded { key: DependencyKey, depth: usize },

    /// The container was disposed.
    #[error("Container is disposed")]
    Disposed,
}

impl TarkibError {
    /// Wraps any error raised inside a factory closure.
    pub fn construction(
        key: DependencyKey,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        TarkibError::ConstructionFailed {
            key,
            source: source.into(),
        }
    }

    /// `true` for the recoverable "unregistered type" condition.
    pub fn is_not_registered(&self) -> bool {
        matches!(self, TarkibError::NotRegistered(_))
    }
}

/// Error when a type was never registered.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The dependency that was requested
    pub requested: DependencyKey,
    /// What required this dependency (if known)
    pub required_by: Option<DependencyKey>,
    /// Similar types that ARE registered
    pub suggestions: Vec<DependencyKey>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: register a component implementing {} or supply it as a seed",
            self.requested.short_name()
        )
    }
}

/// Error when the cycle detector finds two interfaces depending on each other.
#[derive(Debug)]
pub struct CyclicDependencyError {
    /// The interface whose construction needs `dependency`.
    pub dependent: DependencyKey,
    /// The interface that already (transitively) needs `dependent`.
    pub dependency: DependencyKey,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = [
            self.dependent.short_name(),
            self.dependency.short_name(),
            self.dependent.short_name(),
        ];
        write!(f, "Cyclic dependency detected:\n  {}", render_chain(&chain))?;
        write!(
            f,
            "\n  Hint: break the cycle with a factory member or a collection parameter"
        )
    }
}

/// Error when a component cannot be constructed from known components.
#[derive(Debug)]
pub struct UnsatisfiableConstructionError {
    /// The component that cannot be built.
    pub component: DependencyKey,
    /// Owning type of a factory member, if that is what is missing.
    pub owner: Option<DependencyKey>,
    pub reason: String,
}

impl fmt::Display for UnsatisfiableConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot construct {}: {}",
            self.component, self.reason
        )?;
        if let Some(ref owner) = self.owner {
            write!(
                f,
                "\n  Hint: register at least one component providing {}",
                owner.short_name()
            )?;
        }
        Ok(())
    }
}

/// Convenient Result type for Tarkib operations.
pub type Result<T> = std::result::Result<T, TarkibError>;
