//! # Tarkib — Dependency-Injection Wiring for Rust
//!
//! Components are declared once, planned once, and resolved many times:
//!
//! 1. describe components with [`ComponentDescriptor`](descriptor::ComponentDescriptor)
//! 2. collect them in a [`ComponentRegistry`], by hand or through
//!    `inventory`-submitted providers
//! 3. build a [`WiringPlan`]; cycles and unsatisfiable constructions fail here
//! 4. run the plan in a [`Container`], spawn scopes, compose containers
//!
//! ```rust
//! use std::sync::Arc;
//! use tarkib::prelude::*;
//!
//! struct Clock;
//!
//! let plan = ComponentRegistry::new()
//!     .component(
//!         ComponentDescriptor::constructed::<Clock>()
//!             .singleton()
//!             .default_constructor(|_| Ok(Arc::new(Clock))),
//!     )
//!     .plan()?;
//!
//! let container = plan.container().build()?;
//! let a = container.resolve::<Clock>()?;
//! let b = container.resolve::<Clock>()?;
//! assert!(Arc::ptr_eq(&a, &b));
//! # Ok::<(), tarkib::TarkibError>(())
//! ```

pub use tarkib_container::*;
pub use tarkib_support::*;
