//! Wiring planner and runtime container for Tarkib DI.
//!
//! Planning turns a [`ComponentRegistry`](registry::ComponentRegistry)
//! into an immutable [`WiringPlan`](plan::WiringPlan); a
//! [`Container`](container::Container) executes that plan.

pub mod arguments;
pub mod binding;
pub mod container;
pub mod descriptor;
pub mod dispose;
pub mod error;
pub mod flags;
pub mod graph;
pub mod instance;
pub mod key;
pub mod lifetime;
pub mod plan;
pub mod provider;
pub mod registry;
pub mod selector;

pub use container::prelude;
pub use container::{Container, ContainerBuilder};
pub use error::{Result, TarkibError};
pub use instance::Instance;
pub use key::DependencyKey;
pub use lifetime::Lifetime;
pub use plan::WiringPlan;
pub use registry::ComponentRegistry;
