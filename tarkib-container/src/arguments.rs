//! Resolved arguments handed to factory closures.

use std::sync::Arc;

use crate::container::Container;
use crate::error::{Result, TarkibError};
use crate::instance::Instance;
use crate::key::DependencyKey;

/// A single resolved argument value.
#[derive(Debug, Clone)]
pub enum Argument {
    Instance(Instance),
    Many(Vec<Instance>),
    Flag(bool),
    Container(Container),
    /// Nothing injected; the factory should fall back to its default.
    Absent,
}

/// Named arguments for one construction, in parameter order.
///
/// ```
/// use std::sync::Arc;
/// use tarkib_container::arguments::{Argument, Arguments};
/// use tarkib_container::instance::Instance;
/// use tarkib_container::key::DependencyKey;
///
/// let mut args = Arguments::new(DependencyKey::of::<u8>());
/// args.push("name", Argument::Instance(Instance::new(Arc::new(String::from("svc")))));
/// args.push("retries", Argument::Absent);
///
/// assert_eq!(*args.get::<String>("name").unwrap(), "svc");
/// assert!(args.get_opt::<u32>("retries").unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Arguments {
    component: DependencyKey,
    owner: Option<Instance>,
    values: Vec<(&'static str, Argument)>,
}

impl Arguments {
    pub fn new(component: DependencyKey) -> Self {
        Self {
            component,
            owner: None,
            values: Vec::new(),
        }
    }

    pub(crate) fn with_owner(mut self, owner: Instance) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn push(&mut self, name: &'static str, argument: Argument) {
        self.values.push((name, argument));
    }

    /// The component being constructed.
    pub fn component(&self) -> DependencyKey {
        self.component
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Argument)> {
        self.values.iter().map(|(name, argument)| (*name, argument))
    }

    fn find(&self, name: &str) -> Option<&Argument> {
        self.values
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, argument)| argument)
    }

    fn missing(name: &str, expected: &'static str) -> TarkibError {
        TarkibError::MissingArgument {
            parameter: name.to_string(),
            expected,
        }
    }

    /// Required single dependency.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.get_opt::<T>(name)?
            .ok_or_else(|| Self::missing(name, std::any::type_name::<T>()))
    }

    /// Optional dependency; `None` when the parameter was left absent.
    pub fn get_opt<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Option<Arc<T>>> {
        match self.find(name) {
            Some(Argument::Instance(instance)) => {
                instance
                    .downcast::<T>()
                    .map(Some)
                    .ok_or_else(|| TarkibError::TypeMismatch {
                        key: DependencyKey::of::<T>(),
                        expected: std::any::type_name::<T>(),
                    })
            }
            Some(Argument::Absent) => Ok(None),
            _ => Err(Self::missing(name, std::any::type_name::<T>())),
        }
    }

    /// Every implementation bound to a collection parameter.
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Vec<Arc<T>>> {
        match self.find(name) {
            Some(Argument::Many(instances)) => instances
                .iter()
                .map(|instance| {
                    instance.downcast::<T>().ok_or_else(|| TarkibError::TypeMismatch {
                        key: DependencyKey::of::<T>(),
                        expected: std::any::type_name::<T>(),
                    })
                })
                .collect(),
            Some(Argument::Absent) => Ok(Vec::new()),
            _ => Err(Self::missing(name, std::any::type_name::<T>())),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.find(name) {
            Some(Argument::Flag(value)) => Ok(*value),
            Some(Argument::Absent) => Ok(false),
            _ => Err(Self::missing(name, "bool")),
        }
    }

    pub fn container(&self, name: &str) -> Result<Container> {
        match self.find(name) {
            Some(Argument::Container(container)) => Ok(container.clone()),
            _ => Err(Self::missing(name, "Container")),
        }
    }

    /// Owning instance of a factory member.
    pub fn owner<O: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<O>> {
        let owner = self
            .owner
            .as_ref()
            .ok_or_else(|| Self::missing("self", std::any::type_name::<O>()))?;
        owner.downcast::<O>().ok_or_else(|| TarkibError::TypeMismatch {
            key: DependencyKey::of::<O>(),
            expected: std::any::type_name::<O>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Arguments {
        let mut args = Arguments::new(DependencyKey::of::<()>());
        args.push("count", Argument::Instance(Instance::new(Arc::new(3u32))));
        args.push(
            "names",
            Argument::Many(vec![
                Instance::new(Arc::new(String::from("a"))),
                Instance::new(Arc::new(String::from("b"))),
            ]),
        );
        args.push("verbose", Argument::Flag(true));
        args.push("fallback", Argument::Absent);
        args
    }

    #[test]
    fn typed_access() {
        let args = sample();
        assert_eq!(*args.get::<u32>("count").unwrap(), 3);
        let names: Vec<String> = args
            .get_all::<String>("names")
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(args.flag("verbose").unwrap());
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn absent_values() {
        let args = sample();
        assert!(args.get_opt::<u32>("fallback").unwrap().is_none());
        assert!(args.get_all::<String>("fallback").unwrap().is_empty());
        match args.get::<u32>("fallback") {
            Err(TarkibError::MissingArgument { parameter, .. }) => assert_eq!(parameter, "fallback"),
            other => panic!("Expected MissingArgument, got: {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_mismatch() {
        let args = sample();
        match args.get::<String>("count") {
            Err(TarkibError::TypeMismatch { .. }) => {}
            other => panic!("Expected TypeMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn owner_required_for_members() {
        let args = sample();
        assert!(args.owner::<u32>().is_err());
        let args = args.with_owner(Instance::new(Arc::new(9u32)));
        assert_eq!(*args.owner::<u32>().unwrap(), 9);
    }
}
