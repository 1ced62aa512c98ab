//! Type-erased instance handles.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// A resolved instance with its concrete type erased.
///
/// Wraps an `Arc<T>` (where `T` may be a trait object such as
/// `dyn Logger`), so cloning an `Instance` never clones the value.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use tarkib_container::instance::Instance;
///
/// trait Greeter: Send + Sync { fn hello(&self) -> &str; }
/// struct English;
/// impl Greeter for English { fn hello(&self) -> &str { "hello" } }
///
/// let greeter: Arc<dyn Greeter> = Arc::new(English);
/// let erased = Instance::new(greeter);
/// assert_eq!(erased.downcast::<dyn Greeter>().unwrap().hello(), "hello");
/// assert!(erased.downcast::<English>().is_none());
/// ```
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    address: usize,
    type_name: &'static str,
}

impl Instance {
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        let address = Arc::as_ptr(&value) as *const () as usize;
        Self {
            value: Arc::new(value),
            address,
            type_name: type_name::<T>(),
        }
    }

    /// Recovers the typed handle, or `None` if `T` is not the stored type.
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Name of the type this instance was stored as.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both handles point at the same object, even when
    /// one of them was cast to an interface.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        self.address == other.address
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name)
            .field("address", &format_args!("{:#x}", self.address))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape: Send + Sync {
        fn sides(&self) -> u32;
    }

    struct Square;

    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    #[test]
    fn downcast_concrete() {
        let instance = Instance::new(Arc::new(Square));
        assert!(instance.downcast::<Square>().is_some());
        assert!(instance.downcast::<String>().is_none());
    }

    #[test]
    fn downcast_trait_object() {
        let shape: Arc<dyn Shape> = Arc::new(Square);
        let instance = Instance::new(shape);
        assert_eq!(instance.downcast::<dyn Shape>().unwrap().sides(), 4);
    }

    #[test]
    fn identity_survives_interface_cast() {
        let square = Arc::new(Square);
        let concrete = Instance::new(square.clone());
        let as_shape = Instance::new(square as Arc<dyn Shape>);
        assert!(concrete.ptr_eq(&as_shape));

        let other = Instance::new(Arc::new(Square));
        assert!(!concrete.ptr_eq(&other));
    }

    #[test]
    fn clone_shares_value() {
        let instance = Instance::new(Arc::new(String::from("shared")));
        let copy = instance.clone();
        assert!(instance.ptr_eq(&copy));
        assert_eq!(copy.type_name(), "alloc::string::String");
    }
}
