//! Ambient dependencies: values codecs need for reconstruction but which
//! are not themselves part of the serialized payload.
use {
    crate::error::{missing_dependency, Result},
    core::any::{Any, TypeId},
    std::collections::HashMap,
};

/// Immutable map of ambient singletons, keyed by their own type.
///
/// Populated once at engine construction and read-only afterwards; codecs
/// fetch entries through the call context. One value per type: a later
/// [`DependencyMap::with`] for the same type replaces the earlier one.
#[derive(Default)]
pub struct DependencyMap {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch the singleton of type `T`, failing if none was configured.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .ok_or_else(|| missing_dependency(core::any::type_name::<T>()))
    }
}

impl core::fmt::Debug for DependencyMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DependencyMap")
            .field("entries", &self.entries.len())
            .finish()
    }
}
