use std::{any::Any, collections::HashMap, sync::Arc};

use crate::property::PropertyKey;

/// A type-erased property value.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Storage of a reactive object's property values.
///
/// The object only ever talks to its values through this contract, so any
/// backend that remembers what it was given can replace the default
/// [`MemoryStore`].
pub trait PropertyStore: Send {
  /// The last value stored under `key`, or `None` if nothing was stored.
  fn retrieve(&self, key: &PropertyKey) -> Option<Value>;

  fn store(&mut self, key: PropertyKey, value: Value);

  /// Drops every stored value.
  fn clear(&mut self);
}

/// The default in-memory backend.
#[derive(Default)]
pub struct MemoryStore {
  values: HashMap<PropertyKey, Value>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.values.len() }

  pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

impl PropertyStore for MemoryStore {
  fn retrieve(&self, key: &PropertyKey) -> Option<Value> { self.values.get(key).cloned() }

  fn store(&mut self, key: PropertyKey, value: Value) { self.values.insert(key, value); }

  fn clear(&mut self) { self.values.clear(); }
}
