use std::sync::Arc;

use crate::{
  property::{Property, PropertyKey},
  store::Value,
};

/// A pending property change, published on the "changing" stream before the
/// new value is committed.
///
/// Subscribers run in subscription order and may replace the pending value;
/// whatever value the record holds after the last subscriber is committed.
///
/// ```rust
/// use rxstate::prelude::*;
///
/// static ACCOUNT: ObjectType = ObjectType::new("Account");
/// static BALANCE: Property<i64> = Property::new(&ACCOUNT, "balance");
///
/// let account = ReactiveObject::new(&ACCOUNT);
/// account.changing().subscribe(|change: &mut PropertyChanging| {
///   if let Some(&new) = change.new_value(&BALANCE) {
///     change.set_new_value(&BALANCE, new.max(0));
///   }
/// });
///
/// account.set(&BALANCE, -20).unwrap();
/// assert_eq!(account.get(&BALANCE).unwrap(), 0);
/// account.set(&BALANCE, 20).unwrap();
/// assert_eq!(account.get(&BALANCE).unwrap(), 20);
/// ```
pub struct PropertyChanging {
  pub(crate) property: PropertyKey,
  pub(crate) old: Value,
  pub(crate) new: Value,
}

impl PropertyChanging {
  #[inline]
  pub fn property(&self) -> PropertyKey { self.property }

  /// Whether this record is about `property`.
  #[inline]
  pub fn is<T>(&self, property: &Property<T>) -> bool { self.property == property.key() }

  /// The committed value before this change, if the record is about
  /// `property`.
  pub fn old_value<T: 'static>(&self, property: &Property<T>) -> Option<&T> {
    self
      .is(property)
      .then(|| self.old.downcast_ref::<T>())
      .flatten()
  }

  /// The value that will be committed, if the record is about `property`.
  pub fn new_value<T: 'static>(&self, property: &Property<T>) -> Option<&T> {
    self
      .is(property)
      .then(|| self.new.downcast_ref::<T>())
      .flatten()
  }

  /// Replace the value that will be committed. Returns `false`, leaving the
  /// record untouched, when the record is about another property.
  pub fn set_new_value<T: Send + Sync + 'static>(&mut self, property: &Property<T>, value: T) -> bool {
    if !self.is(property) {
      return false;
    }
    self.new = Arc::new(value);
    true
  }
}

/// A committed property change, published on the "changed" stream.
#[derive(Clone)]
pub struct PropertyChanged {
  pub(crate) property: PropertyKey,
  pub(crate) old: Value,
  pub(crate) new: Value,
}

impl PropertyChanged {
  #[inline]
  pub fn property(&self) -> PropertyKey { self.property }

  #[inline]
  pub fn is<T>(&self, property: &Property<T>) -> bool { self.property == property.key() }

  pub fn old_value<T: 'static>(&self, property: &Property<T>) -> Option<&T> {
    self
      .is(property)
      .then(|| self.old.downcast_ref::<T>())
      .flatten()
  }

  pub fn new_value<T: 'static>(&self, property: &Property<T>) -> Option<&T> {
    self
      .is(property)
      .then(|| self.new.downcast_ref::<T>())
      .flatten()
  }

  /// The typed view of this record, if it is about `property`.
  pub fn typed<T: Clone + 'static>(&self, property: &Property<T>) -> Option<PropertyChange<T>> {
    Some(PropertyChange {
      old: self.old_value(property)?.clone(),
      new: self.new_value(property)?.clone(),
    })
  }
}

impl std::fmt::Debug for PropertyChanged {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PropertyChanged")
      .field("property", &self.property)
      .finish_non_exhaustive()
  }
}

/// Old and new value of one committed change of a single property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange<T> {
  pub old: T,
  pub new: T,
}
