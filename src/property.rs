//! Static property identity.
//!
//! A property is "field `name` declared on type `owner`". Both the type and the
//! property are declared once as `static` items, and identity is the address
//! of the owner descriptor plus the name, so a property re-declared with the
//! same name on another type is a different property.
//!
//! ```rust
//! use rxstate::prelude::*;
//!
//! static SHAPE: ObjectType = ObjectType::new("Shape");
//! static CIRCLE: ObjectType = ObjectType::derived("Circle", &SHAPE);
//!
//! static NAME: Property<String> = Property::new(&SHAPE, "name");
//! static RADIUS: Property<f64> = Property::new(&CIRCLE, "radius");
//!
//! assert!(NAME.belongs_to(&CIRCLE));
//! assert!(!RADIUS.belongs_to(&SHAPE));
//! ```

use std::{
  fmt,
  hash::{Hash, Hasher},
  marker::PhantomData,
  ptr,
};

/// Descriptor of a reactive object type.
///
/// A type may derive from one parent; properties declared on an ancestor
/// belong to every descendant.
#[derive(Debug)]
pub struct ObjectType {
  name: &'static str,
  parent: Option<&'static ObjectType>,
}

impl ObjectType {
  pub const fn new(name: &'static str) -> Self { Self { name, parent: None } }

  pub const fn derived(name: &'static str, parent: &'static ObjectType) -> Self {
    Self { name, parent: Some(parent) }
  }

  #[inline]
  pub fn name(&self) -> &'static str { self.name }

  #[inline]
  pub fn parent(&self) -> Option<&'static ObjectType> { self.parent }

  /// Whether `self` is `other` or derives from it.
  pub fn is_a(&self, other: &ObjectType) -> bool {
    let mut current = Some(self);
    while let Some(ty) = current {
      if ptr::eq(ty, other) {
        return true;
      }
      current = ty.parent;
    }
    false
  }
}

/// Untyped property identity, used as the storage key and as the key of the
/// per-property stream cache.
#[derive(Clone, Copy)]
pub struct PropertyKey {
  owner: &'static ObjectType,
  name: &'static str,
}

impl PropertyKey {
  #[inline]
  pub fn owner(&self) -> &'static ObjectType { self.owner }

  #[inline]
  pub fn name(&self) -> &'static str { self.name }

  #[inline]
  pub fn belongs_to(&self, ty: &ObjectType) -> bool { ty.is_a(self.owner) }
}

impl PartialEq for PropertyKey {
  fn eq(&self, other: &Self) -> bool { ptr::eq(self.owner, other.owner) && self.name == other.name }
}

impl Eq for PropertyKey {}

impl Hash for PropertyKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    ptr::hash(self.owner, state);
    self.name.hash(state);
  }
}

impl fmt::Debug for PropertyKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(self, f) }
}

impl fmt::Display for PropertyKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}::{}", self.owner.name, self.name)
  }
}

/// Typed property identity. `T` is the value type stored under it.
pub struct Property<T> {
  key: PropertyKey,
  _marker: PhantomData<fn() -> T>,
}

impl<T> Property<T> {
  pub const fn new(owner: &'static ObjectType, name: &'static str) -> Self {
    Self { key: PropertyKey { owner, name }, _marker: PhantomData }
  }

  #[inline]
  pub fn key(&self) -> PropertyKey { self.key }

  #[inline]
  pub fn name(&self) -> &'static str { self.key.name }

  #[inline]
  pub fn belongs_to(&self, ty: &ObjectType) -> bool { self.key.belongs_to(ty) }
}

impl<T> fmt::Debug for Property<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.key, f) }
}
