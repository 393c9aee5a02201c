//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Core traits
pub use crate::observable::Observable;
pub use crate::observer::Observer;
// Operators
#[cfg(feature = "futures-stream")]
pub use crate::ops::into_stream::IntoStream;
pub use crate::ops::{
  combine_latest::CombineLatest, distinct_until_changed::DistinctUntilChanged, filter::Filter,
  filter_map::FilterMap, map::Map, skip::Skip,
};
// Subject
pub use crate::subject::*;
// Subscription
pub use crate::subscription::*;
pub use crate::{
  error::Error,
  list::{DerivedList, Indexed, ListBatch, ListItem, ListView, Modification, Movement, ReactiveList},
  object::{
    ChangingStream, NotificationSuppression, PropertyChange, PropertyChanged, PropertyChanging,
    PropertyStream, PropertyValue, ReactiveObject,
  },
  path::{Link, PathBuilder, PathObservable, PathSubscription, PropertyPath},
  property::{ObjectType, Property, PropertyKey},
  store::{MemoryStore, PropertyStore, Value},
  stream::{EventStream, ValueStream},
};
