//! The `Observable` trait: the producer side of every stream in the crate.
//!
//! Sources (subjects, property streams, path streams, list streams) implement
//! [`Observable::actual_subscribe`]; everything else, including the operator
//! methods, is provided on top of it.

use crate::{
  observer::{FnErrObserver, FnMutObserver, Observer},
  ops::{
    combine_latest::CombineLatest, distinct_until_changed::DistinctUntilChanged, filter::Filter,
    filter_map::FilterMap, map::Map, skip::Skip,
  },
  subscription::Subscription,
};

/// A push-based source of values.
///
/// Subscribing hands an [`Observer`] to the source and returns the
/// [`Subscription`] that cancels it. All sources in this crate deliver
/// synchronously on the thread that caused the emission.
///
/// ```rust
/// use std::{
///   convert::Infallible,
///   sync::{Arc, Mutex},
/// };
///
/// use rxstate::prelude::*;
///
/// let subject = Subject::<i32, Infallible>::new();
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// subject
///   .clone()
///   .map(|v| v * 10)
///   .filter(|v| *v > 10)
///   .subscribe(move |v| c_seen.lock().unwrap().push(v));
///
/// subject.clone().next(1);
/// subject.clone().next(2);
/// assert_eq!(*seen.lock().unwrap(), vec![20]);
/// ```
pub trait Observable: Sized {
  type Item;
  type Err;
  type Unsub: Subscription;

  /// Attach `observer` to this source.
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static;

  /// Subscribe with a `next` closure. Only available for sources that cannot
  /// fail.
  fn subscribe<F>(self, next: F) -> Self::Unsub
  where
    F: FnMut(Self::Item) + Send + 'static,
    FnMutObserver<F>: Observer<Self::Item, Self::Err>,
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  /// Subscribe with both a `next` and an `error` closure.
  fn subscribe_err<N, E>(self, next: N, error: E) -> Self::Unsub
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnOnce(Self::Err) + Send + 'static,
  {
    self.actual_subscribe(FnErrObserver { next, error })
  }

  /// Subscribe with a full observer.
  #[inline]
  fn subscribe_with<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    self.actual_subscribe(observer)
  }

  /// Transform each value with `func`.
  #[inline]
  fn map<B, F>(self, func: F) -> Map<Self, F>
  where
    F: FnMut(Self::Item) -> B,
  {
    Map { source: self, func }
  }

  /// Forward only the values for which `predicate` returns `true`.
  #[inline]
  fn filter<F>(self, predicate: F) -> Filter<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    Filter { source: self, predicate }
  }

  /// Apply `func` and forward only the `Some` results.
  #[inline]
  fn filter_map<B, F>(self, func: F) -> FilterMap<Self, F>
  where
    F: FnMut(Self::Item) -> Option<B>,
  {
    FilterMap { source: self, func }
  }

  /// Ignore the first `count` values.
  ///
  /// `observe(p).skip(1)` is the usual way to watch a property for changes
  /// only, without its replayed current value.
  #[inline]
  fn skip(self, count: usize) -> Skip<Self> { Skip { source: self, count } }

  /// Suppress values equal to the previously forwarded one.
  #[inline]
  fn distinct_until_changed(self) -> DistinctUntilChanged<Self>
  where
    Self::Item: PartialEq + Clone,
  {
    DistinctUntilChanged(self)
  }

  /// Combine the latest values of `self` and `other` with `binary_op` every
  /// time either side emits, once both sides have emitted at least once.
  #[inline]
  fn combine_latest<B, F, Out>(self, other: B, binary_op: F) -> CombineLatest<Self, B, F>
  where
    B: Observable<Err = Self::Err>,
    F: FnMut(Self::Item, B::Item) -> Out,
  {
    CombineLatest { a: self, b: other, binary_op }
  }

  /// Adapt this source into a `futures::Stream` of `Result<Item, Err>`.
  #[cfg(feature = "futures-stream")]
  #[inline]
  fn into_stream(self) -> crate::ops::into_stream::IntoStream<Self::Item, Self::Err, Self::Unsub>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    crate::ops::into_stream::IntoStream::new(self)
  }
}
