//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use std::convert::Infallible;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  ///
  /// This consumes the observer, as no more values can be emitted after an
  /// error
  fn error(self, err: Err);

  /// Handle completion of the observable
  ///
  /// This consumes the observer, as no more values can be emitted after
  /// completion
  fn complete(self);

  /// Returns `true` if the observer is closed and will not accept more values.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Helper trait to enable object-safe Observers (Box<dyn Observer>)
///
/// Standard Observer trait is not object-safe because `error` and `complete`
/// take `self` by value. DynObserver mirrors the interface but adapts it for
/// vtables.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { self.error(err); }
  fn box_complete(self: Box<Self>) { self.complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// Boxed value observer. Every stream in this crate may be fed from any
/// thread, so boxed observers are always `Send`.
pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err> + Send>;

/// Boxed mutable reference observer using HRTB.
pub type BoxedObserverMutRef<Item, Err> = Box<dyn for<'m> DynObserver<&'m mut Item, Err> + Send>;

#[allow(coherence_leak_check)]
impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

#[allow(coherence_leak_check)]
impl<'r, Item, Err> Observer<&'r mut Item, Err> for BoxedObserverMutRef<Item, Err> {
  #[inline]
  fn next(&mut self, value: &'r mut Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// FnMutObserver - Closure adapter
// ============================================================================

/// Closure adapter used by `subscribe`.
///
/// The closure becomes the `next` handler. Only streams that cannot fail
/// (`Infallible`) accept a bare closure, so errors are never dropped
/// silently; use `subscribe_err` for fallible streams.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item, Infallible> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn error(self, err: Infallible) { match err {} }

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Closure pair adapter used by `subscribe_err`.
#[derive(Clone)]
pub struct FnErrObserver<N, E> {
  pub next: N,
  pub error: E,
}

impl<N, E, Item, Err> Observer<Item, Err> for FnErrObserver<N, E>
where
  N: FnMut(Item),
  E: FnOnce(Err),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.next)(v); }

  #[inline]
  fn error(self, err: Err) { (self.error)(err) }

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Option observer - None ignores all events, Some delegates to inner
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Observer::is_closed) }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct TestObserver {
    values: Vec<i32>,
  }

  impl Observer<i32, ()> for TestObserver {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn error(self, _: ()) {}

    fn complete(self) {}

    fn is_closed(&self) -> bool { false }
  }

  #[test]
  fn observer_trait() {
    let mut obs = TestObserver { values: vec![] };
    obs.next(1);
    obs.next(2);
    assert_eq!(obs.values, vec![1, 2]);
    assert!(!obs.is_closed());
  }

  #[test]
  fn closure_as_observer() {
    let mut count = 0;
    let mut closure_obs = FnMutObserver(|v: i32| {
      count += v;
    });

    closure_obs.next(10);
    closure_obs.next(20);
    assert_eq!(count, 30);
  }

  #[test]
  fn boxed_mut_ref_observer_rewrites() {
    let mut boxed: BoxedObserverMutRef<i32, Infallible> = Box::new(FnMutObserver(|v: &mut i32| {
      *v += 1;
    }));
    let mut value = 1;
    boxed.next(&mut value);
    boxed.next(&mut value);
    assert_eq!(value, 3);
  }

  #[test]
  fn value_and_mut_ref_boxes_dispatch_separately() {
    use std::sync::{
      atomic::{AtomicI32, Ordering},
      Arc,
    };

    let sum = Arc::new(AtomicI32::new(0));
    let c_sum = sum.clone();
    let mut by_value: BoxedObserver<i32, Infallible> = Box::new(FnMutObserver(move |v: i32| {
      c_sum.fetch_add(v, Ordering::SeqCst);
    }));
    by_value.next(5);
    assert!(!by_value.is_closed());

    let mut by_ref: BoxedObserverMutRef<i32, Infallible> = Box::new(FnMutObserver(|v: &mut i32| *v *= 2));
    let mut value = sum.load(Ordering::SeqCst);
    Observer::<&mut i32, Infallible>::next(&mut by_ref, &mut value);
    assert_eq!(value, 10);
  }

  #[test]
  fn none_observer_is_closed() {
    let none: Option<TestObserver> = None;
    assert!(Observer::<i32, ()>::is_closed(&none));
  }
}
