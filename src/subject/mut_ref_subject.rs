use std::convert::Infallible;

use super::{subject_core::SubjectCore, SubjectSubscription};
use crate::observer::{BoxedObserverMutRef, DynObserver, FnMutObserver, Observer};

/// A subject that lends `&mut Item` to its observers one after another.
///
/// Observers run in subscription order and each one sees the writes of the
/// observers before it. Reactive objects publish their "changing" records
/// through it so subscribers can rewrite a pending value before it is
/// committed.
///
/// ```rust
/// use rxstate::prelude::*;
///
/// let subject = MutRefSubject::<i32>::new();
/// subject.subscribe(|v: &mut i32| *v += 1);
/// subject.subscribe(|v: &mut i32| *v *= 2);
///
/// let mut value = 10;
/// subject.next(&mut value);
/// assert_eq!(value, 22);
/// ```
pub struct MutRefSubject<Item> {
  core: SubjectCore<BoxedObserverMutRef<Item, Infallible>>,
}

impl<Item> Clone for MutRefSubject<Item> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<Item> Default for MutRefSubject<Item> {
  fn default() -> Self { Self { core: SubjectCore::default() } }
}

impl<Item: 'static> MutRefSubject<Item> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Subscribe with a closure receiving each value mutably.
  pub fn subscribe<F>(&self, next: F) -> SubjectSubscription<BoxedObserverMutRef<Item, Infallible>>
  where
    F: FnMut(&mut Item) + Send + 'static,
  {
    self.subscribe_with(FnMutObserver(next))
  }

  /// Subscribe with a full observer, e.g. one that reacts to completion.
  pub fn subscribe_with<O>(&self, observer: O) -> SubjectSubscription<BoxedObserverMutRef<Item, Infallible>>
  where
    O: for<'m> Observer<&'m mut Item, Infallible> + Send + 'static,
  {
    let boxed: BoxedObserverMutRef<Item, Infallible> = Box::new(observer);
    match self.core.add(boxed) {
      Ok(subscription) => subscription,
      Err(observer) => {
        observer.box_complete();
        SubjectSubscription::closed(self.core.shared.clone())
      }
    }
  }

  /// Lend `value` to every observer in turn.
  pub fn next(&self, value: &mut Item) {
    self
      .core
      .emit(|observer| observer.box_next(&mut *value), |observer| observer.box_complete());
  }

  pub fn complete(&self) { self.core.complete(|observer| observer.box_complete()); }

  #[inline]
  pub fn is_closed(&self) -> bool { self.core.is_completed() }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::subscription::Subscription;

  #[test]
  fn observers_see_previous_writes() {
    let subject = MutRefSubject::<String>::new();
    subject.subscribe(|v: &mut String| v.push('a'));
    subject.subscribe(|v: &mut String| v.push('b'));

    let mut value = String::new();
    subject.next(&mut value);
    assert_eq!(value, "ab");
  }

  #[test]
  fn unsubscribed_observer_is_not_called() {
    let calls = Arc::new(AtomicUsize::new(0));
    let subject = MutRefSubject::<i32>::new();
    let c_calls = calls.clone();
    let sub = subject.subscribe(move |_: &mut i32| {
      c_calls.fetch_add(1, Ordering::SeqCst);
    });

    subject.next(&mut 0);
    sub.unsubscribe();
    subject.next(&mut 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(subject.subscriber_count(), 0);
  }
}
