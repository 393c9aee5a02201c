//! Read-only views of the subjects owned by reactive objects and lists.
//!
//! Consumers get these instead of the subjects themselves, so only the owner
//! can publish.

use std::convert::Infallible;

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subject::{BehaviorSubject, Subject, SubjectSubscription},
};

/// A hot stream of events. Subscribers only see events published after they
/// subscribed.
pub struct EventStream<Item> {
  subject: Subject<Item, Infallible>,
}

impl<Item> EventStream<Item> {
  pub(crate) fn new(subject: Subject<Item, Infallible>) -> Self { Self { subject } }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.subject.subscriber_count() }
}

impl<Item> Clone for EventStream<Item> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone() } }
}

impl<Item: 'static> Observable for EventStream<Item> {
  type Item = Item;
  type Err = Infallible;
  type Unsub = SubjectSubscription<BoxedObserver<Item, Infallible>>;

  #[inline]
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Infallible> + Send + 'static,
  {
    self.subject.actual_subscribe(observer)
  }
}

/// A replay-of-last-value stream: a new subscriber immediately receives the
/// current value, then every value published afterwards.
pub struct ValueStream<Item> {
  subject: BehaviorSubject<Item, Infallible>,
}

impl<Item> ValueStream<Item> {
  pub(crate) fn new(subject: BehaviorSubject<Item, Infallible>) -> Self { Self { subject } }

  /// The value a new subscriber would receive first.
  #[inline]
  pub fn value(&self) -> Item
  where
    Item: Clone,
  {
    self.subject.value()
  }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.subject.subscriber_count() }
}

impl<Item> Clone for ValueStream<Item> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone() } }
}

impl<Item: Clone + 'static> Observable for ValueStream<Item> {
  type Item = Item;
  type Err = Infallible;
  type Unsub = SubjectSubscription<BoxedObserver<Item, Infallible>>;

  #[inline]
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Infallible> + Send + 'static,
  {
    self.subject.actual_subscribe(observer)
  }
}
