use std::sync::Arc;

use parking_lot::Mutex;

use super::{Subject, SubjectSubscription};
use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
};

/// A subject that remembers its latest value.
///
/// Every new subscriber first receives the current value, then every value
/// emitted afterwards. This is the replay-of-last-value stream behind
/// `ReactiveObject::observe` and `ReactiveList::count_changed`.
///
/// ```rust
/// use std::{
///   convert::Infallible,
///   sync::{Arc, Mutex},
/// };
///
/// use rxstate::prelude::*;
///
/// let subject = BehaviorSubject::<i32, Infallible>::new(42);
/// subject.clone().next(1);
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// subject
///   .clone()
///   .subscribe(move |v| c_seen.lock().unwrap().push(v));
/// subject.clone().next(2);
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct BehaviorSubject<Item, Err> {
  pub(crate) subject: Subject<Item, Err>,
  pub(crate) value: Arc<Mutex<Latest<Item>>>,
}

/// The latest value and how many times it has been replaced.
pub(crate) struct Latest<Item> {
  item: Item,
  revision: u64,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), value: self.value.clone() } }
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  #[inline]
  pub fn new(value: Item) -> Self {
    Self { subject: Subject::new(), value: Arc::new(Mutex::new(Latest { item: value, revision: 0 })) }
  }

  /// The current value.
  #[inline]
  pub fn value(&self) -> Item
  where
    Item: Clone,
  {
    self.value.lock().item.clone()
  }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.subject.subscriber_count() }
}

impl<Item, Err> Observer<Item, Err> for BehaviorSubject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let core = self.subject.core.clone();
    core.exclusive(|| {
      {
        let mut latest = self.value.lock();
        latest.item = value.clone();
        latest.revision += 1;
      }
      self.subject.next(value);
    });
  }

  #[inline]
  fn error(self, err: Err) { self.subject.error(err) }

  #[inline]
  fn complete(self) { self.subject.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.subject.is_closed() }
}

impl<Item, Err> Observable for BehaviorSubject<Item, Err>
where
  Item: Clone + 'static,
  Err: 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubjectSubscription<BoxedObserver<Item, Err>>;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let core = self.subject.core.clone();
    core.exclusive(|| {
      // A value published while the replay runs (by the observer itself)
      // reaches no one, so replay again until the value is stable.
      let mut replayed = None;
      while !self.subject.core.is_completed() {
        let (current, revision) = {
          let latest = self.value.lock();
          (latest.item.clone(), latest.revision)
        };
        if replayed == Some(revision) {
          break;
        }
        replayed = Some(revision);
        observer.next(current);
      }
      self.subject.actual_subscribe(observer)
    })
  }
}
