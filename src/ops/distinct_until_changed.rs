//! DistinctUntilChanged operator implementation
//!
//! Filters consecutive duplicate items emitted by the source observable.
//! Property path streams apply it once, at the outermost level.

use crate::{observable::Observable, observer::Observer};

/// DistinctUntilChanged operator: Emits items only if they are different from
/// the previous item.
///
/// It requires the item type to implement `PartialEq` and `Clone`.
#[derive(Clone)]
pub struct DistinctUntilChanged<S>(pub S);

impl<S> Observable for DistinctUntilChanged<S>
where
  S: Observable,
  S::Item: PartialEq + Clone + Send + 'static,
{
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self
      .0
      .actual_subscribe(DistinctUntilChangedObserver::new(observer))
  }
}

/// DistinctUntilChangedObserver wrapper for filtering consecutive duplicates
pub struct DistinctUntilChangedObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<O, Item> DistinctUntilChangedObserver<O, Item> {
  pub fn new(observer: O) -> Self { Self { observer, last: None } }
}

impl<O, Item, Err> Observer<Item, Err> for DistinctUntilChangedObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: PartialEq + Clone,
{
  fn next(&mut self, value: Item) {
    if self.last.as_ref() != Some(&value) {
      self.last = Some(value.clone());
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err); }

  fn complete(self) { self.observer.complete(); }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
  };

  use crate::prelude::*;

  #[test]
  fn suppresses_consecutive_duplicates() {
    let subject = Subject::<i32, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    subject
      .clone()
      .distinct_until_changed()
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    for v in [1, 1, 2, 2, 1, 3, 3] {
      subject.clone().next(v);
    }
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1, 3]);
  }
}
