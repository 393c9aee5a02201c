use crate::{observable::Observable, observer::Observer};

/// FilterMap operator: applies `func` and forwards the `Some` results.
///
/// Typed views over untyped record streams use it, e.g.
/// `ReactiveObject::changed_of` keeps the records of one property and
/// downcasts them in one step.
#[derive(Clone)]
pub struct FilterMap<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S, F, B> Observable for FilterMap<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> Option<B> + Send + 'static,
{
  type Item = B;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(FilterMapObserver { observer, func: self.func })
  }
}

pub struct FilterMapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for FilterMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Option<B>,
{
  fn next(&mut self, value: Item) {
    if let Some(mapped) = (self.func)(value) {
      self.observer.next(mapped);
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
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
  fn keeps_parsed_values() {
    let subject = Subject::<&'static str, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    subject
      .clone()
      .filter_map(|s| s.parse::<i32>().ok())
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    for s in ["1", "lol", "3", "NaN", "5"] {
      subject.clone().next(s);
    }
    assert_eq!(*seen.lock().unwrap(), vec![1, 3, 5]);
  }
}
