use crate::{observable::Observable, observer::Observer};

/// Skip operator: drops the first `count` values.
#[derive(Clone)]
pub struct Skip<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S: Observable> Observable for Skip<S> {
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self
      .source
      .actual_subscribe(SkipObserver { observer, remaining: self.count })
  }
}

pub struct SkipObserver<O> {
  observer: O,
  remaining: usize,
}

impl<Item, Err, O> Observer<Item, Err> for SkipObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining > 0 {
      self.remaining -= 1;
    } else {
      self.observer.next(value);
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
  fn skips_replayed_value() {
    let subject = BehaviorSubject::<i32, Infallible>::new(0);
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    subject
      .clone()
      .skip(1)
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    subject.clone().next(1);
    subject.clone().next(2);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
  }
}
