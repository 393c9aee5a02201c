//! IntoStream Operator
//!
//! Converts an `Observable` into a `futures::Stream`, so property and list
//! streams can be consumed with `while let` loops in async code.
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use rxstate::prelude::*;
//!
//! static COUNTER: ObjectType = ObjectType::new("Counter");
//! static VALUE: Property<u32> = Property::new(&COUNTER, "value");
//!
//! # futures::executor::block_on(async {
//! let counter = ReactiveObject::new(&COUNTER);
//! let mut stream = counter.observe(&VALUE).unwrap().into_stream();
//! counter.set(&VALUE, 7).unwrap();
//!
//! assert_eq!(stream.next().await, Some(Ok(0)));
//! assert_eq!(stream.next().await, Some(Ok(7)));
//! # });
//! ```

use std::{
  collections::VecDeque,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll, Waker},
};

use futures::stream::Stream;
use parking_lot::Mutex;

use crate::{observable::Observable, observer::Observer, subscription::Subscription};

/// Internal state shared between the Observable subscription and the Stream
/// consumer.
#[doc(hidden)]
pub struct IntoStreamState<T, E> {
  /// Buffer for items and errors waiting to be polled.
  queue: VecDeque<Result<T, E>>,
  /// The waker for the async task waiting on the stream.
  waker: Option<Waker>,
  /// Set once the upstream observable has completed or errored.
  is_closed: bool,
}

impl<T, E> Default for IntoStreamState<T, E> {
  fn default() -> Self { Self { queue: VecDeque::new(), waker: None, is_closed: false } }
}

/// A `Stream` that yields values emitted by an `Observable`.
///
/// - `Ok(T)`: Emitted for each `next` value from the observable.
/// - `Err(E)`: Emitted when the observable signals an `error`.
/// - `None`: Emitted (end of stream) when the observable completes (for
///   reactive objects and lists: when they are disposed) or after an error.
///
/// Dropping the stream unsubscribes from the source.
pub struct IntoStream<T, E, U: Subscription> {
  state: Arc<Mutex<IntoStreamState<T, E>>>,
  unsub: Option<U>,
}

impl<T, E, U: Subscription> IntoStream<T, E, U> {
  pub fn new<S>(observable: S) -> Self
  where
    S: Observable<Item = T, Err = E, Unsub = U>,
    T: Send + 'static,
    E: Send + 'static,
  {
    let state = Arc::new(Mutex::new(IntoStreamState::default()));
    let unsub = observable.actual_subscribe(IntoStreamObserver { state: state.clone() });
    IntoStream { state, unsub: Some(unsub) }
  }
}

impl<T, E, U: Subscription> Unpin for IntoStream<T, E, U> {}

impl<T, E, U: Subscription> Stream for IntoStream<T, E, U> {
  type Item = Result<T, E>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let mut state = self.state.lock();

    if let Some(item) = state.queue.pop_front() {
      return Poll::Ready(Some(item));
    }

    if state.is_closed {
      return Poll::Ready(None);
    }

    state.waker = Some(cx.waker().clone());
    Poll::Pending
  }
}

impl<T, E, U: Subscription> Drop for IntoStream<T, E, U> {
  fn drop(&mut self) {
    if let Some(unsub) = self.unsub.take() {
      unsub.unsubscribe();
    }
  }
}

/// An `Observer` that forwards emissions into the shared queue.
#[doc(hidden)]
pub struct IntoStreamObserver<T, E> {
  state: Arc<Mutex<IntoStreamState<T, E>>>,
}

impl<T, E> IntoStreamObserver<T, E> {
  fn push(&self, item: Option<Result<T, E>>) {
    let waker = {
      let mut state = self.state.lock();
      match item {
        Some(item) => state.queue.push_back(item),
        None => state.is_closed = true,
      }
      state.waker.take()
    };
    if let Some(waker) = waker {
      waker.wake();
    }
  }
}

impl<T, E> Observer<T, E> for IntoStreamObserver<T, E> {
  fn next(&mut self, value: T) { self.push(Some(Ok(value))); }

  fn error(self, err: E) {
    self.push(Some(Err(err)));
    self.push(None);
  }

  fn complete(self) { self.push(None); }

  fn is_closed(&self) -> bool { self.state.lock().is_closed }
}

#[cfg(test)]
mod tests {
  use std::convert::Infallible;

  use futures::StreamExt;

  use crate::prelude::*;

  #[tokio::test]
  async fn receives_all_values_until_complete() {
    let subject = Subject::<i32, Infallible>::new();
    let mut stream = subject.clone().into_stream();

    subject.clone().next(1);
    subject.clone().next(2);
    subject.clone().complete();

    let mut values = vec![];
    while let Some(Ok(x)) = stream.next().await {
      values.push(x);
    }
    assert_eq!(values, vec![1, 2]);
  }

  #[tokio::test]
  async fn drop_unsubscribes() {
    let subject = Subject::<i32, Infallible>::new();
    let stream = subject.clone().into_stream();
    assert_eq!(subject.subscriber_count(), 1);
    drop(stream);
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn error_ends_stream() {
    let subject = Subject::<i32, &'static str>::new();
    let mut stream = subject.clone().into_stream();
    subject.clone().error("boom");

    futures::executor::block_on(async {
      assert_eq!(stream.next().await, Some(Err("boom")));
      assert_eq!(stream.next().await, None);
    });
  }
}
