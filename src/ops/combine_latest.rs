//! CombineLatest operator
//!
//! Combines the latest value of two sources with a binary function. Nothing
//! is emitted until both sides have delivered at least one value; afterwards
//! every emission of either side recomputes the output. Multi-path
//! observation (`when_any2`, `when_any3`) is built on it.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::{observable::Observable, observer::Observer, subscription::TupleSubscription};

#[derive(Clone)]
pub struct CombineLatest<A, B, F> {
  pub(crate) a: A,
  pub(crate) b: B,
  pub(crate) binary_op: F,
}

impl<A, B, F, Out> Observable for CombineLatest<A, B, F>
where
  A: Observable,
  B: Observable<Err = A::Err>,
  A::Item: Clone + Send + 'static,
  B::Item: Clone + Send + 'static,
  A::Err: 'static,
  F: FnMut(A::Item, B::Item) -> Out + Send + 'static,
{
  type Item = Out;
  type Err = A::Err;
  type Unsub = TupleSubscription<A::Unsub, B::Unsub>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Out, A::Err> + Send + 'static,
  {
    let state = Arc::new(Mutex::new(CombineState {
      observer: Some(observer),
      a: None,
      b: None,
      binary_op: self.binary_op,
      completed_one: false,
    }));
    let unsub_a = self.a.actual_subscribe(LeftObserver(state.clone()));
    let unsub_b = self.b.actual_subscribe(RightObserver(state));
    TupleSubscription::new(unsub_a, unsub_b)
  }
}

struct CombineState<O, A, B, F> {
  observer: Option<O>,
  a: Option<A>,
  b: Option<B>,
  binary_op: F,
  completed_one: bool,
}

type SharedState<O, A, B, F> = Arc<Mutex<CombineState<O, A, B, F>>>;

fn lock_state<O, A, B, F>(state: &SharedState<O, A, B, F>) -> MutexGuard<'_, CombineState<O, A, B, F>> {
  state.try_lock().unwrap_or_else(|| {
    panic!("re-entrant emission into combine_latest: a downstream observer fed one of its sources")
  })
}

impl<O, A, B, F> CombineState<O, A, B, F> {
  fn emit_latest<Out, Err>(&mut self)
  where
    O: Observer<Out, Err>,
    A: Clone,
    B: Clone,
    F: FnMut(A, B) -> Out,
  {
    if let (Some(a), Some(b)) = (self.a.clone(), self.b.clone()) {
      let value = (self.binary_op)(a, b);
      if let Some(observer) = self.observer.as_mut() {
        observer.next(value);
      }
    }
  }

  fn error<Out, Err>(&mut self, err: Err)
  where
    O: Observer<Out, Err>,
  {
    if let Some(observer) = self.observer.take() {
      observer.error(err);
    }
  }

  fn complete<Out, Err>(&mut self)
  where
    O: Observer<Out, Err>,
  {
    if !self.completed_one {
      self.completed_one = true;
    } else if let Some(observer) = self.observer.take() {
      observer.complete();
    }
  }
}

struct LeftObserver<O, A, B, F>(SharedState<O, A, B, F>);

struct RightObserver<O, A, B, F>(SharedState<O, A, B, F>);

impl<O, A, B, F, Out, Err> Observer<A, Err> for LeftObserver<O, A, B, F>
where
  O: Observer<Out, Err>,
  A: Clone,
  B: Clone,
  F: FnMut(A, B) -> Out,
{
  fn next(&mut self, value: A) {
    let mut state = lock_state(&self.0);
    state.a = Some(value);
    state.emit_latest::<Out, Err>();
  }

  fn error(self, err: Err) { lock_state(&self.0).error::<Out, Err>(err) }

  fn complete(self) { lock_state(&self.0).complete::<Out, Err>() }

  fn is_closed(&self) -> bool {
    self
      .0
      .try_lock()
      .is_some_and(|state| state.observer.is_none())
  }
}

impl<O, A, B, F, Out, Err> Observer<B, Err> for RightObserver<O, A, B, F>
where
  O: Observer<Out, Err>,
  A: Clone,
  B: Clone,
  F: FnMut(A, B) -> Out,
{
  fn next(&mut self, value: B) {
    let mut state = lock_state(&self.0);
    state.b = Some(value);
    state.emit_latest::<Out, Err>();
  }

  fn error(self, err: Err) { lock_state(&self.0).error::<Out, Err>(err) }

  fn complete(self) { lock_state(&self.0).complete::<Out, Err>() }

  fn is_closed(&self) -> bool {
    self
      .0
      .try_lock()
      .is_some_and(|state| state.observer.is_none())
  }
}
