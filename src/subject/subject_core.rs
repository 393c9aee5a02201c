use std::{collections::VecDeque, sync::Arc};

use parking_lot::{Mutex, ReentrantMutex};

use super::{subject_subscription::SubjectSubscription, subscribers::Subscribers};
use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subscription::DynamicSubscriptions,
};

const REENTRANT_EMISSION: &str = "re-entrant Subject emissions are not supported here: an observer \
                                  fed the subject it is subscribed to";

pub(crate) struct SubjectShared<Ob> {
  /// Serializes emissions across threads. Re-entrant, so a callback running
  /// on the emitting thread can still subscribe, unsubscribe or complete.
  emit: ReentrantMutex<()>,
  pub(crate) subscribers: Mutex<Subscribers<Ob>>,
}

/// The observer bookkeeping shared by [`Subject`] and
/// [`MutRefSubject`](super::MutRefSubject), independent of how values are
/// handed to each observer.
pub(crate) struct SubjectCore<Ob> {
  pub(crate) shared: Arc<SubjectShared<Ob>>,
}

impl<Ob> Clone for SubjectCore<Ob> {
  fn clone(&self) -> Self { Self { shared: self.shared.clone() } }
}

impl<Ob> Default for SubjectCore<Ob> {
  fn default() -> Self {
    Self {
      shared: Arc::new(SubjectShared {
        emit: ReentrantMutex::new(()),
        subscribers: Mutex::new(Subscribers::default()),
      }),
    }
  }
}

/// Puts the observers back when an emission ends, even by a panicking
/// observer.
struct EmitScope<'a, Ob> {
  subscribers: &'a Mutex<Subscribers<Ob>>,
  taken: DynamicSubscriptions<Ob>,
}

impl<Ob> Drop for EmitScope<'_, Ob> {
  fn drop(&mut self) {
    let taken = std::mem::take(&mut self.taken);
    let removed = self.subscribers.lock().end_emit(taken);
    drop(removed);
  }
}

impl<Ob> SubjectCore<Ob> {
  /// Registers `observer`. Hands it back if the subject already completed.
  pub(crate) fn add(&self, observer: Ob) -> Result<SubjectSubscription<Ob>, Ob> {
    let id = self.shared.subscribers.lock().add(observer)?;
    Ok(SubjectSubscription::new(self.shared.clone(), id))
  }

  /// Calls `deliver` for every registered observer in subscription order,
  /// without holding the subscriber lock, then applies a completion requested
  /// meanwhile through `complete`.
  pub(crate) fn emit(&self, mut deliver: impl FnMut(&mut Ob), complete: impl FnMut(Ob)) {
    let _emit = self.shared.emit.lock();
    let taken = {
      let mut subscribers = self.shared.subscribers.lock();
      if subscribers.is_emitting() {
        drop(subscribers);
        panic!("{REENTRANT_EMISSION}");
      }
      if subscribers.is_completed() {
        return;
      }
      subscribers.begin_emit()
    };

    {
      let mut scope = EmitScope { subscribers: &self.shared.subscribers, taken };
      for (id, observer) in scope.taken.iter_mut() {
        if scope.subscribers.lock().is_removed(id) {
          continue;
        }
        deliver(observer);
      }
    }

    let deferred = self.shared.subscribers.lock().take_deferred_complete();
    if let Some(observers) = deferred {
      observers.into_iter().for_each(complete);
    }
  }

  pub(crate) fn complete(&self, complete: impl FnMut(Ob)) {
    let _emit = self.shared.emit.lock();
    let observers = self.shared.subscribers.lock().request_complete();
    if let Some(observers) = observers {
      observers.into_iter().for_each(complete);
    }
  }

  pub(crate) fn error(&self, error: impl FnMut(Ob)) {
    let _emit = self.shared.emit.lock();
    let observers = {
      let mut subscribers = self.shared.subscribers.lock();
      if subscribers.is_emitting() {
        drop(subscribers);
        panic!("{REENTRANT_EMISSION}");
      }
      subscribers.take_for_error()
    };
    observers.into_iter().for_each(error);
  }

  /// Runs `f` while no other thread can emit through this subject.
  pub(crate) fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
    let _emit = self.shared.emit.lock();
    f()
  }

  #[inline]
  pub(crate) fn is_emitting(&self) -> bool { self.shared.subscribers.lock().is_emitting() }

  #[inline]
  pub(crate) fn is_completed(&self) -> bool { self.shared.subscribers.lock().is_completed() }

  #[inline]
  pub(crate) fn subscriber_count(&self) -> usize { self.shared.subscribers.lock().len() }
}

/// Subject: A hot observable that multicasts values to many observers.
///
/// The `Subject` acts as both an `Observer` and an `Observable`. Every value
/// it receives is cloned to all current subscribers, in subscription order,
/// synchronously on the calling thread.
///
/// # Re-Entrancy Policy
///
/// Observer callbacks run without any lock held, so a callback may:
///
/// - subscribe to the subject: the new observer is not part of the emission
///   in progress and receives values from the next one on;
/// - unsubscribe any observer: it is skipped for the rest of the emission;
/// - complete the subject: completion is applied once the emission ends;
/// - call `next` on the subject: the value is queued and emitted to every
///   observer once the emission in progress ends, so all observers see values
///   in the same order.
///
/// Calling `error` from one of the subject's own callbacks panics.
///
/// # Example
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
/// let results = Arc::new(Mutex::new(vec![]));
/// let c_results = results.clone();
///
/// subject.clone().subscribe(move |v| {
///   c_results.lock().unwrap().push(v);
/// });
///
/// subject.clone().next(1);
/// subject.clone().next(2);
/// assert_eq!(*results.lock().unwrap(), vec![1, 2]);
/// ```
pub struct Subject<Item, Err> {
  pub(crate) core: SubjectCore<BoxedObserver<Item, Err>>,
  queued: Arc<Mutex<VecDeque<Item>>>,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone(), queued: self.queued.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self { core: SubjectCore::default(), queued: Arc::default() } }
}

impl<Item, Err> Subject<Item, Err> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Number of observers that will receive the next value.
  #[inline]
  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.subscriber_count() == 0 }

  /// Whether both handles refer to the same subject.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.core.shared, &other.core.shared) }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let core = &self.core;
    let queued = &self.queued;
    core.exclusive(|| {
      if core.is_emitting() {
        queued.lock().push_back(value);
        return;
      }
      let mut value = Some(value);
      while let Some(v) = value.take().or_else(|| queued.lock().pop_front()) {
        core.emit(|observer| observer.next(v.clone()), Observer::<Item, Err>::complete);
      }
    });
  }

  fn error(self, err: Err) { self.core.error(|observer| observer.error(err.clone())); }

  fn complete(self) { self.core.complete(Observer::<Item, Err>::complete); }

  fn is_closed(&self) -> bool { self.core.is_completed() }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: 'static,
  Err: 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubjectSubscription<BoxedObserver<Item, Err>>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let boxed: BoxedObserver<Item, Err> = Box::new(observer);
    match self.core.add(boxed) {
      Ok(subscription) => subscription,
      Err(observer) => {
        observer.complete();
        SubjectSubscription::closed(self.core.shared)
      }
    }
  }
}
