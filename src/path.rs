//! Property-path observation.
//!
//! A path `root.a.b.c` follows object-valued links (`a`, `b`) down to a
//! terminal property (`c`) and produces one stream of terminal values that
//! stays correct while any link changes identity, including to and from
//! `None`.
//!
//! Each position in the path is a level holding at most one live
//! subscription. When a link delivers a new object, every deeper level is torn
//! down before the next level subscribes to the new object; when it delivers
//! `None`, the deeper levels are torn down and the terminal default is
//! emitted. Terminal values pass a single distinct-until-changed filter at
//! the output, so unrelated link changes do not repeat an unchanged value.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxstate::prelude::*;
//!
//! static ORDER: ObjectType = ObjectType::new("Order");
//! static CUSTOMER: ObjectType = ObjectType::new("Customer");
//! static BUYER: Property<Option<ReactiveObject>> = Property::new(&ORDER, "buyer");
//! static NAME: Property<String> = Property::new(&CUSTOMER, "name");
//!
//! let order = ReactiveObject::new(&ORDER);
//! let names = Arc::new(Mutex::new(vec![]));
//! let c_names = names.clone();
//! order
//!   .observe_path(PropertyPath::link(&BUYER).to(&NAME))
//!   .unwrap()
//!   .subscribe_err(move |name| c_names.lock().unwrap().push(name), |_| {});
//!
//! let customer = ReactiveObject::new(&CUSTOMER);
//! customer.set(&NAME, "Grace".to_owned()).unwrap();
//! order.set(&BUYER, Some(customer.clone())).unwrap();
//! order.set(&BUYER, None).unwrap();
//!
//! assert_eq!(*names.lock().unwrap(), vec!["", "Grace", ""]);
//! ```

use std::{
  collections::VecDeque,
  convert::Infallible,
  fmt,
  marker::PhantomData,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
  error::{Error, Result},
  object::{PropertyValue, ReactiveObject},
  observable::Observable,
  observer::Observer,
  ops::distinct_until_changed::DistinctUntilChangedObserver,
  property::Property,
  subscription::{BoxedSubscription, IntoBoxedSubscription, Subscription},
};

/// An object-valued property, one hop of a path.
pub type Link = &'static Property<Option<ReactiveObject>>;

/// The links of a path under construction. `T` is the type of the terminal
/// property the path will end at.
pub struct PathBuilder<T> {
  links: Vec<Link>,
  terminal: PhantomData<fn() -> T>,
}

impl<T> PathBuilder<T> {
  /// Follow one more link.
  pub fn link(mut self, link: Link) -> Self {
    self.links.push(link);
    self
  }

  /// End the path at `terminal`.
  pub fn to(self, terminal: &'static Property<T>) -> PropertyPath<T> {
    PropertyPath { links: self.links.into(), terminal }
  }
}

impl<T> Clone for PathBuilder<T> {
  fn clone(&self) -> Self { Self { links: self.links.clone(), terminal: PhantomData } }
}

/// A chain of links ending at a terminal property.
pub struct PropertyPath<T: 'static> {
  links: Arc<[Link]>,
  terminal: &'static Property<T>,
}

impl<T> PropertyPath<T> {
  /// The path consisting of `terminal` alone.
  pub fn direct(terminal: &'static Property<T>) -> Self { Self { links: Arc::new([]), terminal } }

  /// Start a path at its first link.
  pub fn link(link: Link) -> PathBuilder<T> { PathBuilder { links: vec![link], terminal: PhantomData } }

  /// Number of properties in the path, terminal included.
  #[inline]
  pub fn len(&self) -> usize { self.links.len() + 1 }

  /// Paths always contain their terminal property.
  #[inline]
  pub fn is_empty(&self) -> bool { false }
}

impl<T> Clone for PropertyPath<T> {
  fn clone(&self) -> Self { Self { links: self.links.clone(), terminal: self.terminal } }
}

impl<T> fmt::Debug for PropertyPath<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for link in self.links.iter() {
      write!(f, "{link:?}.")?;
    }
    write!(f, "{:?}", self.terminal)
  }
}

impl ReactiveObject {
  /// Observe the terminal value of `path` starting at this object.
  ///
  /// Fails right away if the first property of the path does not belong to
  /// this object. The same failure at an intermediate object can only be
  /// found while observing; it is delivered as the stream's error.
  pub fn observe_path<T: PropertyValue>(&self, path: PropertyPath<T>) -> Result<PathObservable<T>> {
    let first = path
      .links
      .first()
      .map_or_else(|| path.terminal.key(), |link| link.key());
    if self.is_disposed() {
      return Err(Error::Disposed);
    }
    if !first.belongs_to(self.object_type()) {
      return Err(Error::PropertyMismatch {
        property: first.to_string(),
        object: self.object_type().name(),
      });
    }
    Ok(PathObservable { root: self.clone(), path })
  }

  /// Combine the terminal values of two paths with `f`, recomputed whenever
  /// either path emits once both have emitted.
  pub fn when_any2<A, B, R, F>(
    &self, a: PropertyPath<A>, b: PropertyPath<B>, f: F,
  ) -> Result<impl Observable<Item = R, Err = Error>>
  where
    A: PropertyValue,
    B: PropertyValue,
    F: FnMut(A, B) -> R + Send + 'static,
  {
    Ok(self.observe_path(a)?.combine_latest(self.observe_path(b)?, f))
  }

  /// Three-path version of [`ReactiveObject::when_any2`].
  pub fn when_any3<A, B, C, R, F>(
    &self, a: PropertyPath<A>, b: PropertyPath<B>, c: PropertyPath<C>, mut f: F,
  ) -> Result<impl Observable<Item = R, Err = Error>>
  where
    A: PropertyValue,
    B: PropertyValue,
    C: PropertyValue,
    F: FnMut(A, B, C) -> R + Send + 'static,
  {
    let ab = self
      .observe_path(a)?
      .combine_latest(self.observe_path(b)?, |a, b| (a, b));
    Ok(ab.combine_latest(self.observe_path(c)?, move |(a, b), c| f(a, b, c)))
  }
}

/// The stream of a path's terminal values.
///
/// Every subscription walks the path on its own; the first value arrives
/// synchronously during `subscribe`.
pub struct PathObservable<T: 'static> {
  root: ReactiveObject,
  path: PropertyPath<T>,
}

impl<T> Clone for PathObservable<T> {
  fn clone(&self) -> Self { Self { root: self.root.clone(), path: self.path.clone() } }
}

impl<T: PropertyValue> Observable for PathObservable<T> {
  type Item = T;
  type Err = Error;
  type Unsub = PathSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<T, Error> + Send + 'static,
  {
    debug!(path = ?self.path, "path subscribed");
    let levels = (0..self.path.len())
      .map(|_| Level { epoch: 0, subscription: None })
      .collect();
    let state = Arc::new(PathState {
      path: self.path,
      levels: Mutex::new(levels),
      sink: Mutex::new(Sink {
        observer: Some(DistinctUntilChangedObserver::new(observer)),
        queued: VecDeque::new(),
        delivering: false,
        end: None,
      }),
      closed: AtomicBool::new(false),
    });
    state.bind(0, self.root);
    PathSubscription { state }
  }
}

/// Handle of a path subscription. Unsubscribing releases every level.
pub struct PathSubscription {
  state: Arc<dyn PathControl + Send + Sync>,
}

impl Subscription for PathSubscription {
  fn unsubscribe(self) { self.state.close(); }

  fn is_closed(&self) -> bool { self.state.is_closed() }
}

trait PathControl {
  fn close(&self);

  fn is_closed(&self) -> bool;
}

struct Level {
  /// Bumped on every teardown; deliveries carrying an older epoch are stale.
  epoch: u64,
  subscription: Option<BoxedSubscription>,
}

enum End {
  Error(Error),
  Complete,
}

struct Sink<T, O> {
  observer: Option<DistinctUntilChangedObserver<O, T>>,
  queued: VecDeque<T>,
  delivering: bool,
  end: Option<End>,
}

struct PathState<T: 'static, O> {
  path: PropertyPath<T>,
  levels: Mutex<Vec<Level>>,
  sink: Mutex<Sink<T, O>>,
  closed: AtomicBool,
}

impl<T, O> PathState<T, O>
where
  T: PropertyValue,
  O: Observer<T, Error> + Send + 'static,
{
  fn is_current(&self, level: usize, epoch: u64) -> bool {
    !self.closed.load(Ordering::Acquire) && self.levels.lock()[level].epoch == epoch
  }

  /// Release the subscriptions of `from` and every deeper level. Returns the
  /// new epoch of `from`.
  fn teardown_from(&self, from: usize) -> u64 {
    let (epoch, released) = {
      let mut levels = self.levels.lock();
      let released: Vec<_> = levels[from..]
        .iter_mut()
        .filter_map(|level| {
          level.epoch += 1;
          level.subscription.take()
        })
        .collect();
      (levels[from].epoch, released)
    };
    for subscription in released {
      subscription.unsubscribe();
    }
    epoch
  }

  /// Subscribe level `level` to `object`, replacing whatever that level and
  /// the deeper ones observed before.
  fn bind(self: &Arc<Self>, level: usize, object: ReactiveObject) {
    let epoch = self.teardown_from(level);
    if self.closed.load(Ordering::Acquire) {
      return;
    }

    let subscription = match self.path.links.get(level) {
      Some(&link) => object.observe(link).map(|stream| {
        stream
          .subscribe_with(LinkObserver { state: self.clone(), level, epoch })
          .into_boxed()
      }),
      None => object.observe(self.path.terminal).map(|stream| {
        stream
          .subscribe_with(TerminalObserver { state: self.clone(), level, epoch })
          .into_boxed()
      }),
    };

    match subscription {
      Ok(subscription) => {
        let mut levels = self.levels.lock();
        if levels[level].epoch == epoch && !self.closed.load(Ordering::Acquire) {
          levels[level].subscription = Some(subscription);
        } else {
          drop(levels);
          subscription.unsubscribe();
        }
      }
      Err(err) => {
        warn!(path = ?self.path, level, error = %err, "property path broken");
        self.fail(err);
      }
    }
  }

  fn on_link(self: &Arc<Self>, level: usize, epoch: u64, object: Option<ReactiveObject>) {
    if !self.is_current(level, epoch) {
      return;
    }
    match object {
      Some(object) => self.bind(level + 1, object),
      None => {
        self.teardown_from(level + 1);
        self.deliver(T::default());
      }
    }
  }

  fn on_value(&self, level: usize, epoch: u64, value: T) {
    if self.is_current(level, epoch) {
      self.deliver(value);
    }
  }

  /// Forward `value` downstream. A value produced while the downstream
  /// observer is running is queued and forwarded when it returns.
  fn deliver(&self, value: T) {
    let mut observer = {
      let mut sink = self.sink.lock();
      if sink.delivering {
        sink.queued.push_back(value);
        return;
      }
      let Some(observer) = sink.observer.take() else { return };
      sink.delivering = true;
      observer
    };

    let mut next = Some(value);
    loop {
      if let Some(value) = next.take() {
        Observer::<T, Error>::next(&mut observer, value);
      }
      let mut sink = self.sink.lock();
      if let Some(value) = sink.queued.pop_front() {
        next = Some(value);
        continue;
      }
      sink.delivering = false;
      let end = sink.end.take();
      if end.is_none() && !self.closed.load(Ordering::Acquire) {
        sink.observer = Some(observer);
        return;
      }
      drop(sink);
      match end {
        Some(End::Error(err)) => Observer::<T, Error>::error(observer, err),
        Some(End::Complete) => Observer::<T, Error>::complete(observer),
        None => drop(observer),
      }
      return;
    }
  }

  fn finish(&self, end: End) {
    self.closed.store(true, Ordering::Release);
    self.teardown_from(0);
    let observer = {
      let mut sink = self.sink.lock();
      if sink.delivering {
        sink.end = Some(end);
        return;
      }
      sink.queued.clear();
      sink.observer.take()
    };
    if let Some(observer) = observer {
      match end {
        End::Error(err) => Observer::<T, Error>::error(observer, err),
        End::Complete => Observer::<T, Error>::complete(observer),
      }
    }
  }

  fn fail(&self, err: Error) { self.finish(End::Error(err)); }
}

impl<T, O> PathControl for PathState<T, O>
where
  T: PropertyValue,
  O: Observer<T, Error> + Send + 'static,
{
  fn close(&self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    debug!(path = ?self.path, "path unsubscribed");
    self.teardown_from(0);
    let observer = {
      let mut sink = self.sink.lock();
      sink.queued.clear();
      sink.observer.take()
    };
    drop(observer);
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

/// Observes one link of the path.
struct LinkObserver<T: 'static, O> {
  state: Arc<PathState<T, O>>,
  level: usize,
  epoch: u64,
}

impl<T, O> Observer<Option<ReactiveObject>, Infallible> for LinkObserver<T, O>
where
  T: PropertyValue,
  O: Observer<T, Error> + Send + 'static,
{
  fn next(&mut self, object: Option<ReactiveObject>) { self.state.on_link(self.level, self.epoch, object); }

  fn error(self, err: Infallible) { match err {} }

  /// The observed object was disposed. Losing the root ends the path.
  fn complete(self) {
    if self.level == 0 && self.state.is_current(self.level, self.epoch) {
      self.state.finish(End::Complete);
    }
  }

  fn is_closed(&self) -> bool { !self.state.is_current(self.level, self.epoch) }
}

/// Observes the terminal property.
struct TerminalObserver<T: 'static, O> {
  state: Arc<PathState<T, O>>,
  level: usize,
  epoch: u64,
}

impl<T, O> Observer<T, Infallible> for TerminalObserver<T, O>
where
  T: PropertyValue,
  O: Observer<T, Error> + Send + 'static,
{
  fn next(&mut self, value: T) { self.state.on_value(self.level, self.epoch, value); }

  fn error(self, err: Infallible) { match err {} }

  fn complete(self) {
    if self.level == 0 && self.state.is_current(self.level, self.epoch) {
      self.state.finish(End::Complete);
    }
  }

  fn is_closed(&self) -> bool { !self.state.is_current(self.level, self.epoch) }
}
