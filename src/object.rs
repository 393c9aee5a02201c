//! Reactive objects: property storage with change notification.
//!
//! Every write goes through [`ReactiveObject::set`], which
//!
//! 1. ignores values equal to the current one,
//! 2. lets "changing" subscribers rewrite the pending value,
//! 3. commits it to the [`PropertyStore`],
//! 4. publishes the committed change on the "changed" stream, on the
//!    property's replay stream and to the notification hook.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxstate::prelude::*;
//!
//! static PERSON: ObjectType = ObjectType::new("Person");
//! static NAME: Property<String> = Property::new(&PERSON, "name");
//!
//! let person = ReactiveObject::new(&PERSON);
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! person
//!   .observe(&NAME)
//!   .unwrap()
//!   .subscribe(move |name| c_seen.lock().unwrap().push(name));
//!
//! person.set(&NAME, "Ada".to_owned()).unwrap();
//! person.set(&NAME, "Ada".to_owned()).unwrap();
//! assert_eq!(*seen.lock().unwrap(), vec!["".to_owned(), "Ada".to_owned()]);
//! ```

mod records;

use std::{
  any::Any,
  collections::HashMap,
  convert::Infallible,
  fmt,
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
  },
};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
pub use records::{PropertyChange, PropertyChanged, PropertyChanging};
use tracing::{debug, trace};

use crate::{
  error::{Error, Result},
  observable::Observable,
  observer::{BoxedObserverMutRef, Observer},
  property::{ObjectType, Property, PropertyKey},
  store::{MemoryStore, PropertyStore, Value},
  stream::{EventStream, ValueStream},
  subject::{BehaviorSubject, MutRefSubject, Subject, SubjectSubscription},
  subscription::{BoxedSubscription, Subscription},
};

/// Bounds every property value satisfies.
pub trait PropertyValue: Clone + PartialEq + Default + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Default + Send + Sync + 'static> PropertyValue for T {}

/// The replay stream of one property.
pub type PropertyStream<T> = ValueStream<T>;

type NotifyHook = Arc<dyn Fn(&PropertyChanged) + Send + Sync>;

/// A per-property replay subject with its value type erased, so subjects of
/// different properties share one cache.
trait PropertyCell: Send {
  fn as_any(&self) -> &dyn Any;

  fn complete(self: Box<Self>);
}

impl<T: PropertyValue> PropertyCell for BehaviorSubject<T, Infallible> {
  fn as_any(&self) -> &dyn Any { self }

  fn complete(self: Box<Self>) { Observer::complete(*self) }
}

struct ObjectInner {
  ty: &'static ObjectType,
  store: Mutex<Box<dyn PropertyStore>>,
  changing: OnceCell<MutRefSubject<PropertyChanging>>,
  changed: OnceCell<Subject<PropertyChanged, Infallible>>,
  properties: Mutex<HashMap<PropertyKey, Box<dyn PropertyCell>>>,
  disposables: Mutex<Vec<BoxedSubscription>>,
  hook: Mutex<Option<NotifyHook>>,
  suppressed: AtomicUsize,
  disposed: AtomicBool,
}

/// A shared handle to an object whose properties can be observed.
///
/// Cloning the handle does not copy the object; two handles are equal when
/// they refer to the same object. That identity is what property paths use to
/// decide whether a link changed.
#[derive(Clone)]
pub struct ReactiveObject {
  inner: Arc<ObjectInner>,
}

impl ReactiveObject {
  /// Create an object of type `ty` backed by a [`MemoryStore`].
  pub fn new(ty: &'static ObjectType) -> Self { Self::with_store(ty, MemoryStore::new()) }

  /// Create an object of type `ty` backed by `store`.
  pub fn with_store(ty: &'static ObjectType, store: impl PropertyStore + 'static) -> Self {
    Self {
      inner: Arc::new(ObjectInner {
        ty,
        store: Mutex::new(Box::new(store)),
        changing: OnceCell::new(),
        changed: OnceCell::new(),
        properties: Mutex::new(HashMap::new()),
        disposables: Mutex::new(Vec::new()),
        hook: Mutex::new(None),
        suppressed: AtomicUsize::new(0),
        disposed: AtomicBool::new(false),
      }),
    }
  }

  #[inline]
  pub fn object_type(&self) -> &'static ObjectType { self.inner.ty }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.inner.disposed.load(Ordering::Acquire) }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }

  fn mismatch(&self, key: PropertyKey) -> Error {
    Error::PropertyMismatch { property: key.to_string(), object: self.inner.ty.name() }
  }

  fn check(&self, key: PropertyKey) -> Result<()> {
    if self.is_disposed() {
      return Err(Error::Disposed);
    }
    if !key.belongs_to(self.inner.ty) {
      return Err(self.mismatch(key));
    }
    Ok(())
  }

  fn read<T: PropertyValue>(&self, key: PropertyKey) -> Result<(T, Option<Value>)> {
    let stored = self.inner.store.lock().retrieve(&key);
    let value = match &stored {
      Some(stored) => stored
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| self.mismatch(key))?,
      None => T::default(),
    };
    Ok((value, stored))
  }

  /// The current value of `property`, or its default if it was never set.
  pub fn get<T: PropertyValue>(&self, property: &Property<T>) -> Result<T> {
    self.check(property.key())?;
    self.read(property.key()).map(|(value, _)| value)
  }

  /// Set `property` to `value`.
  ///
  /// Setting a value equal to the current one does nothing. Otherwise the
  /// "changing" subscribers may rewrite the value, the result is committed and
  /// then published.
  pub fn set<T: PropertyValue>(&self, property: &Property<T>, value: T) -> Result<()> {
    let key = property.key();
    self.check(key)?;
    let (old, stored) = self.read::<T>(key)?;
    if old == value {
      return Ok(());
    }

    let notify = self.inner.suppressed.load(Ordering::Acquire) == 0;
    let old = stored.unwrap_or_else(|| Arc::new(old) as Value);
    let mut pending = PropertyChanging { property: key, old, new: Arc::new(value) };
    if notify {
      if let Some(changing) = self.inner.changing.get() {
        changing.next(&mut pending);
      }
    }
    if self.is_disposed() {
      return Err(Error::Disposed);
    }

    let committed = pending
      .new
      .downcast_ref::<T>()
      .cloned()
      .ok_or_else(|| self.mismatch(key))?;
    self
      .inner
      .store
      .lock()
      .store(key, pending.new.clone());
    trace!(object = self.inner.ty.name(), property = %key, "property committed");

    // The replay cell goes first: a "changed" subscriber that sets this
    // property again must leave the cell on its own, newer value.
    let cell = self
      .inner
      .properties
      .lock()
      .get(&key)
      .and_then(|cell| cell.as_any().downcast_ref::<BehaviorSubject<T, Infallible>>())
      .cloned();
    if let Some(mut cell) = cell {
      cell.next(committed);
    }
    let change = PropertyChanged { property: key, old: pending.old, new: pending.new };
    if notify {
      if let Some(changed) = self.inner.changed.get() {
        changed.clone().next(change.clone());
      }
    }
    if notify {
      let hook = self.inner.hook.lock().clone();
      if let Some(hook) = hook {
        hook(&change);
      }
    }
    Ok(())
  }

  /// The replay stream of `property`: subscribers immediately receive the
  /// current value, then every committed one.
  ///
  /// The stream is created on first use and shared by later calls.
  pub fn observe<T: PropertyValue>(&self, property: &Property<T>) -> Result<PropertyStream<T>> {
    let key = property.key();
    self.check(key)?;
    let mut properties = self.inner.properties.lock();
    if let Some(cell) = properties.get(&key) {
      return cell
        .as_any()
        .downcast_ref::<BehaviorSubject<T, Infallible>>()
        .cloned()
        .map(ValueStream::new)
        .ok_or_else(|| self.mismatch(key));
    }

    let (current, _) = self.read::<T>(key)?;
    let subject = BehaviorSubject::new(current);
    properties.insert(key, Box::new(subject.clone()));
    debug!(object = self.inner.ty.name(), property = %key, "property stream created");
    Ok(ValueStream::new(subject))
  }

  /// Pending changes of every property, before they are committed.
  pub fn changing(&self) -> ChangingStream {
    let subject = self.inner.changing.get_or_init(MutRefSubject::new);
    ChangingStream { subject: subject.clone() }
  }

  /// Committed changes of every property.
  pub fn changed(&self) -> EventStream<PropertyChanged> {
    let subject = self.inner.changed.get_or_init(Subject::new);
    EventStream::new(subject.clone())
  }

  /// Committed changes of one property, typed.
  pub fn changed_of<T: PropertyValue>(
    &self, property: &'static Property<T>,
  ) -> Result<impl Observable<Item = PropertyChange<T>, Err = Infallible>> {
    self.check(property.key())?;
    Ok(
      self
        .changed()
        .filter_map(move |change| change.typed(property)),
    )
  }

  /// Install a callback run after every published change, replacing any
  /// previous one.
  pub fn set_notify_hook(&self, hook: impl Fn(&PropertyChanged) + Send + Sync + 'static) {
    *self.inner.hook.lock() = Some(Arc::new(hook));
  }

  pub fn clear_notify_hook(&self) { *self.inner.hook.lock() = None; }

  /// Mute "changing", "changed" and the hook until the returned guard is
  /// dropped. Values are still committed, and replay streams still follow
  /// them.
  pub fn suppress_notifications(&self) -> NotificationSuppression {
    self.inner.suppressed.fetch_add(1, Ordering::AcqRel);
    NotificationSuppression { object: self.clone() }
  }

  #[inline]
  pub fn notifications_suppressed(&self) -> bool { self.inner.suppressed.load(Ordering::Acquire) > 0 }

  /// Tie `disposable` to this object's lifetime. It is released when the
  /// object is disposed, or right away if it already is.
  pub fn register(&self, disposable: impl Subscription + Send + 'static) {
    let disposable = BoxedSubscription::new(disposable);
    {
      let mut disposables = self.inner.disposables.lock();
      if !self.is_disposed() {
        disposables.push(disposable);
        return;
      }
    }
    disposable.unsubscribe();
  }

  /// Complete every stream, drop every value and release every registered
  /// disposable. Calling it again, even from a callback of this object, does
  /// nothing.
  pub fn dispose(&self) {
    if self.inner.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    debug!(object = self.inner.ty.name(), "disposing reactive object");

    if let Some(changing) = self.inner.changing.get() {
      changing.complete();
    }
    if let Some(changed) = self.inner.changed.get() {
      changed.clone().complete();
    }
    let cells: Vec<_> = self.inner.properties.lock().drain().collect();
    for (_, cell) in cells {
      cell.complete();
    }
    self.inner.store.lock().clear();
    self.inner.hook.lock().take();
    let disposables = std::mem::take(&mut *self.inner.disposables.lock());
    for disposable in disposables {
      disposable.unsubscribe();
    }
  }
}

impl PartialEq for ReactiveObject {
  fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl Eq for ReactiveObject {}

impl fmt::Debug for ReactiveObject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReactiveObject")
      .field("type", &self.inner.ty.name())
      .field("at", &Arc::as_ptr(&self.inner))
      .field("disposed", &self.is_disposed())
      .finish()
  }
}

/// The "changing" stream of a reactive object. Subscribers receive each
/// pending change mutably, in subscription order.
#[derive(Clone)]
pub struct ChangingStream {
  subject: MutRefSubject<PropertyChanging>,
}

impl ChangingStream {
  pub fn subscribe<F>(&self, next: F) -> SubjectSubscription<BoxedObserverMutRef<PropertyChanging, Infallible>>
  where
    F: FnMut(&mut PropertyChanging) + Send + 'static,
  {
    self.subject.subscribe(next)
  }

  pub fn subscribe_with<O>(&self, observer: O) -> SubjectSubscription<BoxedObserverMutRef<PropertyChanging, Infallible>>
  where
    O: for<'m> Observer<&'m mut PropertyChanging, Infallible> + Send + 'static,
  {
    self.subject.subscribe_with(observer)
  }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.subject.subscriber_count() }
}

/// Guard returned by [`ReactiveObject::suppress_notifications`].
#[must_use = "notifications resume as soon as the guard is dropped"]
pub struct NotificationSuppression {
  object: ReactiveObject,
}

impl Drop for NotificationSuppression {
  fn drop(&mut self) { self.object.inner.suppressed.fetch_sub(1, Ordering::AcqRel); }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
      Arc, Mutex,
    },
    thread,
  };

  use super::*;
  use crate::prelude::*;

  static WIDGET: ObjectType = ObjectType::new("Widget");
  static BUTTON: ObjectType = ObjectType::derived("Button", &WIDGET);
  static LABEL: ObjectType = ObjectType::new("Label");

  static TITLE: Property<String> = Property::new(&WIDGET, "title");
  static WIDTH: Property<u32> = Property::new(&WIDGET, "width");
  static PRESSED: Property<bool> = Property::new(&BUTTON, "pressed");
  static TEXT: Property<String> = Property::new(&LABEL, "text");

  fn collect<S>(stream: S) -> Arc<Mutex<Vec<S::Item>>>
  where
    S: Observable<Err = Infallible>,
    S::Item: Send + 'static,
  {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    stream.subscribe(move |v| c_seen.lock().unwrap().push(v));
    seen
  }

  #[test]
  fn get_returns_default_then_last_set() {
    let widget = ReactiveObject::new(&WIDGET);
    assert_eq!(widget.get(&WIDTH).unwrap(), 0);
    widget.set(&WIDTH, 10).unwrap();
    widget.set(&WIDTH, 20).unwrap();
    assert_eq!(widget.get(&WIDTH).unwrap(), 20);
  }

  #[test]
  fn inherited_property_is_accepted() {
    let button = ReactiveObject::new(&BUTTON);
    button.set(&TITLE, "ok".to_owned()).unwrap();
    button.set(&PRESSED, true).unwrap();
    assert_eq!(button.get(&TITLE).unwrap(), "ok");
    assert!(button.get(&PRESSED).unwrap());
  }

  #[test]
  fn foreign_property_is_a_mismatch() {
    let widget = ReactiveObject::new(&WIDGET);
    let err = widget.get(&TEXT).unwrap_err();
    assert_eq!(
      err,
      Error::PropertyMismatch { property: "Label::text".to_owned(), object: "Widget" }
    );
    assert!(widget.set(&PRESSED, true).is_err());
    assert!(widget.observe(&TEXT).is_err());
  }

  #[test]
  fn equal_value_publishes_nothing() {
    let widget = ReactiveObject::new(&WIDGET);
    let changing = Arc::new(AtomicUsize::new(0));
    let c_changing = changing.clone();
    widget.changing().subscribe(move |_| {
      c_changing.fetch_add(1, Ordering::SeqCst);
    });
    let changed = collect(widget.changed());

    widget.set(&WIDTH, 0).unwrap();
    widget.set(&WIDTH, 5).unwrap();
    widget.set(&WIDTH, 5).unwrap();

    assert_eq!(changing.load(Ordering::SeqCst), 1);
    assert_eq!(changed.lock().unwrap().len(), 1);
  }

  #[test]
  fn changing_subscribers_rewrite_in_order() {
    let widget = ReactiveObject::new(&WIDGET);
    widget.changing().subscribe(|change| {
      if let Some(&width) = change.new_value(&WIDTH) {
        change.set_new_value(&WIDTH, width + 1);
      }
    });
    widget.changing().subscribe(|change| {
      if let Some(&width) = change.new_value(&WIDTH) {
        change.set_new_value(&WIDTH, width * 10);
      }
    });
    let changes = collect(widget.changed_of(&WIDTH).unwrap());

    widget.set(&WIDTH, 1).unwrap();
    assert_eq!(widget.get(&WIDTH).unwrap(), 20);
    assert_eq!(*changes.lock().unwrap(), vec![PropertyChange { old: 0, new: 20 }]);
  }

  #[test]
  fn rewrite_for_other_property_is_refused() {
    let widget = ReactiveObject::new(&WIDGET);
    let refused = Arc::new(Mutex::new(None));
    let c_refused = refused.clone();
    widget.changing().subscribe(move |change| {
      *c_refused.lock().unwrap() = Some(!change.set_new_value(&TITLE, "x".to_owned()));
    });
    widget.set(&WIDTH, 3).unwrap();
    assert_eq!(*refused.lock().unwrap(), Some(true));
    assert_eq!(widget.get(&WIDTH).unwrap(), 3);
  }

  #[test]
  fn observe_replays_latest_value() {
    let widget = ReactiveObject::new(&WIDGET);
    widget.set(&WIDTH, 1).unwrap();
    widget.set(&WIDTH, 2).unwrap();
    let seen = collect(widget.observe(&WIDTH).unwrap());
    widget.set(&WIDTH, 3).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
  }

  #[test]
  fn observe_shares_one_stream_per_property() {
    let widget = ReactiveObject::new(&WIDGET);
    let first = widget.observe(&WIDTH).unwrap();
    first.clone().subscribe(|_| {});
    let second = widget.observe(&WIDTH).unwrap();
    assert_eq!(second.subscriber_count(), 1);
  }

  #[test]
  fn concurrent_first_observe_creates_one_stream() {
    let widget = ReactiveObject::new(&WIDGET);
    let handles: Vec<_> = (0..8)
      .map(|_| {
        let widget = widget.clone();
        thread::spawn(move || {
          widget.observe(&TITLE).unwrap().subscribe(|_| {});
        })
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }
    assert_eq!(widget.observe(&TITLE).unwrap().subscriber_count(), 8);
  }

  #[test]
  fn suppression_mutes_events_but_not_state() {
    let widget = ReactiveObject::new(&WIDGET);
    let changed = collect(widget.changed());
    let replay = collect(widget.observe(&WIDTH).unwrap());
    let hooked = Arc::new(AtomicUsize::new(0));
    let c_hooked = hooked.clone();
    widget.set_notify_hook(move |_| {
      c_hooked.fetch_add(1, Ordering::SeqCst);
    });

    {
      let _guard = widget.suppress_notifications();
      assert!(widget.notifications_suppressed());
      widget.set(&WIDTH, 7).unwrap();
    }
    widget.set(&WIDTH, 8).unwrap();

    assert_eq!(changed.lock().unwrap().len(), 1);
    assert_eq!(*replay.lock().unwrap(), vec![0, 7, 8]);
    assert_eq!(hooked.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn hook_receives_committed_change() {
    let widget = ReactiveObject::new(&WIDGET);
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    widget.set_notify_hook(move |change| {
      c_seen.lock().unwrap().push(change.typed(&TITLE));
    });
    widget.set(&TITLE, "a".to_owned()).unwrap();
    widget.clear_notify_hook();
    widget.set(&TITLE, "b".to_owned()).unwrap();
    assert_eq!(
      *seen.lock().unwrap(),
      vec![Some(PropertyChange { old: String::new(), new: "a".to_owned() })]
    );
  }

  #[test]
  fn changed_handler_may_set_another_property() {
    let widget = ReactiveObject::new(&WIDGET);
    let c_widget = widget.clone();
    widget.changed().subscribe(move |change| {
      if let Some(&width) = change.new_value(&WIDTH) {
        c_widget.set(&TITLE, format!("{width}px")).unwrap();
      }
    });
    let changes = collect(widget.changed().map(|change| change.property().name()));

    widget.set(&WIDTH, 4).unwrap();
    assert_eq!(widget.get(&TITLE).unwrap(), "4px");
    assert_eq!(*changes.lock().unwrap(), vec!["width", "title"]);
  }

  #[test]
  fn changed_handler_may_clamp_the_same_property() {
    let widget = ReactiveObject::new(&WIDGET);
    let replayed = collect(widget.observe(&WIDTH).unwrap());
    let c_widget = widget.clone();
    widget.changed().subscribe(move |change| {
      if let Some(&width) = change.new_value(&WIDTH) {
        if width > 10 {
          c_widget.set(&WIDTH, 10).unwrap();
        }
      }
    });

    widget.set(&WIDTH, 20).unwrap();
    assert_eq!(widget.get(&WIDTH).unwrap(), 10);
    assert_eq!(*replayed.lock().unwrap(), vec![0, 20, 10]);
    let late = collect(widget.observe(&WIDTH).unwrap());
    assert_eq!(*late.lock().unwrap(), vec![10]);
  }

  #[test]
  fn observe_handler_may_clamp_the_same_property() {
    let widget = ReactiveObject::new(&WIDGET);
    let c_widget = widget.clone();
    widget.observe(&WIDTH).unwrap().subscribe(move |width| {
      if width > 10 {
        c_widget.set(&WIDTH, 10).unwrap();
      }
    });

    widget.set(&WIDTH, 30).unwrap();
    assert_eq!(widget.get(&WIDTH).unwrap(), 10);
    let late = collect(widget.observe(&WIDTH).unwrap());
    assert_eq!(*late.lock().unwrap(), vec![10]);
  }

  #[test]
  fn dispose_releases_everything_once() {
    let widget = ReactiveObject::new(&WIDGET);
    let released = Arc::new(AtomicUsize::new(0));
    struct Release(Arc<AtomicUsize>);
    impl Subscription for Release {
      fn unsubscribe(self) { self.0.fetch_add(1, Ordering::SeqCst); }

      fn is_closed(&self) -> bool { false }
    }

    widget.set(&WIDTH, 1).unwrap();
    let stream = widget.observe(&WIDTH).unwrap();
    widget.register(Release(released.clone()));
    widget.dispose();
    widget.dispose();

    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(stream.subscriber_count(), 0);
    assert_eq!(widget.get(&WIDTH), Err(Error::Disposed));
    assert_eq!(widget.set(&WIDTH, 2), Err(Error::Disposed));
    assert!(widget.observe(&WIDTH).is_err());

    widget.register(Release(released.clone()));
    assert_eq!(released.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn dispose_from_changed_callback() {
    let widget = ReactiveObject::new(&WIDGET);
    let c_widget = widget.clone();
    widget.changed().subscribe(move |_| c_widget.dispose());
    let seen = collect(widget.changed());

    widget.set(&WIDTH, 1).unwrap();
    assert!(widget.is_disposed());
    assert_eq!(seen.lock().unwrap().len(), 1);
  }

  #[test]
  fn dispose_from_changing_callback_cancels_commit() {
    let widget = ReactiveObject::new(&WIDGET);
    let c_widget = widget.clone();
    widget.changing().subscribe(move |_| c_widget.dispose());
    assert_eq!(widget.set(&WIDTH, 1), Err(Error::Disposed));
  }

  #[test]
  fn objects_compare_by_identity() {
    let a = ReactiveObject::new(&WIDGET);
    let b = ReactiveObject::new(&WIDGET);
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
    assert_eq!(Some(a.clone()), Some(a));
  }
}
