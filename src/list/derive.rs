use std::{
  convert::Infallible,
  mem,
  ops::Deref,
  sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{Indexed, ListBatch, ListCore, ListItem, ListView, Modification, Movement};
use crate::{
  observable::Observable,
  observer::Observer,
  subscription::{BoxedSubscription, IntoBoxedSubscription, Subscription, SubscriptionGuard},
};

/// A read-only list kept equal to another list mapped through a selector.
///
/// Each source batch is translated into the corresponding batch of the
/// derived list: added items are mapped and inserted at the same positions,
/// removed ones are removed at the same positions, modifications map the new
/// value and moves are repeated. The selector runs once per added or modified
/// item, never over the whole list.
///
/// Dropping or disposing the derived list stops following the source. The
/// source never keeps a derived list alive.
///
/// ```rust
/// use rxstate::prelude::*;
///
/// let source = ReactiveList::from(vec![1, 2, 3]);
/// let labels = source.derive(|n: &i32| format!("#{n}"));
///
/// source.remove_at(0).unwrap();
/// source.add(4);
/// assert_eq!(labels.snapshot(), vec!["#2", "#3", "#4"]);
///
/// labels.dispose();
/// source.add(5);
/// assert_eq!(labels.len(), 3);
/// ```
pub struct DerivedList<U: ListItem> {
  view: ListView<U>,
  source: Mutex<Option<SubscriptionGuard<BoxedSubscription>>>,
}

impl<U: ListItem> DerivedList<U> {
  pub(crate) fn new<T, F>(source: &ListView<T>, mut selector: F) -> Self
  where
    T: ListItem,
    F: FnMut(&T) -> U + Send + 'static,
  {
    let items: Vec<U> = source.with_items(|items| items.iter().map(&mut selector).collect());
    let view = ListView { core: Arc::new(ListCore::new(items)) };
    let subscription = source
      .changes()
      .subscribe_with(Derivation { target: Arc::downgrade(view.core()), selector })
      .into_boxed()
      .unsubscribe_when_dropped();
    debug!(len = view.len(), "derived list created");
    Self { view, source: Mutex::new(Some(subscription)) }
  }

  /// A read-only handle to the derived contents. It keeps following the
  /// source only as long as this list is neither dropped nor disposed.
  pub fn view(&self) -> ListView<U> { self.view.clone() }

  /// Stop following the source and complete every stream of this list.
  /// Calling it again does nothing.
  pub fn dispose(&self) {
    let Some(subscription) = self.source.lock().take() else { return };
    drop(subscription);
    self.view.core().complete_streams();
    debug!("derived list disposed");
  }

  pub fn is_disposed(&self) -> bool { self.source.lock().is_none() }
}

impl<U: ListItem> Deref for DerivedList<U> {
  type Target = ListView<U>;

  fn deref(&self) -> &ListView<U> { &self.view }
}

impl<U: ListItem + std::fmt::Debug> std::fmt::Debug for DerivedList<U> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.view.fmt(f) }
}

struct Derivation<U, F> {
  target: Weak<ListCore<U>>,
  selector: F,
}

impl<T, U, F> Observer<Arc<ListBatch<T>>, Infallible> for Derivation<U, F>
where
  T: ListItem,
  U: ListItem,
  F: FnMut(&T) -> U,
{
  fn next(&mut self, batch: Arc<ListBatch<T>>) {
    if let Some(target) = self.target.upgrade() {
      target.follow(&batch, &mut self.selector);
    }
  }

  fn error(self, err: Infallible) { match err {} }

  fn complete(self) {}

  fn is_closed(&self) -> bool { self.target.strong_count() == 0 }
}

impl<U: ListItem> ListCore<U> {
  /// Apply the counterpart of a source batch.
  fn follow<T>(&self, source: &ListBatch<T>, selector: &mut impl FnMut(&T) -> U) {
    self.mutate("derive", |list, observed| {
      let mut batch = ListBatch::default();

      for removed in source.removed.iter().rev() {
        if removed.index >= list.len() {
          warn!(index = removed.index, len = list.len(), "derived list out of sync with its source");
          continue;
        }
        let item = list.remove(removed.index);
        if observed {
          batch.removed.push(Indexed { index: removed.index, item });
        }
      }
      batch.removed.reverse();

      for added in &source.added {
        if added.index > list.len() {
          warn!(index = added.index, len = list.len(), "derived list out of sync with its source");
          continue;
        }
        let item = selector(&added.item);
        if observed {
          batch.added.push(Indexed { index: added.index, item: item.clone() });
        }
        list.insert(added.index, item);
      }

      for modified in &source.modified {
        let new = selector(&modified.new);
        let Some(slot) = list.get_mut(modified.index) else {
          warn!(index = modified.index, "derived list out of sync with its source");
          continue;
        };
        let old = mem::replace(slot, new);
        if observed {
          batch.modified.push(Modification { index: modified.index, old, new: slot.clone() });
        }
      }

      for moved in &source.moved {
        if moved.from >= list.len() || moved.to >= list.len() {
          warn!(from = moved.from, to = moved.to, "derived list out of sync with its source");
          continue;
        }
        let item = list.remove(moved.from);
        list.insert(moved.to, item);
        if observed {
          batch.moved.push(Movement { from: moved.from, to: moved.to, item: list[moved.to].clone() });
        }
      }

      ((), Some(batch))
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  };

  use crate::prelude::*;

  fn counting_selector(calls: Arc<AtomicUsize>) -> impl FnMut(&i32) -> String + Send + 'static {
    move |n: &i32| {
      calls.fetch_add(1, Ordering::SeqCst);
      n.to_string()
    }
  }

  fn mapped(source: &ReactiveList<i32>) -> Vec<String> { source.snapshot().iter().map(i32::to_string).collect() }

  #[test]
  fn follows_every_kind_of_mutation() {
    let source = ReactiveList::from(vec![1, 2, 3, 4]);
    let derived = source.derive(|n: &i32| n.to_string());
    assert_eq!(derived.snapshot(), mapped(&source));

    let steps: &[fn(&ReactiveList<i32>)] = &[
      |l| l.add(5),
      |l| l.add_range([6, 7]),
      |l| l.insert_range([(0, 10), (3, 11), (3, 12)]).unwrap(),
      |l| {
        l.remove_range([2, 7, 99]);
      },
      |l| {
        l.remove_at(1).unwrap();
      },
      |l| {
        l.set(2, 40).unwrap();
      },
      |l| l.modify_range([(0, 100), (1, 101)]).unwrap(),
      |l| l.move_to(0, 3).unwrap(),
      |l| l.move_to(3, 0).unwrap(),
      |l| {
        l.move_item(1, &5).unwrap();
      },
      |l| {
        l.remove(&101);
      },
      |l| l.clear(),
      |l| l.add_range([8, 9]),
    ];
    for step in steps {
      step(&source);
      assert_eq!(derived.snapshot(), mapped(&source));
    }
  }

  #[test]
  fn derived_batches_mirror_the_source() {
    let source = ReactiveList::from(vec![1, 2, 3]);
    let derived = source.derive(|n: &i32| n * 10);
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    derived
      .changes()
      .subscribe(move |batch: Arc<ListBatch<i32>>| c_seen.lock().unwrap().push((*batch).clone()));

    source.remove_range([3, 1]);
    source.move_to(0, 0).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
      seen[0].removed,
      vec![Indexed { index: 0, item: 10 }, Indexed { index: 2, item: 30 }]
    );
    assert_eq!(seen[1].moved, vec![Movement { from: 0, to: 0, item: 20 }]);
  }

  #[test]
  fn selector_runs_only_for_changed_items() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = ReactiveList::from(vec![1, 2, 3]);
    let _derived = source.derive(counting_selector(calls.clone()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    source.add(4);
    source.remove_at(0).unwrap();
    source.move_to(0, 2).unwrap();
    source.set(0, 7).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 5);
  }

  #[test]
  fn dispose_stops_the_derivation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = ReactiveList::from(vec![1]);
    let derived = source.derive(counting_selector(calls.clone()));
    assert_eq!(source.changes().subscriber_count(), 1);

    derived.dispose();
    derived.dispose();
    assert!(derived.is_disposed());
    assert_eq!(source.changes().subscriber_count(), 0);

    source.add(2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(derived.snapshot(), vec!["1"]);
  }

  #[test]
  fn dropping_the_derived_list_releases_the_source() {
    let source = ReactiveList::from(vec![1]);
    let view = {
      let derived = source.derive(|n: &i32| *n);
      derived.view()
    };
    assert_eq!(source.changes().subscriber_count(), 0);
    source.add(2);
    assert_eq!(view.snapshot(), vec![1]);
  }

  #[test]
  fn derivations_chain() {
    let source = ReactiveList::from(vec![1, 2]);
    let doubled = source.derive(|n: &i32| n * 2);
    let labels = doubled.derive(|n: &i32| format!("<{n}>"));

    source.add(3);
    source.remove_at(0).unwrap();
    assert_eq!(labels.snapshot(), vec!["<4>", "<6>"]);
  }
}
