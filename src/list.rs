//! Reactive lists.
//!
//! Every mutation publishes exactly one [`ListBatch`] describing it, unless it
//! changed nothing. The batch is the single source of every list stream: the
//! flattened per-item streams, the value-only streams and the grouped streams
//! are all computed from it, never by re-scanning the list.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxstate::prelude::*;
//!
//! let list = ReactiveList::from(vec!["a", "b", "c", "d"]);
//! let removed = Arc::new(Mutex::new(vec![]));
//! let c_removed = removed.clone();
//! list
//!   .item_removed()
//!   .subscribe(move |r: Indexed<&str>| c_removed.lock().unwrap().push((r.index, r.item)));
//!
//! assert_eq!(list.remove_range(["b", "d"]), 2);
//! assert_eq!(list.snapshot(), vec!["a", "c"]);
//! assert_eq!(*removed.lock().unwrap(), vec![(1, "b"), (3, "d")]);
//! ```

mod change;
mod derive;
mod streams;

use std::{fmt, mem, ops::Deref, sync::Arc};

pub use change::{Indexed, ListBatch, Modification, Movement};
pub use derive::DerivedList;
use parking_lot::Mutex;
use streams::ListStreams;
use tracing::trace;

use crate::{
  error::{Error, Result},
  stream::{EventStream, ValueStream},
};

/// Bounds every list item satisfies.
pub trait ListItem: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> ListItem for T {}

pub(crate) struct ListCore<T> {
  items: Mutex<Vec<T>>,
  streams: ListStreams<T>,
}

impl<T: ListItem> ListCore<T> {
  pub(crate) fn new(items: Vec<T>) -> Self { Self { items: Mutex::new(items), streams: ListStreams::default() } }

  /// Run `f` on the items under the lock, then publish the batch it built.
  ///
  /// `f` is told whether any stream exists; when none does it may skip
  /// building the batch. The lock is released before publishing.
  fn mutate<R>(&self, op: &'static str, f: impl FnOnce(&mut Vec<T>, bool) -> (R, Option<ListBatch<T>>)) -> R {
    let observed = self.streams.any_created();
    let (result, batch, len) = {
      let mut items = self.items.lock();
      let (result, batch) = f(&mut items, observed);
      (result, batch, items.len())
    };
    if let Some(batch) = batch.filter(|batch| !batch.is_empty()) {
      trace!(op, changes = batch.len(), len, "list batch");
      self.streams.publish(batch, len);
    }
    result
  }

  pub(crate) fn complete_streams(&self) { self.streams.complete_all(); }
}

fn out_of_range(index: usize, len: usize) -> Error { Error::IndexOutOfRange { index, len } }

/// A read-only handle to a reactive list: its contents and its streams.
///
/// [`ReactiveList`] and [`DerivedList`] both dereference to it, and
/// [`ReactiveList::view`] hands one out to consumers that must not mutate.
pub struct ListView<T> {
  core: Arc<ListCore<T>>,
}

impl<T> Clone for ListView<T> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<T: ListItem> ListView<T> {
  #[inline]
  pub fn len(&self) -> usize { self.core.items.lock().len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.core.items.lock().is_empty() }

  pub fn get(&self, index: usize) -> Option<T> { self.core.items.lock().get(index).cloned() }

  pub fn index_of(&self, item: &T) -> Option<usize>
  where
    T: PartialEq,
  {
    self.core.items.lock().iter().position(|v| v == item)
  }

  pub fn contains(&self, item: &T) -> bool
  where
    T: PartialEq,
  {
    self.index_of(item).is_some()
  }

  /// A copy of the current contents.
  pub fn snapshot(&self) -> Vec<T> { self.core.items.lock().clone() }

  /// Borrow the current contents.
  ///
  /// The list is locked while `f` runs; mutating it from `f` deadlocks.
  pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R { f(&self.core.items.lock()) }

  /// One batch per mutation.
  pub fn changes(&self) -> EventStream<Arc<ListBatch<T>>> { EventStream::new(self.core.streams.changes()) }

  pub fn item_added(&self) -> EventStream<Indexed<T>> { EventStream::new(self.core.streams.item_added()) }

  pub fn item_removed(&self) -> EventStream<Indexed<T>> { EventStream::new(self.core.streams.item_removed()) }

  pub fn item_modified(&self) -> EventStream<Modification<T>> { EventStream::new(self.core.streams.item_modified()) }

  pub fn item_moved(&self) -> EventStream<Movement<T>> { EventStream::new(self.core.streams.item_moved()) }

  pub fn added_values(&self) -> EventStream<T> { EventStream::new(self.core.streams.added_values()) }

  pub fn removed_values(&self) -> EventStream<T> { EventStream::new(self.core.streams.removed_values()) }

  /// The new value of every modification.
  pub fn modified_values(&self) -> EventStream<T> { EventStream::new(self.core.streams.modified_values()) }

  pub fn moved_values(&self) -> EventStream<T> { EventStream::new(self.core.streams.moved_values()) }

  /// The added items of each batch that added any, together.
  pub fn added_group(&self) -> EventStream<Vec<T>> { EventStream::new(self.core.streams.added_group()) }

  pub fn removed_group(&self) -> EventStream<Vec<T>> { EventStream::new(self.core.streams.removed_group()) }

  pub fn modified_group(&self) -> EventStream<Vec<T>> { EventStream::new(self.core.streams.modified_group()) }

  /// The length: replayed on subscription, then published whenever a
  /// mutation changes it.
  pub fn count_changed(&self) -> ValueStream<usize> {
    ValueStream::new(self.core.streams.count(|| self.len()))
  }

  /// A list kept equal to this one mapped through `selector`.
  ///
  /// The derived list starts as `self.map(selector)` and then follows every
  /// batch incrementally. Set it up from the thread that writes to this list.
  pub fn derive<U, F>(&self, selector: F) -> DerivedList<U>
  where
    U: ListItem,
    F: FnMut(&T) -> U + Send + 'static,
  {
    DerivedList::new(self, selector)
  }

  pub(crate) fn core(&self) -> &Arc<ListCore<T>> { &self.core }
}

impl<T: ListItem + fmt::Debug> fmt::Debug for ListView<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_list().entries(self.core.items.lock().iter()).finish() }
}

/// An ordered, mutable, observable sequence.
///
/// Cloning the handle shares the list. Writes to one list must come from one
/// thread at a time; reads and subscriptions may come from anywhere.
pub struct ReactiveList<T> {
  view: ListView<T>,
}

impl<T> Clone for ReactiveList<T> {
  fn clone(&self) -> Self { Self { view: self.view.clone() } }
}

impl<T: ListItem> Default for ReactiveList<T> {
  fn default() -> Self { Self::new() }
}

impl<T: ListItem> From<Vec<T>> for ReactiveList<T> {
  fn from(items: Vec<T>) -> Self { Self { view: ListView { core: Arc::new(ListCore::new(items)) } } }
}

impl<T: ListItem> FromIterator<T> for ReactiveList<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self { Self::from(iter.into_iter().collect::<Vec<_>>()) }
}

impl<T> Deref for ReactiveList<T> {
  type Target = ListView<T>;

  fn deref(&self) -> &ListView<T> { &self.view }
}

impl<T: ListItem + fmt::Debug> fmt::Debug for ReactiveList<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.view.fmt(f) }
}

impl<T: ListItem> ReactiveList<T> {
  pub fn new() -> Self { Self::from(Vec::new()) }

  /// A read-only handle to this list.
  pub fn view(&self) -> ListView<T> { self.view.clone() }

  pub fn add(&self, item: T) { self.add_range([item]) }

  /// Append `items`. They are reported at their final positions.
  pub fn add_range(&self, items: impl IntoIterator<Item = T>) {
    let items: Vec<T> = items.into_iter().collect();
    self.view.core.mutate("add_range", |list, observed| {
      let start = list.len();
      let batch = observed.then(|| {
        let added = items
          .iter()
          .enumerate()
          .map(|(offset, item)| Indexed { index: start + offset, item: item.clone() })
          .collect();
        ListBatch::added(added)
      });
      list.extend(items);
      ((), batch)
    })
  }

  /// Insert `item` so that it ends up at `index`.
  pub fn insert(&self, index: usize, item: T) -> Result<()> { self.insert_range([(index, item)]) }

  /// Insert items at positions of the current list.
  ///
  /// Every index is checked against the length before anything is inserted.
  /// The outcome is that of inserting from the highest index to the lowest:
  /// each item lands before the item that was at its index, and items sharing
  /// an index keep their given order.
  ///
  /// The batch lists the final position of each item, ascending. When several
  /// items are inserted these differ from the indices passed in: inserting
  /// `[(0, a), (1, b)]` into `[x, y]` gives `[a, x, b, y]` and reports
  /// `a` at 0 and `b` at 2.
  pub fn insert_range(&self, items: impl IntoIterator<Item = (usize, T)>) -> Result<()> {
    let mut items: Vec<(usize, T)> = items.into_iter().collect();
    self.view.core.mutate("insert_range", |list, observed| {
      let len = list.len();
      if let Some(&(index, _)) = items.iter().find(|(index, _)| *index > len) {
        return (Err(out_of_range(index, len)), None);
      }
      items.sort_by_key(|(index, _)| *index);
      let mut added = Vec::with_capacity(if observed { items.len() } else { 0 });
      for (offset, (index, item)) in items.into_iter().enumerate() {
        let at = index + offset;
        if observed {
          added.push(Indexed { index: at, item: item.clone() });
        }
        list.insert(at, item);
      }
      (Ok(()), observed.then(|| ListBatch::added(added)))
    })
  }

  /// Remove and return the item at `index`.
  pub fn remove_at(&self, index: usize) -> Result<T> {
    self.view.core.mutate("remove_at", |list, observed| {
      if index >= list.len() {
        return (Err(out_of_range(index, list.len())), None);
      }
      let item = list.remove(index);
      let batch = observed.then(|| ListBatch::removed(vec![Indexed { index, item: item.clone() }]));
      (Ok(item), batch)
    })
  }

  /// Remove the first item equal to `item`. Returns `false`, publishing
  /// nothing, when there is none.
  pub fn remove(&self, item: &T) -> bool
  where
    T: PartialEq,
  {
    self.view.core.mutate("remove", |list, observed| {
      let Some(index) = list.iter().position(|v| v == item) else {
        return (false, None);
      };
      let item = list.remove(index);
      (true, observed.then(|| ListBatch::removed(vec![Indexed { index, item }])))
    })
  }

  /// Remove items by value and return how many were removed.
  ///
  /// Each item is matched to a distinct current position before anything is
  /// removed, so duplicates claim successive matches. Items without a match
  /// are skipped.
  pub fn remove_range(&self, items: impl IntoIterator<Item = T>) -> usize
  where
    T: PartialEq,
  {
    let items: Vec<T> = items.into_iter().collect();
    self.view.core.mutate("remove_range", |list, observed| {
      let mut claimed: Vec<usize> = Vec::with_capacity(items.len());
      for item in &items {
        if let Some(index) = (0..list.len()).find(|i| list[*i] == *item && !claimed.contains(i)) {
          claimed.push(index);
        }
      }
      claimed.sort_unstable();

      let mut removed = Vec::with_capacity(if observed { claimed.len() } else { 0 });
      for &index in claimed.iter().rev() {
        let item = list.remove(index);
        if observed {
          removed.push(Indexed { index, item });
        }
      }
      removed.reverse();
      (claimed.len(), observed.then(|| ListBatch::removed(removed)))
    })
  }

  /// Replace the item at `index` and return the old one.
  pub fn set(&self, index: usize, value: T) -> Result<T> {
    self.view.core.mutate("set", |list, observed| {
      let Some(slot) = list.get_mut(index) else {
        let len = list.len();
        return (Err(out_of_range(index, len)), None);
      };
      let old = mem::replace(slot, value);
      let batch = observed.then(|| {
        ListBatch::modified(vec![Modification { index, old: old.clone(), new: slot.clone() }])
      });
      (Ok(old), batch)
    })
  }

  /// Replace several items, in the given order. Every index is checked first.
  pub fn modify_range(&self, items: impl IntoIterator<Item = (usize, T)>) -> Result<()> {
    let items: Vec<(usize, T)> = items.into_iter().collect();
    self.view.core.mutate("modify_range", |list, observed| {
      let len = list.len();
      if let Some(&(index, _)) = items.iter().find(|(index, _)| *index >= len) {
        return (Err(out_of_range(index, len)), None);
      }
      let mut modified = Vec::with_capacity(if observed { items.len() } else { 0 });
      for (index, value) in items {
        let old = mem::replace(&mut list[index], value);
        if observed {
          modified.push(Modification { index, old, new: list[index].clone() });
        }
      }
      (Ok(()), observed.then(|| ListBatch::modified(modified)))
    })
  }

  /// Take the item at `from` out and re-insert it at `to`, counted after the
  /// removal. Moving an item onto itself still publishes a batch.
  pub fn move_to(&self, from: usize, to: usize) -> Result<()> {
    self
      .view
      .core
      .mutate("move_to", |list, observed| match move_within(list, from, to, observed) {
        Ok(batch) => (Ok(()), batch),
        Err(err) => (Err(err), None),
      })
  }

  /// Move the first item equal to `item` to `to`. Returns `Ok(false)` when
  /// there is none.
  pub fn move_item(&self, to: usize, item: &T) -> Result<bool>
  where
    T: PartialEq,
  {
    self.view.core.mutate("move_item", |list, observed| {
      let Some(from) = list.iter().position(|v| v == item) else {
        return (Ok(false), None);
      };
      match move_within(list, from, to, observed) {
        Ok(batch) => (Ok(true), batch),
        Err(err) => (Err(err), None),
      }
    })
  }

  /// Remove everything. The batch lists the items in forward order.
  pub fn clear(&self) {
    self.view.core.mutate("clear", |list, observed| {
      if !observed {
        list.clear();
        return ((), None);
      }
      let removed = list
        .drain(..)
        .enumerate()
        .map(|(index, item)| Indexed { index, item })
        .collect();
      ((), Some(ListBatch::removed(removed)))
    })
  }
}

fn move_within<T: Clone>(list: &mut Vec<T>, from: usize, to: usize, observed: bool) -> Result<Option<ListBatch<T>>> {
  let len = list.len();
  if from >= len {
    return Err(out_of_range(from, len));
  }
  if to >= len {
    return Err(out_of_range(to, len));
  }
  let item = list.remove(from);
  list.insert(to, item);
  Ok(observed.then(|| ListBatch::moved(Movement { from, to, item: list[to].clone() })))
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  fn batches<T: ListItem>(list: &ListView<T>) -> Arc<Mutex<Vec<ListBatch<T>>>> {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    list
      .changes()
      .subscribe(move |batch: Arc<ListBatch<T>>| c_seen.lock().unwrap().push((*batch).clone()));
    seen
  }

  fn at<T>(index: usize, item: T) -> Indexed<T> { Indexed { index, item } }

  #[test]
  fn add_reports_final_positions() {
    let list = ReactiveList::from(vec![1]);
    let seen = batches(&list);

    list.add(2);
    list.add_range([3, 4]);
    list.add_range([]);

    assert_eq!(list.snapshot(), vec![1, 2, 3, 4]);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].added, vec![at(1, 2)]);
    assert_eq!(seen[1].added, vec![at(2, 3), at(3, 4)]);
  }

  #[test]
  fn insert_range_uses_indices_of_the_current_list() {
    let list = ReactiveList::from(vec!["a", "b", "c"]);
    let seen = batches(&list);

    list
      .insert_range([(3, "z"), (0, "x"), (1, "y"), (1, "w")])
      .unwrap();

    assert_eq!(list.snapshot(), vec!["x", "a", "y", "w", "b", "c", "z"]);
    assert_eq!(
      seen.lock().unwrap()[0].added,
      vec![at(0, "x"), at(2, "y"), at(3, "w"), at(6, "z")]
    );
  }

  #[test]
  fn insert_range_reports_positions_after_the_insert() {
    let list = ReactiveList::from(vec!["x", "y"]);
    let seen = batches(&list);

    list.insert_range([(0, "a"), (1, "b")]).unwrap();

    assert_eq!(list.snapshot(), vec!["a", "x", "b", "y"]);
    assert_eq!(seen.lock().unwrap()[0].added, vec![at(0, "a"), at(2, "b")]);
  }

  #[test]
  fn out_of_range_changes_nothing() {
    let list = ReactiveList::from(vec![1, 2]);
    let seen = batches(&list);

    assert_eq!(list.insert(3, 9), Err(Error::IndexOutOfRange { index: 3, len: 2 }));
    assert_eq!(list.insert_range([(0, 7), (5, 8)]), Err(Error::IndexOutOfRange { index: 5, len: 2 }));
    assert_eq!(list.remove_at(2), Err(Error::IndexOutOfRange { index: 2, len: 2 }));
    assert_eq!(list.set(2, 0), Err(Error::IndexOutOfRange { index: 2, len: 2 }));
    assert!(list.modify_range([(0, 5), (2, 6)]).is_err());
    assert!(list.move_to(0, 2).is_err());
    assert!(list.move_item(4, &1).is_err());

    assert_eq!(list.snapshot(), vec![1, 2]);
    assert!(seen.lock().unwrap().is_empty());
  }

  #[test]
  fn remove_range_resolves_before_removing() {
    let list = ReactiveList::from(vec!["a", "b", "c", "d"]);
    let seen = batches(&list);

    assert_eq!(list.remove_range(["d", "b", "q"]), 2);
    assert_eq!(list.snapshot(), vec!["a", "c"]);
    assert_eq!(seen.lock().unwrap()[0].removed, vec![at(1, "b"), at(3, "d")]);
  }

  #[test]
  fn remove_range_duplicates_claim_successive_matches() {
    let list = ReactiveList::from(vec![5, 1, 5, 5]);
    let seen = batches(&list);

    assert_eq!(list.remove_range([5, 5]), 2);
    assert_eq!(list.snapshot(), vec![1, 5]);
    assert_eq!(seen.lock().unwrap()[0].removed, vec![at(0, 5), at(2, 5)]);

    assert_eq!(list.remove_range([7]), 0);
    assert_eq!(seen.lock().unwrap().len(), 1);
  }

  #[test]
  fn single_removals() {
    let list = ReactiveList::from(vec!['a', 'b', 'c']);
    let seen = batches(&list);

    assert_eq!(list.remove_at(1), Ok('b'));
    assert!(list.remove(&'c'));
    assert!(!list.remove(&'z'));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].removed, vec![at(1, 'b')]);
    assert_eq!(seen[1].removed, vec![at(1, 'c')]);
  }

  #[test]
  fn modifications_keep_their_order() {
    let list = ReactiveList::from(vec![10, 20]);
    let seen = batches(&list);

    assert_eq!(list.set(0, 11), Ok(10));
    list.modify_range([(1, 21), (1, 22)]).unwrap();
    list.set(0, 11).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].modified, vec![Modification { index: 0, old: 10, new: 11 }]);
    assert_eq!(
      seen[1].modified,
      vec![Modification { index: 1, old: 20, new: 21 }, Modification { index: 1, old: 21, new: 22 }]
    );
    // Rewriting the same value is still a modification.
    assert_eq!(seen[2].modified, vec![Modification { index: 0, old: 11, new: 11 }]);
  }

  #[test]
  fn move_is_remove_then_insert() {
    let list = ReactiveList::from(vec!["x", "y"]);
    let seen = batches(&list);

    list.move_to(0, 1).unwrap();
    assert_eq!(list.snapshot(), vec!["y", "x"]);
    assert_eq!(seen.lock().unwrap()[0].moved, vec![Movement { from: 0, to: 1, item: "x" }]);

    assert_eq!(list.move_item(0, &"x"), Ok(true));
    assert_eq!(list.move_item(0, &"q"), Ok(false));
    list.move_to(1, 1).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(list.snapshot(), vec!["x", "y"]);
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2].moved, vec![Movement { from: 1, to: 1, item: "y" }]);
  }

  #[test]
  fn clear_reports_forward_order() {
    let list = ReactiveList::from(vec![1, 2, 3]);
    let seen = batches(&list);

    list.clear();
    list.clear();

    assert!(list.is_empty());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].removed, vec![at(0, 1), at(1, 2), at(2, 3)]);
  }

  #[test]
  fn derived_streams_follow_the_batch() {
    let list = ReactiveList::from(vec![1, 2, 3]);
    let added = Arc::new(Mutex::new(vec![]));
    let groups = Arc::new(Mutex::new(vec![]));
    let modified = Arc::new(Mutex::new(vec![]));
    let moved = Arc::new(Mutex::new(vec![]));

    let c_added = added.clone();
    list.added_values().subscribe(move |v| c_added.lock().unwrap().push(v));
    let c_groups = groups.clone();
    list.removed_group().subscribe(move |g| c_groups.lock().unwrap().push(g));
    let c_modified = modified.clone();
    list.modified_values().subscribe(move |v| c_modified.lock().unwrap().push(v));
    let c_moved = moved.clone();
    list.item_moved().subscribe(move |m| c_moved.lock().unwrap().push(m));

    list.add_range([4, 5]);
    list.remove_range([1, 5]);
    list.set(0, 20).unwrap();
    list.move_to(0, 2).unwrap();
    list.add(6);

    assert_eq!(*added.lock().unwrap(), vec![4, 5, 6]);
    assert_eq!(*groups.lock().unwrap(), vec![vec![1, 5]]);
    assert_eq!(*modified.lock().unwrap(), vec![20]);
    assert_eq!(*moved.lock().unwrap(), vec![Movement { from: 0, to: 2, item: 20 }]);
  }

  #[test]
  fn count_replays_and_follows_length() {
    let list = ReactiveList::from(vec!['a']);
    let counts = Arc::new(Mutex::new(vec![]));
    let c_counts = counts.clone();
    list
      .count_changed()
      .subscribe(move |n| c_counts.lock().unwrap().push(n));

    list.add('b');
    list.set(0, 'z').unwrap();
    list.clear();
    assert_eq!(*counts.lock().unwrap(), vec![1, 2, 0]);
  }

  #[test]
  fn streams_are_created_once() {
    let list = ReactiveList::<u8>::new();
    let a = list.changes();
    let b = list.view().changes();
    a.clone().subscribe(|_| {});
    assert_eq!(b.subscriber_count(), 1);
  }

  #[test]
  fn subscriber_may_mutate_the_list() {
    let list = ReactiveList::from(vec![0]);
    let seen = batches(&list);
    let c_list = list.clone();
    list.added_values().subscribe(move |v: i32| {
      if v < 3 {
        c_list.add(v + 1);
      }
    });

    list.add(1);
    assert_eq!(list.snapshot(), vec![0, 1, 2, 3]);
    let seen = seen.lock().unwrap();
    let added: Vec<_> = seen.iter().map(|b| b.added.clone()).collect();
    assert_eq!(added, vec![vec![at(1, 1)], vec![at(2, 2)], vec![at(3, 3)]]);
  }
}
