//! Lazily created subjects of a list.
//!
//! Nothing is allocated until someone asks for a stream, and publishing only
//! computes what the created streams need from the batch.

use std::{convert::Infallible, sync::Arc};

use once_cell::sync::OnceCell;
use tracing::debug;

use super::change::{Indexed, ListBatch, Modification, Movement};
use crate::{
  observer::Observer,
  subject::{BehaviorSubject, Subject},
};

type Cell<V> = OnceCell<Subject<V, Infallible>>;

pub(crate) struct ListStreams<T> {
  changes: Cell<Arc<ListBatch<T>>>,
  item_added: Cell<Indexed<T>>,
  item_removed: Cell<Indexed<T>>,
  item_modified: Cell<Modification<T>>,
  item_moved: Cell<Movement<T>>,
  added_values: Cell<T>,
  removed_values: Cell<T>,
  modified_values: Cell<T>,
  moved_values: Cell<T>,
  added_group: Cell<Vec<T>>,
  removed_group: Cell<Vec<T>>,
  modified_group: Cell<Vec<T>>,
  count: OnceCell<BehaviorSubject<usize, Infallible>>,
}

impl<T> Default for ListStreams<T> {
  fn default() -> Self {
    Self {
      changes: OnceCell::new(),
      item_added: OnceCell::new(),
      item_removed: OnceCell::new(),
      item_modified: OnceCell::new(),
      item_moved: OnceCell::new(),
      added_values: OnceCell::new(),
      removed_values: OnceCell::new(),
      modified_values: OnceCell::new(),
      moved_values: OnceCell::new(),
      added_group: OnceCell::new(),
      removed_group: OnceCell::new(),
      modified_group: OnceCell::new(),
      count: OnceCell::new(),
    }
  }
}

fn created<V>(cell: &Cell<V>, name: &'static str) -> Subject<V, Infallible> {
  cell
    .get_or_init(|| {
      debug!(stream = name, "list stream created");
      Subject::new()
    })
    .clone()
}

fn emit_each<V: Clone>(cell: &Cell<V>, values: impl Iterator<Item = V>) {
  if let Some(subject) = cell.get() {
    let mut subject = subject.clone();
    values.for_each(|v| subject.next(v));
  }
}

fn emit_group<V: Clone>(cell: &Cell<Vec<V>>, values: impl Iterator<Item = V>) {
  if let Some(subject) = cell.get() {
    let group: Vec<_> = values.collect();
    if !group.is_empty() {
      subject.clone().next(group);
    }
  }
}

fn complete<V: Clone>(cell: &Cell<V>) {
  if let Some(subject) = cell.get() {
    subject.clone().complete();
  }
}

impl<T: Clone> ListStreams<T> {
  pub(crate) fn changes(&self) -> Subject<Arc<ListBatch<T>>, Infallible> { created(&self.changes, "changes") }

  pub(crate) fn item_added(&self) -> Subject<Indexed<T>, Infallible> { created(&self.item_added, "item_added") }

  pub(crate) fn item_removed(&self) -> Subject<Indexed<T>, Infallible> {
    created(&self.item_removed, "item_removed")
  }

  pub(crate) fn item_modified(&self) -> Subject<Modification<T>, Infallible> {
    created(&self.item_modified, "item_modified")
  }

  pub(crate) fn item_moved(&self) -> Subject<Movement<T>, Infallible> { created(&self.item_moved, "item_moved") }

  pub(crate) fn added_values(&self) -> Subject<T, Infallible> { created(&self.added_values, "added_values") }

  pub(crate) fn removed_values(&self) -> Subject<T, Infallible> { created(&self.removed_values, "removed_values") }

  pub(crate) fn modified_values(&self) -> Subject<T, Infallible> {
    created(&self.modified_values, "modified_values")
  }

  pub(crate) fn moved_values(&self) -> Subject<T, Infallible> { created(&self.moved_values, "moved_values") }

  pub(crate) fn added_group(&self) -> Subject<Vec<T>, Infallible> { created(&self.added_group, "added_group") }

  pub(crate) fn removed_group(&self) -> Subject<Vec<T>, Infallible> {
    created(&self.removed_group, "removed_group")
  }

  pub(crate) fn modified_group(&self) -> Subject<Vec<T>, Infallible> {
    created(&self.modified_group, "modified_group")
  }

  /// The length stream. `len` is read only if the stream does not exist yet.
  pub(crate) fn count(&self, len: impl FnOnce() -> usize) -> BehaviorSubject<usize, Infallible> {
    self
      .count
      .get_or_init(|| {
        debug!(stream = "count_changed", "list stream created");
        BehaviorSubject::new(len())
      })
      .clone()
  }

  /// Whether any stream exists at all. Mutations skip building a batch
  /// nobody can see.
  pub(crate) fn any_created(&self) -> bool {
    self.changes.get().is_some()
      || self.item_added.get().is_some()
      || self.item_removed.get().is_some()
      || self.item_modified.get().is_some()
      || self.item_moved.get().is_some()
      || self.added_values.get().is_some()
      || self.removed_values.get().is_some()
      || self.modified_values.get().is_some()
      || self.moved_values.get().is_some()
      || self.added_group.get().is_some()
      || self.removed_group.get().is_some()
      || self.modified_group.get().is_some()
      || self.count.get().is_some()
  }

  /// Publish `batch` on every created stream; `len` is the list length after
  /// the mutation.
  pub(crate) fn publish(&self, batch: ListBatch<T>, len: usize) {
    let batch = Arc::new(batch);
    if let Some(changes) = self.changes.get() {
      changes.clone().next(batch.clone());
    }

    emit_each(&self.item_added, batch.added.iter().cloned());
    emit_each(&self.item_removed, batch.removed.iter().cloned());
    emit_each(&self.item_modified, batch.modified.iter().cloned());
    emit_each(&self.item_moved, batch.moved.iter().cloned());

    emit_each(&self.added_values, batch.added.iter().map(|a| a.item.clone()));
    emit_each(&self.removed_values, batch.removed.iter().map(|r| r.item.clone()));
    emit_each(&self.modified_values, batch.modified.iter().map(|m| m.new.clone()));
    emit_each(&self.moved_values, batch.moved.iter().map(|m| m.item.clone()));

    emit_group(&self.added_group, batch.added.iter().map(|a| a.item.clone()));
    emit_group(&self.removed_group, batch.removed.iter().map(|r| r.item.clone()));
    emit_group(&self.modified_group, batch.modified.iter().map(|m| m.new.clone()));

    if let Some(count) = self.count.get() {
      if count.value() != len {
        count.clone().next(len);
      }
    }
  }

  pub(crate) fn complete_all(&self) {
    complete(&self.changes);
    complete(&self.item_added);
    complete(&self.item_removed);
    complete(&self.item_modified);
    complete(&self.item_moved);
    complete(&self.added_values);
    complete(&self.removed_values);
    complete(&self.modified_values);
    complete(&self.moved_values);
    complete(&self.added_group);
    complete(&self.removed_group);
    complete(&self.modified_group);
    if let Some(count) = self.count.get() {
      count.clone().complete();
    }
  }
}
