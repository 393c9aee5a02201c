use smallvec::SmallVec;

use crate::subscription::DynamicSubscriptions;

/// Subscribers container using DynamicSubscriptions for ID-based management.
///
/// This struct holds the observers of a subject together with the bookkeeping
/// an emission in progress needs. While a subject emits, its observers are
/// moved out of the container so no lock is held during callbacks:
///
/// - observers added meanwhile land in the (now empty) `inner` container and
///   are merged back behind the emitting ones once the emission ends;
/// - observers removed meanwhile are recorded in `pending_remove`, skipped by
///   the rest of the emission, and dropped when it ends;
/// - a completion requested meanwhile is recorded and applied afterwards.
pub(crate) struct Subscribers<Ob> {
  inner: DynamicSubscriptions<Ob>,
  emitting: Option<SmallVec<[usize; 4]>>,
  pending_remove: SmallVec<[usize; 2]>,
  complete_requested: bool,
  completed: bool,
}

impl<Ob> Default for Subscribers<Ob> {
  fn default() -> Self {
    Self {
      inner: DynamicSubscriptions::default(),
      emitting: None,
      pending_remove: SmallVec::new(),
      complete_requested: false,
      completed: false,
    }
  }
}

impl<Ob> Subscribers<Ob> {
  /// Add an observer and return its unique ID, or hand the observer back if
  /// the subject already completed.
  pub(crate) fn add(&mut self, observer: Ob) -> Result<usize, Ob> {
    if self.completed {
      Err(observer)
    } else {
      Ok(self.inner.add(observer))
    }
  }

  /// Remove an observer by ID.
  ///
  /// During an emission an observer that is being emitted to cannot be taken
  /// out; it is marked instead and `None` is returned.
  pub(crate) fn remove(&mut self, id: usize) -> Option<Ob> {
    let removed = self.inner.remove(id);
    if removed.is_none()
      && self
        .emitting
        .as_ref()
        .is_some_and(|ids| ids.contains(&id))
      && !self.pending_remove.contains(&id)
    {
      self.pending_remove.push(id);
    }
    removed
  }

  /// Whether the observer with `id` will receive further values.
  pub(crate) fn is_active(&self, id: usize) -> bool {
    if self.completed || self.complete_requested || self.pending_remove.contains(&id) {
      return false;
    }
    self.inner.contains(id)
      || self
        .emitting
        .as_ref()
        .is_some_and(|ids| ids.contains(&id))
  }

  #[inline]
  pub(crate) fn is_removed(&self, id: usize) -> bool { self.pending_remove.contains(&id) }

  #[inline]
  pub(crate) fn is_emitting(&self) -> bool { self.emitting.is_some() }

  #[inline]
  pub(crate) fn is_completed(&self) -> bool { self.completed }

  /// Number of observers that will receive the next value.
  pub(crate) fn len(&self) -> usize {
    let emitting = self.emitting.as_ref().map_or(0, SmallVec::len);
    self.inner.len() + emitting - self.pending_remove.len()
  }

  /// Move the observers out for an emission.
  pub(crate) fn begin_emit(&mut self) -> DynamicSubscriptions<Ob> {
    let taken = self.inner.take_items();
    self.emitting = Some(taken.ids().collect());
    taken
  }

  /// Put the observers back after an emission. Returns the observers removed
  /// during the emission so the caller can drop them outside the lock.
  pub(crate) fn end_emit(&mut self, mut taken: DynamicSubscriptions<Ob>) -> Vec<Ob> {
    let removed = self
      .pending_remove
      .drain(..)
      .filter_map(|id| taken.remove(id))
      .collect();
    taken.append(&mut self.inner);
    self.inner = taken;
    self.emitting = None;
    removed
  }

  /// Complete now, or remember the request when an emission is in progress.
  /// Returns the observers to complete.
  pub(crate) fn request_complete(&mut self) -> Option<Vec<Ob>> {
    if self.completed {
      return None;
    }
    if self.is_emitting() {
      self.complete_requested = true;
      return None;
    }
    self.completed = true;
    Some(self.inner.drain().collect())
  }

  /// Applies a completion requested during the emission that just ended.
  pub(crate) fn take_deferred_complete(&mut self) -> Option<Vec<Ob>> {
    if std::mem::take(&mut self.complete_requested) {
      self.request_complete()
    } else {
      None
    }
  }

  /// Ends the subject with an error. Returns the observers to notify.
  pub(crate) fn take_for_error(&mut self) -> Vec<Ob> {
    self.completed = true;
    self.inner.drain().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_during_emission_joins_after() {
    let mut subs = Subscribers::default();
    let a = subs.add('a').unwrap();
    let taken = subs.begin_emit();
    let b = subs.add('b').unwrap();
    assert!(subs.is_active(a) && subs.is_active(b));
    assert_eq!(subs.len(), 2);
    assert!(subs.end_emit(taken).is_empty());
    assert_eq!(subs.len(), 2);
  }

  #[test]
  fn remove_during_emission_is_deferred() {
    let mut subs = Subscribers::default();
    let a = subs.add('a').unwrap();
    let _b = subs.add('b').unwrap();
    let taken = subs.begin_emit();
    assert_eq!(subs.remove(a), None);
    assert!(subs.is_removed(a));
    assert!(!subs.is_active(a));
    assert_eq!(subs.len(), 1);
    assert_eq!(subs.end_emit(taken), vec!['a']);
    assert_eq!(subs.len(), 1);
  }

  #[test]
  fn complete_during_emission_is_deferred() {
    let mut subs = Subscribers::default();
    subs.add(1).unwrap();
    let taken = subs.begin_emit();
    assert!(subs.request_complete().is_none());
    subs.end_emit(taken);
    assert_eq!(subs.take_deferred_complete(), Some(vec![1]));
    assert!(subs.is_completed());
    assert_eq!(subs.add(2), Err(2));
  }
}
