use std::sync::Arc;

use super::subject_core::SubjectShared;
use crate::subscription::Subscription;

/// Subscription handle for a Subject.
///
/// Unsubscribing removes the observer from the subject. When that happens
/// during an emission of the same subject, the observer is skipped for the
/// rest of the emission and dropped once it ends.
///
/// - **Shared Ownership**: Holds a reference-counted pointer to the subject's
///   observer list, not a borrow of the subject itself.
/// - **Owned Removal**: The removed observer is dropped after the subject's
///   lock is released, so dropping it may touch the subject again.
pub struct SubjectSubscription<Ob> {
  shared: Arc<SubjectShared<Ob>>,
  id: Option<usize>,
}

impl<Ob> SubjectSubscription<Ob> {
  pub(crate) fn new(shared: Arc<SubjectShared<Ob>>, id: usize) -> Self {
    Self { shared, id: Some(id) }
  }

  /// A handle for an observer that was never registered.
  pub(crate) fn closed(shared: Arc<SubjectShared<Ob>>) -> Self { Self { shared, id: None } }
}

impl<Ob> Subscription for SubjectSubscription<Ob> {
  fn unsubscribe(self) {
    if let Some(id) = self.id {
      let removed = self.shared.subscribers.lock().remove(id);
      drop(removed);
    }
  }

  fn is_closed(&self) -> bool {
    self
      .id
      .is_none_or(|id| !self.shared.subscribers.lock().is_active(id))
  }
}
