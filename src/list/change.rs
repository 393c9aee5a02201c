/// An item together with its position in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexed<T> {
  pub index: usize,
  pub item: T,
}

/// An in-place replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification<T> {
  pub index: usize,
  pub old: T,
  pub new: T,
}

/// An item taken out at `from` and re-inserted at `to`, where `to` is
/// counted after the removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movement<T> {
  pub from: usize,
  pub to: usize,
  pub item: T,
}

/// The change description published once per list mutation.
///
/// A published batch is never empty. Indices of `added` are final positions,
/// indices of `removed` are positions before the removal; both are listed in
/// ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBatch<T> {
  pub added: Vec<Indexed<T>>,
  pub removed: Vec<Indexed<T>>,
  pub modified: Vec<Modification<T>>,
  pub moved: Vec<Movement<T>>,
}

impl<T> Default for ListBatch<T> {
  fn default() -> Self { Self { added: vec![], removed: vec![], modified: vec![], moved: vec![] } }
}

impl<T> ListBatch<T> {
  pub(crate) fn added(added: Vec<Indexed<T>>) -> Self { Self { added, ..Self::default() } }

  pub(crate) fn removed(removed: Vec<Indexed<T>>) -> Self { Self { removed, ..Self::default() } }

  pub(crate) fn modified(modified: Vec<Modification<T>>) -> Self { Self { modified, ..Self::default() } }

  pub(crate) fn moved(moved: Movement<T>) -> Self { Self { moved: vec![moved], ..Self::default() } }

  pub fn is_empty(&self) -> bool {
    self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty() && self.moved.is_empty()
  }

  /// Number of item-level changes in the batch.
  pub fn len(&self) -> usize { self.added.len() + self.removed.len() + self.modified.len() + self.moved.len() }
}
