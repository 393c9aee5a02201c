use smallvec::SmallVec;

/// A container for items with ID-based tracking.
///
/// Subjects use it to hold their observers in subscription order; the ID a
/// subscriber receives is what its handle later removes.
///
/// Uses `SmallVec<[_; 2]>` to avoid heap allocation for the common case of
/// 0-2 items.
///
/// # Examples
///
/// ```rust
/// use rxstate::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<()> = DynamicSubscriptions::default();
///
/// let id1 = subs.add(());
/// assert_eq!(subs.len(), 1);
///
/// let id2 = subs.add(());
/// assert_ne!(id1, id2);
/// assert_eq!(subs.len(), 2);
///
/// assert!(subs.remove(id1).is_some());
/// assert_eq!(subs.len(), 1);
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  /// Create an empty container.
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its unique ID.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.reserve_id();
    self.items.push((id, item));
    id
  }

  #[inline]
  fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Remove an item by ID.
  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  /// Check if an ID exists in the container.
  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Drain all items.
  #[inline]
  pub fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.items.drain(..).map(|(_, item)| item)
  }

  /// Iterate over all items mutably, together with their IDs.
  #[inline]
  pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut U)> {
    self.items.iter_mut().map(|(id, item)| (*id, item))
  }

  /// IDs of the stored items, in order.
  pub(crate) fn ids(&self) -> impl Iterator<Item = usize> + '_ { self.items.iter().map(|(id, _)| *id) }

  /// Moves every item of `other` behind the items of `self`. IDs are kept,
  /// so `other` must come from the same ID sequence.
  pub(crate) fn append(&mut self, other: &mut Self) {
    self.next_id = self.next_id.max(other.next_id);
    self.items.extend(other.items.drain(..));
  }

  /// Swaps the items out, leaving an empty container that continues the same
  /// ID sequence.
  pub(crate) fn take_items(&mut self) -> Self {
    Self { next_id: self.next_id, items: std::mem::take(&mut self.items) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn removal_keeps_the_order_of_the_rest() {
    let mut subs = DynamicSubscriptions::new();
    let a = subs.add('a');
    let b = subs.add('b');
    let c = subs.add('c');
    assert_eq!(subs.remove(b), Some('b'));
    let order: Vec<_> = subs.iter_mut().map(|(_, v)| *v).collect();
    assert_eq!(order, vec!['a', 'c']);
    assert!(subs.contains(a) && subs.contains(c) && !subs.contains(b));
  }

  #[test]
  fn take_items_continues_ids() {
    let mut subs = DynamicSubscriptions::new();
    let first = subs.add(1);
    let mut taken = subs.take_items();
    let second = subs.add(2);
    assert_ne!(first, second);
    taken.append(&mut subs);
    assert_eq!(taken.len(), 2);
    assert!(subs.is_empty());
  }
}
