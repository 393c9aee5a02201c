use super::Subscription;

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(Some(subscription)) }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe()
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;

  struct Counting(Arc<AtomicUsize>);

  impl Subscription for Counting {
    fn unsubscribe(self) { self.0.fetch_add(1, Ordering::SeqCst); }

    fn is_closed(&self) -> bool { false }
  }

  #[test]
  fn drop_unsubscribes_once() {
    let count = Arc::new(AtomicUsize::new(0));
    {
      let _guard = Counting(count.clone()).unsubscribe_when_dropped();
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }
}
