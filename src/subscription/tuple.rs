use super::Subscription;

/// TupleSubscription that combines two subscriptions
///
/// Used by multi-source operators such as `combine_latest`; unsubscribing
/// releases both sides.
pub struct TupleSubscription<U1, U2> {
  unsub1: U1,
  unsub2: U2,
}

impl<U1, U2> TupleSubscription<U1, U2> {
  pub fn new(unsub1: U1, unsub2: U2) -> Self { TupleSubscription { unsub1, unsub2 } }
}

impl<U1, U2> Subscription for TupleSubscription<U1, U2>
where
  U1: Subscription,
  U2: Subscription,
{
  fn unsubscribe(self) {
    self.unsub1.unsubscribe();
    self.unsub2.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.unsub1.is_closed() && self.unsub2.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  };

  use super::*;

  struct MockSubscription {
    closed: Arc<AtomicBool>,
  }

  impl Subscription for MockSubscription {
    fn unsubscribe(self) { self.closed.store(true, Ordering::SeqCst); }

    fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }
  }

  #[test]
  fn unsubscribes_both() {
    let a = Arc::new(AtomicBool::new(false));
    let b = Arc::new(AtomicBool::new(false));
    let tuple = TupleSubscription::new(
      MockSubscription { closed: a.clone() },
      MockSubscription { closed: b.clone() },
    );
    assert!(!tuple.is_closed());
    tuple.unsubscribe();
    assert!(a.load(Ordering::SeqCst));
    assert!(b.load(Ordering::SeqCst));
  }
}
