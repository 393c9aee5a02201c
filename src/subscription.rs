//! Subscription handles.
//!
//! A [`Subscription`] is the only cancellation mechanism in the crate:
//! disposing of a stream consumer means calling `unsubscribe` on the handle
//! returned at subscribe time.

mod boxed;
mod dynamic;
mod guard;
mod tuple;

pub use boxed::{BoxedSubscription, IntoBoxedSubscription};
pub use dynamic::DynamicSubscriptions;
pub use guard::SubscriptionGuard;
pub use tuple::TupleSubscription;

/// Subscription returned from `Observable::subscribe` to allow
/// unsubscribing.
pub trait Subscription {
  /// Deregisters the consumer before the stream has finished.
  ///
  /// Calling it on a handle that is already closed is a no-op.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Activates RAII behavior: `unsubscribe` is called when the returned guard
  /// goes out of scope.
  ///
  /// **Attention:** If you don't bind the return value to a variable,
  /// `unsubscribe()` is called immediately.
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard::new(self)
  }
}

/// The unit subscription has nothing to release. Sources that finish
/// synchronously return it.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<S: Subscription> Subscription for Option<S> {
  fn unsubscribe(self) {
    if let Some(s) = self {
      s.unsubscribe()
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Subscription::is_closed) }
}
