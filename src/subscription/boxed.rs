use super::Subscription;

/// Helper trait for calling unsubscribe on boxed trait objects
///
/// Since `Subscription::unsubscribe(self)` requires `Sized`, we need this
/// workaround trait to enable `Box<dyn Subscription>` to call unsubscribe.
pub trait BoxedSubscriptionInner {
  fn boxed_unsubscribe(self: Box<Self>);
  fn boxed_is_closed(&self) -> bool;
}

impl<T: Subscription> BoxedSubscriptionInner for T {
  #[inline]
  fn boxed_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn boxed_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased, thread-safe subscription.
///
/// Reactive objects keep their registered disposables and path observers keep
/// their per-level subscriptions in this form, so heterogeneous handles can
/// live in one collection.
///
/// # Examples
///
/// ```rust
/// use rxstate::prelude::*;
///
/// let subs: Vec<BoxedSubscription> = vec![BoxedSubscription::new(()), BoxedSubscription::new(())];
/// for sub in subs {
///   sub.unsubscribe();
/// }
/// ```
pub struct BoxedSubscription(Box<dyn BoxedSubscriptionInner + Send>);

impl BoxedSubscription {
  /// Create a new boxed subscription from any `Send` subscription type.
  #[inline]
  pub fn new(subscription: impl Subscription + Send + 'static) -> Self {
    Self(Box::new(subscription))
  }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}

/// Trait for converting a subscription into a boxed subscription.
pub trait IntoBoxedSubscription {
  fn into_boxed(self) -> BoxedSubscription;
}

impl<T: Subscription + Send + 'static> IntoBoxedSubscription for T {
  #[inline]
  fn into_boxed(self) -> BoxedSubscription { BoxedSubscription::new(self) }
}

impl std::fmt::Debug for BoxedSubscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BoxedSubscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}
