//! Multicast sources.
//!
//! - [`Subject`]: hot multicast of owned values.
//! - [`BehaviorSubject`]: a subject replaying its latest value to new
//!   subscribers.
//! - [`MutRefSubject`]: sequential broadcast of `&mut Item`.

mod behavior_subject;
mod mut_ref_subject;
mod subject_core;
mod subject_subscription;
mod subscribers;

pub use behavior_subject::BehaviorSubject;
pub use mut_ref_subject::MutRefSubject;
pub use subject_core::Subject;
pub use subject_subscription::SubjectSubscription;
