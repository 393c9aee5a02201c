//! # rxstate: reactive state propagation
//!
//! Observable object properties, property paths that survive their links
//! changing, and lists that publish exact change batches and can be derived
//! incrementally. Everything is synchronous: a mutation notifies its
//! subscribers on the calling thread before it returns.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxstate::prelude::*;
//!
//! static TODO: ObjectType = ObjectType::new("Todo");
//! static DONE: Property<bool> = Property::new(&TODO, "done");
//!
//! let todo = ReactiveObject::new(&TODO);
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! todo
//!   .observe(&DONE)
//!   .unwrap()
//!   .subscribe(move |done| c_seen.lock().unwrap().push(done));
//! todo.set(&DONE, true).unwrap();
//!
//! let todos = ReactiveList::from(vec![todo.clone()]);
//! let done = todos.derive(|t: &ReactiveObject| t.get(&DONE).unwrap_or_default());
//!
//! assert_eq!(*seen.lock().unwrap(), vec![false, true]);
//! assert_eq!(done.snapshot(), vec![true]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ReactiveObject`] | Property storage with "changing"/"changed" notification |
//! | [`PropertyPath`] | A chain of object-valued links ending at a property |
//! | [`ReactiveList`] | A list publishing one [`ListBatch`] per mutation |
//! | [`DerivedList`] | A list kept equal to another one mapped through a selector |
//! | [`Observable`] | The core trait every stream implements |
//! | [`Subscription`] | Handle to cancel an active subscription |
//!
//! ## Feature Flags
//!
//! - **`futures-stream`** (default): `Observable::into_stream`, an adapter to
//!   `futures::Stream`
//!
//! [`ReactiveObject`]: object::ReactiveObject
//! [`PropertyPath`]: path::PropertyPath
//! [`ReactiveList`]: list::ReactiveList
//! [`ListBatch`]: list::ListBatch
//! [`DerivedList`]: list::DerivedList
//! [`Observable`]: observable::Observable
//! [`Subscription`]: subscription::Subscription

pub mod error;
pub mod list;
pub mod object;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod path;
pub mod prelude;
pub mod property;
pub mod store;
pub mod stream;
pub mod subject;
pub mod subscription;

pub use error::{Error, Result};
// Re-export the prelude module
pub use prelude::*;

// Bring the README into Cargo-driven doctests.
#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
