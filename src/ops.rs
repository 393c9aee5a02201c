//! Operators available on every [`Observable`](crate::observable::Observable).

pub mod combine_latest;
pub mod distinct_until_changed;
pub mod filter;
pub mod filter_map;
#[cfg(feature = "futures-stream")]
pub mod into_stream;
pub mod map;
pub mod skip;
