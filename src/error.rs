use thiserror::Error;

/// Usage errors reported by reactive objects, property paths and lists.
///
/// They are returned synchronously from the call that caused them. The only
/// errors delivered through a stream are those of a property path reaching an
/// intermediate object it cannot observe (a foreign or disposed object), which
/// only exists once the path is being observed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("property '{property}' does not belong to objects of type '{object}'")]
  PropertyMismatch { property: String, object: &'static str },
  #[error("index {index} is out of range for a list of length {len}")]
  IndexOutOfRange { index: usize, len: usize },
  #[error("the reactive object has been disposed")]
  Disposed,
}

pub type Result<T> = std::result::Result<T, Error>;
