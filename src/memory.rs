use std::fmt::Display;

use log::trace;

/// Releases `value` right away instead of at the end of the enclosing scope.
///
/// Called after every batch assembly and after building a loader, bounding the peak memory
/// of the expanded tensors.
pub(crate) fn release<T>(what: impl Display, value: T) {
    drop(value);
    trace!("released {what}");
}
