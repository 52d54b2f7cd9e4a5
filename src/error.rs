//! Error types for checked map access.

use core::fmt;

/// Returned by checked lookups such as [`HashMap::try_get`] when the key is
/// not present.
///
/// Every other kind of miss (inserting a key that already exists, removing
/// one that does not, a plain lookup that finds nothing) is reported through
/// `bool` or `Option` instead.
///
/// [`HashMap::try_get`]: crate::HashMap::try_get
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyNotFound;

impl fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not found")
    }
}

impl core::error::Error for KeyNotFound {}
