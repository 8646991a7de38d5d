//! Interned identifier and type strings

use lasso::{Spur, ThreadedRodeo};
use lazy_static::lazy_static;
use std::fmt;

lazy_static! {
    static ref INTERNER: ThreadedRodeo = ThreadedRodeo::new();
}

/// An interned string used for all names and type tags.
///
/// Comparison and hashing operate on the interner key, so two
/// `YulString`s are equal iff their text is equal, in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct YulString(Spur);

impl YulString {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(INTERNER.get_or_intern(text.as_ref()))
    }

    pub fn as_str(self) -> &'static str {
        INTERNER.resolve(&self.0)
    }

    pub fn is_empty(self) -> bool {
        self.as_str().is_empty()
    }
}

/// The empty string, which is also the default type tag of untyped dialects
impl Default for YulString {
    fn default() -> Self {
        Self::new("")
    }
}

impl From<&str> for YulString {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for YulString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for YulString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}
