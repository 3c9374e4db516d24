use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier for objects in the site graph.
///
/// - `u32` keeps adjacency lists small
/// - `NonZero` lets `Option<Id>` use the niche
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    ///
    /// Panics if `index == u32::MAX`; graphs never get that large.
    pub fn from_index(index: u32) -> Self {
        match index.checked_add(1).and_then(NonZeroU32::new) {
            Some(v) => Self(v),
            None => panic!("id index overflow: {index}"),
        }
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// 0-based index as `usize`, for slice access.
    pub fn idx(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type SiteId = Id;
pub type EdgeId = Id;
