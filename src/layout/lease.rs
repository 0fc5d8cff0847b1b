use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

/// Shared count of views currently showing a layout.
///
/// Stepping only happens while at least one [`VisibilityLease`] is alive. The
/// counter outlives engine rebuilds so a view keeps its lease across them.
#[derive(Clone, Debug, Default)]
pub struct Visibility {
    holders: Rc<Cell<usize>>,
}

impl Visibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> VisibilityLease {
        let holders = self.holders.get() + 1;
        self.holders.set(holders);
        trace!(holders, "visibility lease acquired");
        VisibilityLease {
            holders: Rc::clone(&self.holders),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.holders.get() > 0
    }
}

#[derive(Debug)]
pub struct VisibilityLease {
    holders: Rc<Cell<usize>>,
}

impl Drop for VisibilityLease {
    fn drop(&mut self) {
        let holders = self.holders.get().saturating_sub(1);
        self.holders.set(holders);
        trace!(holders, "visibility lease released");
    }
}
