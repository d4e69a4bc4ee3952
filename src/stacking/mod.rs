use std::cell::Cell;
use std::rc::Rc;

/// Default base z-index: high enough to sit above page content, with
/// headroom below `i32::MAX` for a very long session of bring-to-front calls.
pub const DEFAULT_STACKING_BASE: i32 = 2_147_000_000;

/// Shared bring-to-front counter for one overlay.
///
/// Cloning shares the counter. Separate overlays (e.g. one per frame) each
/// construct their own authority and never collide.
#[derive(Clone, Debug)]
pub struct StackingAuthority {
    base: i32,
    current: Rc<Cell<i32>>,
}

impl StackingAuthority {
    pub fn new(base: i32) -> Self {
        Self {
            base,
            current: Rc::new(Cell::new(base)),
        }
    }

    /// Z-index for a freshly created, never-focused note.
    pub fn base(&self) -> i32 {
        self.base
    }

    pub fn current(&self) -> i32 {
        self.current.get()
    }

    /// Advance the counter and return the new top value.
    pub fn bring_to_front(&self) -> i32 {
        // Saturates rather than wrapping; reaching the ceiling needs ~480k focus
        // events in one page session.
        let next = self.current.get().saturating_add(1);
        self.current.set(next);
        next
    }
}

impl Default for StackingAuthority {
    fn default() -> Self {
        Self::new(DEFAULT_STACKING_BASE)
    }
}
