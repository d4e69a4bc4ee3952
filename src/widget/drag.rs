use super::NoteWidget;
use crate::geometry::{capture_anchor_offset, to_document, Point};
use crate::position::{CustomPosition, PositionDescriptor};

/// `Idle → Dragging → Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Pointer position minus the note's top-left at drag start.
        grab: Point,
        /// Latest descriptor produced by a move; reported on release.
        persisted: Option<PositionDescriptor>,
    },
}

impl NoteWidget {
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Pointer pressed on the drag handle.
    pub fn begin_drag(&mut self, pointer: Point) {
        if self.torn_down || self.is_dragging() {
            return;
        }

        let origin = match self.rendered {
            Some(p) => p,
            None => {
                self.update_position();
                self.rendered.unwrap_or_default()
            }
        };

        self.drag = DragState::Dragging {
            grab: pointer - origin,
            persisted: None,
        };
        self.bring_to_front();
    }

    /// Pointer moved while dragging. The note follows unclamped; the stored
    /// descriptor is derived from where it lands.
    pub fn drag_to(&mut self, pointer: Point) {
        let DragState::Dragging { grab, .. } = self.drag else {
            return;
        };

        let at = pointer - grab;
        self.apply(at);

        let descriptor = if self.is_page_level {
            let scroll = self.viewport.viewport().scroll;
            let d = PositionDescriptor::page(to_document(at, scroll));
            self.position = Some(d);
            Some(d)
        } else {
            // A detached anchor gives no frame of reference for this move.
            self.live_anchor_rect().map(|rect| {
                let offset = capture_anchor_offset(at, &rect);
                self.custom_position = Some(CustomPosition::AnchorOffset(offset));
                PositionDescriptor::anchor_offset(offset)
            })
        };

        if let (Some(d), DragState::Dragging { persisted, .. }) = (descriptor, &mut self.drag) {
            *persisted = Some(d);
        }
    }

    /// Pointer released. Reports the final descriptor if the note actually moved.
    pub fn end_drag(&mut self) {
        let DragState::Dragging { persisted, .. } = std::mem::take(&mut self.drag) else {
            return;
        };
        if let Some(d) = persisted {
            self.notify_position_change(&d);
        }
    }

    /// Abandon a drag without reporting it (teardown mid-drag).
    pub fn cancel_drag(&mut self) {
        self.drag = DragState::Idle;
    }
}
