//! Positioning and stacking for a single note.
//!
//! A widget never owns the element it is attached to. It reaches it through
//! an [`Anchor`] capability and re-validates liveness on every use, because
//! host pages replace and remove their own DOM all the time. Every geometry
//! read happens at call time; nothing about the anchor is cached.

mod drag;

use crate::geometry::{replay_anchor_offset, to_viewport, Point, Rect, Size};
use crate::placement::{calculate_best_position, slot_origin, Slot, VIEWPORT_PADDING};
use crate::position::{CustomPosition, PositionDescriptor};
use crate::stacking::StackingAuthority;
use crate::state::{OverlayContext, SelectionMode, ViewportSource};
use leptos::logging::warn;
use std::rc::Rc;

pub use drag::DragState;

/// Document point used when a note has nothing better to go on.
pub const DEFAULT_PAGE_POINT: Point = Point::new(VIEWPORT_PADDING, VIEWPORT_PADDING);

/// Slot a note falls back to after being re-anchored.
pub const REANCHOR_SLOT: Slot = Slot::TopRight;

/// Non-owning handle to the element a note is attached to.
pub trait Anchor {
    /// Live bounding box in viewport space, or `None` once the element is gone.
    fn bounding_rect(&self) -> Option<Rect>;

    /// Still part of the document.
    fn is_attached(&self) -> bool;

    fn set_highlighted(&self, on: bool);
}

/// The on-screen element that renders the note.
pub trait NoteSurface {
    /// Move the note's top-left to `at` (viewport space).
    fn place(&self, at: Point);

    fn set_z_index(&self, z: i32);

    /// Current rendered size of the note.
    fn measure(&self) -> Size;
}

pub type PositionCallback = Rc<dyn Fn(&PositionDescriptor)>;

pub struct NoteWidgetInit {
    pub id: String,
    /// `None` makes this a page-level note.
    pub anchor: Option<Box<dyn Anchor>>,
    /// Stored descriptor, if any.
    pub position: Option<PositionDescriptor>,
}

/// Resolved "where should this note go" after applying override precedence.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Placement {
    Legacy(Point),
    Offset(Point),
    Slot(Slot),
    Page(Option<Point>),
}

pub struct NoteWidget {
    id: String,
    anchor: Option<Box<dyn Anchor>>,
    is_page_level: bool,
    position: Option<PositionDescriptor>,
    custom_position: Option<CustomPosition>,
    z_index: i32,
    drag: DragState,
    rendered: Option<Point>,
    highlighted: bool,
    torn_down: bool,

    surface: Box<dyn NoteSurface>,
    viewport: Rc<dyn ViewportSource>,
    stacking: StackingAuthority,
    selection_mode: SelectionMode,
    on_position_change: Option<PositionCallback>,
}

impl NoteWidget {
    pub fn new(init: NoteWidgetInit, surface: Box<dyn NoteSurface>, ctx: &OverlayContext) -> Self {
        let NoteWidgetInit {
            id,
            anchor,
            position,
        } = init;
        let is_page_level = anchor.is_none();

        let mut custom_position = None;
        let position = match position {
            Some(d) => match CustomPosition::from_descriptor(&d) {
                Some(CustomPosition::AnchorOffset(_)) if is_page_level => {
                    warn!("note {id}: anchor offset on a page-level note, using default placement");
                    None
                }
                Some(custom) => {
                    custom_position = Some(custom);
                    None
                }
                None => match d {
                    PositionDescriptor::AnchorSlot { .. } if is_page_level => None,
                    _ => Some(d),
                },
            },
            None => None,
        };

        let z_index = ctx.stacking.base();
        surface.set_z_index(z_index);

        Self {
            id,
            anchor,
            is_page_level,
            position,
            custom_position,
            z_index,
            drag: DragState::Idle,
            rendered: None,
            highlighted: false,
            torn_down: false,
            surface,
            viewport: ctx.viewport.clone(),
            stacking: ctx.stacking.clone(),
            selection_mode: ctx.selection_mode,
            on_position_change: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_page_level(&self) -> bool {
        self.is_page_level
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn position(&self) -> Option<PositionDescriptor> {
        self.position
    }

    pub fn custom_position(&self) -> Option<CustomPosition> {
        self.custom_position
    }

    /// The descriptor the storage layer should hold for this note.
    pub fn persisted_descriptor(&self) -> Option<PositionDescriptor> {
        self.custom_position
            .map(|c| c.descriptor())
            .or(self.position)
    }

    /// Last viewport position applied to the surface.
    pub fn rendered(&self) -> Option<Point> {
        self.rendered
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn set_on_position_change(&mut self, cb: PositionCallback) {
        self.on_position_change = Some(cb);
    }

    fn notify_position_change(&self, descriptor: &PositionDescriptor) {
        if let Some(cb) = self.on_position_change.as_ref() {
            cb(descriptor);
        }
    }

    /// Anchor rect if the anchor exists and is still in the document.
    fn live_anchor_rect(&self) -> Option<Rect> {
        let anchor = self.anchor.as_ref()?;
        if !anchor.is_attached() {
            return None;
        }
        anchor.bounding_rect()
    }

    fn placement(&self) -> Placement {
        if let Some(custom) = self.custom_position {
            return match custom {
                CustomPosition::LegacyAbsolute(p) => Placement::Legacy(p),
                CustomPosition::AnchorOffset(p) => Placement::Offset(p),
            };
        }

        match self.position {
            None => Placement::Page(None),
            Some(PositionDescriptor::PageCoordinate { page_x, page_y }) => {
                Placement::Page(Some(Point::new(page_x, page_y)))
            }
            Some(_) if self.is_page_level => Placement::Page(None),
            Some(PositionDescriptor::AnchorSlot { slot }) => Placement::Slot(slot),
            Some(PositionDescriptor::AnchorOffset { offset_x, offset_y }) => {
                Placement::Offset(Point::new(offset_x, offset_y))
            }
            Some(PositionDescriptor::LegacyAbsolute { x, y }) => Placement::Legacy(Point::new(x, y)),
        }
    }

    /// Page-level coordinates, used directly by page notes and as the fallback
    /// for anchored notes whose anchor has vanished.
    fn page_point(&self) -> Point {
        match self.position {
            Some(PositionDescriptor::PageCoordinate { page_x, page_y }) => Point::new(page_x, page_y),
            _ => DEFAULT_PAGE_POINT,
        }
    }

    fn compute_position(&self) -> Point {
        let vp = self.viewport.viewport();
        let fallback = || to_viewport(self.page_point(), vp.scroll);

        match self.placement() {
            Placement::Legacy(doc) => to_viewport(doc, vp.scroll),
            Placement::Offset(offset) => match self.live_anchor_rect() {
                Some(rect) => replay_anchor_offset(offset, &rect),
                None => fallback(),
            },
            Placement::Slot(slot) => {
                let Some(rect) = self.live_anchor_rect() else {
                    return fallback();
                };
                let size = self.surface.measure();
                let slot = if slot.is_auto() {
                    calculate_best_position(&rect, size, vp.size())
                } else {
                    slot
                };
                slot_origin(slot, &rect, size).unwrap_or_else(fallback)
            }
            Placement::Page(p) => to_viewport(p.unwrap_or(DEFAULT_PAGE_POINT), vp.scroll),
        }
    }

    fn apply(&mut self, at: Point) {
        self.rendered = Some(at);
        self.surface.place(at);
    }

    /// Recompute the viewport position from the current descriptor and live
    /// geometry, and apply it. Idempotent.
    pub fn update_position(&mut self) {
        if self.torn_down {
            return;
        }
        let at = self.compute_position();
        self.apply(at);
    }

    /// Window resized. Legacy absolute placements stay where they are in the
    /// document; everything else is recomputed.
    pub fn handle_window_resize(&mut self) {
        if self.torn_down {
            return;
        }
        if self.is_page_level {
            self.update_position();
            return;
        }

        match self.placement() {
            Placement::Legacy(_) => {}
            Placement::Offset(_) | Placement::Slot(_) | Placement::Page(_) => {
                self.update_position()
            }
        }
    }

    /// Attach the note to a different element.
    ///
    /// Any custom placement is dropped: an offset measured against the old
    /// anchor means nothing against the new one.
    pub fn update_anchor(&mut self, anchor: Box<dyn Anchor>) {
        if self.torn_down {
            return;
        }
        if self.highlighted {
            self.clear_highlight();
        }

        self.anchor = Some(anchor);
        self.is_page_level = false;
        self.custom_position = None;

        let reset = PositionDescriptor::slot(REANCHOR_SLOT);
        self.position = Some(reset);
        self.notify_position_change(&reset);

        self.update_position();
    }

    pub fn bring_to_front(&mut self) {
        if self.torn_down {
            return;
        }
        self.z_index = self.stacking.bring_to_front();
        self.surface.set_z_index(self.z_index);
    }

    fn highlightable_anchor(&self) -> Option<&dyn Anchor> {
        if self.selection_mode.is_active() {
            return None;
        }
        let anchor = self.anchor.as_deref()?;
        anchor.is_attached().then_some(anchor)
    }

    pub fn pointer_entered(&mut self) {
        if self.torn_down {
            return;
        }
        if let Some(anchor) = self.highlightable_anchor() {
            anchor.set_highlighted(true);
            self.highlighted = true;
        }
    }

    pub fn pointer_left(&mut self) {
        if let Some(anchor) = self.highlightable_anchor() {
            anchor.set_highlighted(false);
            self.highlighted = false;
        }
    }

    fn clear_highlight(&mut self) {
        if let Some(anchor) = self.anchor.as_deref() {
            if anchor.is_attached() {
                anchor.set_highlighted(false);
            }
        }
        self.highlighted = false;
    }

    /// Final cleanup before the note is removed. Cancels an in-flight drag
    /// without reporting it.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.cancel_drag();
        if self.highlighted {
            self.clear_highlight();
        }
        self.torn_down = true;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_named_slot_uses_fixed_geometry() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(300.0, 300.0, 100.0, 40.0));
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = anchored(&ctx, &anchor, &surface, Some(PositionDescriptor::slot(Slot::BottomRight)));

        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(410.0, 350.0)));
    }

    #[test]
    fn test_auto_slot_runs_selector_against_live_rect() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(500.0, 700.0, 100.0, 40.0));
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = anchored(&ctx, &anchor, &surface, Some(PositionDescriptor::slot(Slot::Auto)));

        w.update_position();
        // Bottom row would overflow; top-right is next in preference.
        assert_eq!(surface.placed.get(), Some(Point::new(610.0, 570.0)));
    }

    #[test]
    fn test_update_position_is_idempotent() {
        let vp = FakeViewport::new(1280.0, 800.0);
        vp.scroll_to(0.0, 250.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(120.0, 80.0, 60.0, 20.0));
        let surface = FakeSurface::sized(180.0, 90.0);
        let mut w = anchored(&ctx, &anchor, &surface, Some(PositionDescriptor::slot(Slot::Auto)));

        w.update_position();
        let first = surface.placed.get();
        w.update_position();
        assert_eq!(surface.placed.get(), first);
        assert_eq!(w.rendered(), first);
    }

    #[test]
    fn test_offset_chases_anchor_across_scroll() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(50.0, 50.0, 100.0, 20.0));
        let surface = FakeSurface::sized(200.0, 120.0);
        let stored = PositionDescriptor::anchor_offset(Point::new(140.0, 140.0));
        let mut w = anchored(&ctx, &anchor, &surface, Some(stored));

        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(190.0, 190.0)));

        vp.scroll_to(0.0, 100.0);
        anchor.rect.set(Some(Rect::new(50.0, -50.0, 100.0, 20.0)));
        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(190.0, 90.0)));
    }

    #[test]
    fn test_legacy_absolute_uses_scroll_and_ignores_resize() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(50.0, 50.0, 100.0, 20.0));
        let surface = FakeSurface::sized(200.0, 120.0);
        let legacy = PositionDescriptor::LegacyAbsolute { x: 100.0, y: 2400.0 };
        let mut w = anchored(&ctx, &anchor, &surface, Some(legacy));

        vp.scroll_to(0.0, 2000.0);
        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(100.0, 400.0)));

        // Scroll and resize; only an explicit update moves a legacy note.
        vp.scroll_to(0.0, 2100.0);
        vp.resize(800.0, 600.0);
        w.handle_window_resize();
        assert_eq!(surface.placed.get(), Some(Point::new(100.0, 400.0)));

        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(100.0, 300.0)));
    }

    #[test]
    fn test_resize_recomputes_offset_and_slot_placements() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(50.0, 50.0, 100.0, 20.0));
        let surface = FakeSurface::sized(200.0, 120.0);

        let mut offset = anchored(
            &ctx,
            &anchor,
            &surface,
            Some(PositionDescriptor::anchor_offset(Point::new(10.0, 30.0))),
        );
        offset.update_position();
        anchor.rect.set(Some(Rect::new(20.0, 60.0, 100.0, 20.0)));
        offset.handle_window_resize();
        assert_eq!(surface.placed.get(), Some(Point::new(30.0, 90.0)));

        let slot_surface = FakeSurface::sized(200.0, 120.0);
        let mut slotted = anchored(
            &ctx,
            &anchor,
            &slot_surface,
            Some(PositionDescriptor::slot(Slot::BottomLeft)),
        );
        slotted.update_position();
        anchor.rect.set(Some(Rect::new(400.0, 60.0, 100.0, 20.0)));
        slotted.handle_window_resize();
        assert_eq!(slot_surface.placed.get(), Some(Point::new(190.0, 90.0)));
    }

    #[test]
    fn test_auto_slot_reselects_after_viewport_shrinks() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(500.0, 300.0, 100.0, 40.0));
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = anchored(&ctx, &anchor, &surface, Some(PositionDescriptor::slot(Slot::Auto)));

        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(610.0, 350.0)));

        // Bottom row and right column no longer fit; top-left does.
        vp.resize(700.0, 400.0);
        w.handle_window_resize();
        assert_eq!(surface.placed.get(), Some(Point::new(290.0, 170.0)));
        assert_eq!(w.position(), Some(PositionDescriptor::slot(Slot::Auto)));
    }

    #[test]
    fn test_page_level_note_recomputes_on_resize() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = page_level(&ctx, &surface, Some(PositionDescriptor::page(Point::new(300.0, 900.0))));

        vp.scroll_to(0.0, 500.0);
        w.handle_window_resize();
        assert_eq!(surface.placed.get(), Some(Point::new(300.0, 400.0)));
    }

    #[test]
    fn test_missing_descriptor_defaults_to_padded_top_left() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = page_level(&ctx, &surface, None);
        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(10.0, 10.0)));

        let anchor = FakeAnchor::at(Rect::new(400.0, 400.0, 10.0, 10.0));
        let anchored_surface = FakeSurface::sized(200.0, 120.0);
        let mut a = anchored(&ctx, &anchor, &anchored_surface, None);
        a.update_position();
        assert_eq!(anchored_surface.placed.get(), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_detached_anchor_degrades_to_page_fallback() {
        let vp = FakeViewport::new(1280.0, 800.0);
        vp.scroll_to(0.0, 4.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(50.0, 50.0, 100.0, 20.0));
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = anchored(
            &ctx,
            &anchor,
            &surface,
            Some(PositionDescriptor::anchor_offset(Point::new(5.0, 5.0))),
        );

        anchor.detach();
        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(10.0, 6.0)));

        let slotted_surface = FakeSurface::sized(200.0, 120.0);
        let mut s = anchored(&ctx, &anchor, &slotted_surface, Some(PositionDescriptor::slot(Slot::Auto)));
        s.update_position();
        assert_eq!(slotted_surface.placed.get(), Some(Point::new(10.0, 6.0)));
    }

    #[test]
    fn test_update_anchor_resets_to_top_right_and_reports() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let old = FakeAnchor::at(Rect::new(50.0, 50.0, 100.0, 20.0));
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = anchored(
            &ctx,
            &old,
            &surface,
            Some(PositionDescriptor::anchor_offset(Point::new(140.0, 140.0))),
        );
        let (cb, seen) = recorder();
        w.set_on_position_change(cb);

        let new_anchor = FakeAnchor::at(Rect::new(300.0, 300.0, 100.0, 40.0));
        w.update_anchor(Box::new(new_anchor.clone()));

        assert!(w.custom_position().is_none());
        assert_eq!(w.position(), Some(PositionDescriptor::slot(Slot::TopRight)));
        assert_eq!(*seen.borrow(), vec![PositionDescriptor::slot(Slot::TopRight)]);
        assert_eq!(surface.placed.get(), Some(Point::new(410.0, 170.0)));
    }

    #[test]
    fn test_page_level_note_becomes_anchored_on_update_anchor() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = page_level(&ctx, &surface, Some(PositionDescriptor::page(Point::new(40.0, 40.0))));
        assert!(w.is_page_level());

        let anchor = FakeAnchor::at(Rect::new(300.0, 300.0, 100.0, 40.0));
        w.update_anchor(Box::new(anchor));
        assert!(!w.is_page_level());
        assert_eq!(w.persisted_descriptor(), Some(PositionDescriptor::slot(Slot::TopRight)));
    }

    #[test]
    fn test_hover_highlight_requires_live_anchor_and_no_selection_mode() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(50.0, 50.0, 100.0, 20.0));
        let surface = FakeSurface::sized(200.0, 120.0);
        let mut w = anchored(&ctx, &anchor, &surface, None);

        w.pointer_entered();
        assert!(anchor.highlighted.get());
        w.pointer_left();
        assert!(!anchor.highlighted.get());

        ctx.selection_mode.set_active(true);
        w.pointer_entered();
        assert!(!anchor.highlighted.get());
        ctx.selection_mode.set_active(false);

        anchor.attached.set(false);
        w.pointer_entered();
        assert!(!anchor.highlighted.get());

        let mut page = page_level(&ctx, &FakeSurface::sized(10.0, 10.0), None);
        page.pointer_entered();
        page.pointer_left();
    }

    #[test]
    fn test_new_widgets_start_at_base_and_focus_raises() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let s1 = FakeSurface::sized(10.0, 10.0);
        let s2 = FakeSurface::sized(10.0, 10.0);
        let mut a = page_level(&ctx, &s1, None);
        let mut b = page_level(&ctx, &s2, None);
        assert_eq!((a.z_index(), b.z_index()), (1000, 1000));
        assert_eq!(s1.z.get(), 1000);

        a.bring_to_front();
        b.bring_to_front();
        assert_eq!(a.z_index(), 1001);
        assert_eq!(b.z_index(), 1002);
        assert_eq!(s2.z.get(), 1002);

        a.bring_to_front();
        assert!(a.z_index() > b.z_index());

        // A third note created now still stacks below everything touched.
        let c = page_level(&ctx, &FakeSurface::sized(10.0, 10.0), None);
        assert_eq!(c.z_index(), 1000);
    }

    #[test]
    fn test_bring_to_front_after_teardown_is_noop() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let surface = FakeSurface::sized(10.0, 10.0);
        let mut w = page_level(&ctx, &surface, None);
        w.teardown();
        w.bring_to_front();
        assert_eq!(w.z_index(), 1000);
        assert_eq!(ctx.stacking.current(), 1000);
    }

    #[test]
    fn test_teardown_clears_highlight() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let anchor = FakeAnchor::at(Rect::new(50.0, 50.0, 100.0, 20.0));
        let mut w = anchored(&ctx, &anchor, &FakeSurface::sized(10.0, 10.0), None);
        w.pointer_entered();
        w.teardown();
        assert!(!anchor.highlighted.get());
        assert!(w.is_torn_down());
    }

    #[test]
    fn test_page_level_ignores_anchor_only_descriptors() {
        let vp = FakeViewport::new(1280.0, 800.0);
        let ctx = context(&vp);
        let surface = FakeSurface::sized(10.0, 10.0);
        let mut w = page_level(
            &ctx,
            &surface,
            Some(PositionDescriptor::anchor_offset(Point::new(400.0, 400.0))),
        );
        w.update_position();
        assert_eq!(surface.placed.get(), Some(Point::new(10.0, 10.0)));
        assert!(w.persisted_descriptor().is_none());
    }
}
