pub mod note_sync;

use crate::config::OverlayConfig;
use crate::geometry::Viewport;
use crate::session::SessionMarkers;
use crate::stacking::StackingAuthority;
use crate::util::{BrowserClock, Clock};
use leptos::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

pub use note_sync::{NoteSink, OverlaySync, SnapshotOutcome};

/// Source of live viewport measurements (size and scroll).
pub trait ViewportSource {
    fn viewport(&self) -> Viewport;
}

/// Global "pick an element" mode. While active it owns hover feedback, so
/// notes must not highlight their anchors.
#[derive(Clone, Copy, Debug)]
pub struct SelectionMode(RwSignal<bool>);

impl Default for SelectionMode {
    fn default() -> Self {
        Self(RwSignal::new(false))
    }
}

impl SelectionMode {
    pub fn is_active(&self) -> bool {
        self.0.get_untracked()
    }

    pub fn set_active(&self, active: bool) {
        self.0.set(active);
    }

    /// The underlying flag, for UI that toggles or observes the mode.
    pub fn signal(&self) -> RwSignal<bool> {
        self.0
    }
}

/// Everything one note overlay shares between its widgets and its sync glue.
///
/// Cloning is cheap and shares state. Independent overlays (e.g. one per
/// frame) each build their own context.
#[derive(Clone)]
pub struct OverlayContext {
    pub config: Rc<OverlayConfig>,
    pub stacking: StackingAuthority,
    pub selection_mode: SelectionMode,
    pub session_markers: Rc<RefCell<SessionMarkers>>,
    pub clock: Rc<dyn Clock>,
    pub viewport: Rc<dyn ViewportSource>,
}

impl OverlayContext {
    pub fn new(config: OverlayConfig, clock: Rc<dyn Clock>, viewport: Rc<dyn ViewportSource>) -> Self {
        Self {
            stacking: StackingAuthority::new(config.stacking_base),
            config: Rc::new(config),
            selection_mode: SelectionMode::default(),
            session_markers: Rc::new(RefCell::new(SessionMarkers::new())),
            clock,
            viewport,
        }
    }

    /// Context backed by the real browser window, configured from `window.ENV`.
    pub fn from_window() -> Self {
        Self::new(
            OverlayConfig::from_window(),
            Rc::new(BrowserClock),
            Rc::new(crate::dom::WindowViewport),
        )
    }
}
