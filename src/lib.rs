//! Anchor-relative positioning and remote reconciliation for on-page sticky notes.
//!
//! Notes attach to elements of arbitrary pages and must stay visually glued to
//! them across scroll, resize, reflow and SPA navigation, while the server,
//! other tabs and other collaborators change the same notes underneath.
//!
//! - [`geometry`], [`placement`], [`position`]: pure coordinate math, slot
//!   selection, and the persisted position descriptor.
//! - [`widget`]: one note's placement, drag state machine and stacking.
//! - [`session`], [`reconcile`]: the replication-lag guard and the three-way
//!   diff against a remote snapshot.
//! - [`state`]: the per-overlay context and the sync glue driving a widget
//!   manager.
//! - [`dom`]: `web-sys` implementations and event wiring.

pub mod config;
pub mod dom;
pub mod error;
pub mod geometry;
pub mod models;
pub mod placement;
pub mod position;
pub mod reconcile;
pub mod session;
pub mod stacking;
pub mod state;
pub mod util;
pub mod widget;

pub use config::OverlayConfig;
pub use error::{OverlayError, OverlayResult};
pub use geometry::{Point, Rect, Size, Viewport};
pub use models::{NoteFields, NoteSnapshot};
pub use placement::{calculate_best_position, clamp_to_viewport, Slot};
pub use position::{CustomPosition, PositionDescriptor};
pub use reconcile::{calculate_note_diff, CreateInstruction, NoteDiff};
pub use session::{purge_expired, SessionMarkers};
pub use stacking::StackingAuthority;
pub use state::{NoteSink, OverlayContext, OverlaySync, SelectionMode, SnapshotOutcome};
pub use widget::{Anchor, NoteSurface, NoteWidget, NoteWidgetInit, PositionCallback};

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
}
