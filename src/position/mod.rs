//! How a note is positioned, in the shape the storage layer persists verbatim.

use crate::geometry::Point;
use crate::placement::Slot;
use leptos::logging::warn;
use serde::{Deserialize, Serialize};

/// Persisted placement of a note. Exactly one variant holds at a time; a note
/// with no descriptor at all uses the default top-left-with-padding placement.
///
/// The JSON shape is field-keyed, not tagged, so records written by older
/// builds (`{"x":..,"y":..}`) keep decoding:
///
/// - `{"slot":"top-right"}`
/// - `{"offsetX":140,"offsetY":140}`
/// - `{"x":100,"y":2400}`
/// - `{"pageX":10,"pageY":10}`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(untagged)]
pub enum PositionDescriptor {
    AnchorSlot {
        slot: Slot,
    },
    AnchorOffset {
        #[serde(rename = "offsetX")]
        offset_x: f64,
        #[serde(rename = "offsetY")]
        offset_y: f64,
    },
    LegacyAbsolute {
        x: f64,
        y: f64,
    },
    PageCoordinate {
        #[serde(rename = "pageX")]
        page_x: f64,
        #[serde(rename = "pageY")]
        page_y: f64,
    },
}

impl PositionDescriptor {
    pub fn slot(slot: Slot) -> Self {
        Self::AnchorSlot { slot }
    }

    pub fn anchor_offset(offset: Point) -> Self {
        Self::AnchorOffset {
            offset_x: offset.x,
            offset_y: offset.y,
        }
    }

    pub fn page(doc: Point) -> Self {
        Self::PageCoordinate {
            page_x: doc.x,
            page_y: doc.y,
        }
    }

    /// Decode a stored descriptor. Anything unrecognizable (including
    /// non-finite numbers) is treated as "no descriptor".
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }

        match serde_json::from_value::<Self>(value.clone()) {
            Ok(d) if d.is_finite() => Some(d),
            Ok(d) => {
                warn!("ignoring non-finite position descriptor: {d:?}");
                None
            }
            Err(e) => {
                warn!("ignoring malformed position descriptor {value}: {e}");
                None
            }
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            Self::AnchorSlot { .. } => true,
            Self::AnchorOffset { offset_x, offset_y } => offset_x.is_finite() && offset_y.is_finite(),
            Self::LegacyAbsolute { x, y } => x.is_finite() && y.is_finite(),
            Self::PageCoordinate { page_x, page_y } => page_x.is_finite() && page_y.is_finite(),
        }
    }
}

/// A user-established placement that overrides the slot of an anchored note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CustomPosition {
    /// Viewport offset from the anchor's top-left.
    AnchorOffset(Point),
    /// Document coordinates (pre-existing notes only).
    LegacyAbsolute(Point),
}

impl CustomPosition {
    pub fn descriptor(&self) -> PositionDescriptor {
        match *self {
            Self::AnchorOffset(p) => PositionDescriptor::anchor_offset(p),
            Self::LegacyAbsolute(p) => PositionDescriptor::LegacyAbsolute { x: p.x, y: p.y },
        }
    }

    pub fn from_descriptor(d: &PositionDescriptor) -> Option<Self> {
        match *d {
            PositionDescriptor::AnchorOffset { offset_x, offset_y } => {
                Some(Self::AnchorOffset(Point::new(offset_x, offset_y)))
            }
            PositionDescriptor::LegacyAbsolute { x, y } => {
                Some(Self::LegacyAbsolute(Point::new(x, y)))
            }
            PositionDescriptor::AnchorSlot { .. } | PositionDescriptor::PageCoordinate { .. } => {
                None
            }
        }
    }
}
