use crate::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Gap between the anchor box and a slot-placed note.
pub const SLOT_GAP: f64 = 10.0;

/// Minimum distance a clamped note keeps from the viewport edges.
pub const VIEWPORT_PADDING: f64 = 10.0;

/// Named positions of a note around its anchor.
///
/// `Auto` is not a placement in itself: it asks the selector to pick one of
/// the eight concrete slots every time the note is laid out.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Slot {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Auto,
}

/// Candidates in tie-break preference order (reading-flow bias).
pub const CANDIDATE_SLOTS: [Slot; 8] = [
    Slot::BottomRight,
    Slot::BottomLeft,
    Slot::TopRight,
    Slot::TopLeft,
    Slot::BottomCenter,
    Slot::TopCenter,
    Slot::CenterRight,
    Slot::CenterLeft,
];

#[derive(Clone, Copy)]
enum Column {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy)]
enum Row {
    Top,
    Center,
    Bottom,
}

impl Slot {
    pub fn is_auto(self) -> bool {
        matches!(self, Slot::Auto)
    }

    fn grid(self) -> Option<(Column, Row)> {
        let cell = match self {
            Slot::TopLeft => (Column::Left, Row::Top),
            Slot::TopCenter => (Column::Center, Row::Top),
            Slot::TopRight => (Column::Right, Row::Top),
            Slot::CenterLeft => (Column::Left, Row::Center),
            Slot::CenterRight => (Column::Right, Row::Center),
            Slot::BottomLeft => (Column::Left, Row::Bottom),
            Slot::BottomCenter => (Column::Center, Row::Bottom),
            Slot::BottomRight => (Column::Right, Row::Bottom),
            Slot::Auto => return None,
        };
        Some(cell)
    }
}

/// Viewport top-left of a note placed at `slot` around `anchor`.
///
/// Returns `None` for `Slot::Auto`, which has no fixed geometry.
pub fn slot_origin(slot: Slot, anchor: &Rect, note: Size) -> Option<Point> {
    let (column, row) = slot.grid()?;

    let x = match column {
        Column::Left => anchor.left - note.width - SLOT_GAP,
        Column::Center => anchor.left + (anchor.width - note.width) / 2.0,
        Column::Right => anchor.right() + SLOT_GAP,
    };
    let y = match row {
        Row::Top => anchor.top - note.height - SLOT_GAP,
        Row::Center => anchor.top + (anchor.height - note.height) / 2.0,
        Row::Bottom => anchor.bottom() + SLOT_GAP,
    };

    Some(Point::new(x, y))
}

/// Pick the concrete slot that shows the most of the note.
///
/// A slot that fits entirely beats any slot that doesn't; among partial fits
/// the larger visible fraction wins; remaining ties go to the earlier entry
/// of [`CANDIDATE_SLOTS`].
pub fn calculate_best_position(anchor: &Rect, note: Size, viewport: Size) -> Slot {
    let bounds = Rect::new(0.0, 0.0, viewport.width, viewport.height);
    let area = note.area();

    let mut best = CANDIDATE_SLOTS[0];
    let mut best_score = (false, f64::MIN);

    for slot in CANDIDATE_SLOTS {
        let Some(origin) = slot_origin(slot, anchor, note) else {
            continue;
        };
        let rect = Rect::from_origin(origin, note);

        let fits = rect.is_within(&bounds);
        let visible = if area > 0.0 {
            rect.intersection_area(&bounds) / area
        } else {
            0.0
        };

        let better = match (fits, best_score.0) {
            (true, false) => true,
            (false, true) => false,
            _ => visible > best_score.1,
        };
        if better {
            best = slot;
            best_score = (fits, visible);
        }
    }

    best
}

/// Shift `(x, y)` the least amount needed to keep a `width × height` box
/// inside the padded viewport. Boxes too large for an axis pin to the padding.
pub fn clamp_to_viewport(x: f64, y: f64, width: f64, height: f64, viewport: Size) -> Point {
    fn clamp_axis(v: f64, extent: f64, limit: f64) -> f64 {
        let max = limit - extent - VIEWPORT_PADDING;
        // `f64::clamp` panics on a NaN bound.
        if max.is_nan() || max < VIEWPORT_PADDING {
            VIEWPORT_PADDING
        } else {
            v.clamp(VIEWPORT_PADDING, max)
        }
    }

    Point::new(
        clamp_axis(x, width, viewport.width),
        clamp_axis(y, height, viewport.height),
    )
}
