//! Browser-backed implementations of the capabilities the widgets consume.

mod mounted;

use crate::geometry::{Point, Rect, Size, Viewport};
use crate::state::ViewportSource;
use crate::widget::{Anchor, NoteSurface};
use std::sync::atomic::{AtomicU64, Ordering};
use wasm_bindgen::JsValue;

pub use mounted::MountedNote;

/// Attribute stamped on anchors that have no usable id.
pub const ANCHOR_ATTR: &str = "data-sticky-anchor";

static ANCHOR_COUNTER: AtomicU64 = AtomicU64::new(1);

fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

fn rect_of(el: &web_sys::Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.width(), r.height())
}

/// Anchor found by a live document query.
///
/// Holds a selector, never the element, so a removed or replaced element
/// simply stops resolving.
#[derive(Clone, Debug)]
pub struct DomAnchor {
    selector: String,
    highlight_class: String,
}

impl DomAnchor {
    pub fn by_selector(selector: impl Into<String>, highlight_class: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            highlight_class: highlight_class.into(),
        }
    }

    /// Build a lookup for an element the user just picked.
    ///
    /// Uses the element's id when it has one; otherwise stamps it with a
    /// unique [`ANCHOR_ATTR`] value and selects on that.
    pub fn for_element(el: &web_sys::Element, highlight_class: impl Into<String>) -> Self {
        let id = el.id();
        let selector = if !id.trim().is_empty() {
            format!("#{}", web_sys::css::escape(&id))
        } else {
            let stamp = match el.get_attribute(ANCHOR_ATTR) {
                Some(s) if !s.is_empty() => s,
                _ => {
                    let s = ANCHOR_COUNTER.fetch_add(1, Ordering::SeqCst).to_string();
                    let _ = el.set_attribute(ANCHOR_ATTR, &s);
                    s
                }
            };
            format!("[{ANCHOR_ATTR}=\"{stamp}\"]")
        };
        Self::by_selector(selector, highlight_class)
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    fn resolve(&self) -> Option<web_sys::Element> {
        document()?
            .query_selector(&self.selector)
            .ok()
            .flatten()
            .filter(|el| el.is_connected())
    }
}

impl Anchor for DomAnchor {
    fn bounding_rect(&self) -> Option<Rect> {
        self.resolve().map(|el| rect_of(&el))
    }

    fn is_attached(&self) -> bool {
        self.resolve().is_some()
    }

    fn set_highlighted(&self, on: bool) {
        let Some(el) = self.resolve() else {
            return;
        };
        let classes = el.class_list();
        let _ = if on {
            classes.add_1(&self.highlight_class)
        } else {
            classes.remove_1(&self.highlight_class)
        };
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WindowViewport;

impl ViewportSource for WindowViewport {
    fn viewport(&self) -> Viewport {
        let Some(win) = web_sys::window() else {
            return Viewport::default();
        };
        let num = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);

        Viewport {
            width: num(win.inner_width()),
            height: num(win.inner_height()),
            scroll: Point::new(win.scroll_x().unwrap_or(0.0), win.scroll_y().unwrap_or(0.0)),
        }
    }
}

/// A `position: fixed` note element.
#[derive(Clone, Debug)]
pub struct DomSurface {
    element: web_sys::HtmlElement,
}

impl DomSurface {
    pub fn new(element: web_sys::HtmlElement) -> Self {
        let _ = element.style().set_property("position", "fixed");
        Self { element }
    }

    pub fn element(&self) -> &web_sys::HtmlElement {
        &self.element
    }
}

impl NoteSurface for DomSurface {
    fn place(&self, at: Point) {
        let style = self.element.style();
        let _ = style.set_property("left", &format!("{}px", at.x));
        let _ = style.set_property("top", &format!("{}px", at.y));
    }

    fn set_z_index(&self, z: i32) {
        let _ = self.element.style().set_property("z-index", &z.to_string());
    }

    fn measure(&self) -> Size {
        rect_of(&self.element).size()
    }
}
