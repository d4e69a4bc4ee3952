use super::{DomAnchor, DomSurface};
use crate::error::OverlayResult;
use crate::geometry::Point;
use crate::state::OverlayContext;
use crate::widget::{Anchor, NoteWidget, NoteWidgetInit, PositionCallback};
use leptos::ev;
use leptos::logging::warn;
use leptos::prelude::{window_event_listener, WindowListenerHandle};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

type SharedWidget = Rc<RefCell<NoteWidget>>;

struct ElementListener {
    target: web_sys::EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl ElementListener {
    fn attach(
        target: &web_sys::EventTarget,
        event: &'static str,
        f: impl FnMut(web_sys::Event) + 'static,
    ) -> OverlayResult<Self> {
        let callback = Closure::wrap(Box::new(f) as Box<dyn FnMut(web_sys::Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }

    fn detach(self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

fn client_point(ev: &web_sys::MouseEvent) -> Point {
    Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

fn release(handles: &RefCell<Vec<WindowListenerHandle>>) {
    for h in handles.borrow_mut().drain(..) {
        h.remove();
    }
}

/// A note widget wired to its element and to window events.
///
/// Window `pointermove`/`pointerup` listeners exist only while a drag is in
/// progress. Position callbacks run inside the widget borrow and must not
/// call back into this note.
pub struct MountedNote {
    widget: SharedWidget,
    surface: DomSurface,
    element_listeners: Vec<ElementListener>,
    window_handles: Vec<WindowListenerHandle>,
    drag_handles: Rc<RefCell<Vec<WindowListenerHandle>>>,
}

impl MountedNote {
    /// Build the widget for `element`, wire its listeners and lay it out.
    ///
    /// `drag_handle` is the part of the note that starts a drag (usually its
    /// header); it must be inside `element`.
    pub fn mount(
        ctx: &OverlayContext,
        id: &str,
        anchor_selector: Option<&str>,
        position: Option<crate::position::PositionDescriptor>,
        element: web_sys::HtmlElement,
        drag_handle: &web_sys::Element,
        on_position_change: Option<PositionCallback>,
    ) -> OverlayResult<Self> {
        let anchor = anchor_selector.map(|sel| {
            Box::new(DomAnchor::by_selector(sel, ctx.config.highlight_class.clone()))
                as Box<dyn Anchor>
        });

        let surface = DomSurface::new(element);
        let mut widget = NoteWidget::new(
            NoteWidgetInit {
                id: id.to_string(),
                anchor,
                position,
            },
            Box::new(surface.clone()),
            ctx,
        );
        if let Some(cb) = on_position_change {
            widget.set_on_position_change(cb);
        }

        let mut note = Self {
            widget: Rc::new(RefCell::new(widget)),
            surface,
            element_listeners: Vec::new(),
            window_handles: Vec::new(),
            drag_handles: Rc::new(RefCell::new(Vec::new())),
        };

        if let Err(e) = note.wire(drag_handle) {
            warn!("note {id}: listener wiring failed: {e}");
            note.teardown();
            return Err(e);
        }

        note.widget.borrow_mut().update_position();
        Ok(note)
    }

    pub fn widget(&self) -> SharedWidget {
        self.widget.clone()
    }

    pub fn element(&self) -> &web_sys::HtmlElement {
        self.surface.element()
    }

    /// Swap in a new anchor (the page replaced the old element).
    pub fn reanchor(&self, selector: &str, highlight_class: &str) {
        if let Ok(mut w) = self.widget.try_borrow_mut() {
            w.update_anchor(Box::new(DomAnchor::by_selector(selector, highlight_class)));
        }
    }

    fn wire(&mut self, drag_handle: &web_sys::Element) -> OverlayResult<()> {
        let element: web_sys::EventTarget = self.surface.element().clone().into();

        // Drag start on the handle.
        let widget = self.widget.clone();
        let drag_handles = self.drag_handles.clone();
        self.element_listeners.push(ElementListener::attach(
            drag_handle,
            "pointerdown",
            move |ev| {
                let Some(ev) = ev.dyn_ref::<web_sys::MouseEvent>() else {
                    return;
                };
                if ev.button() != 0 {
                    return;
                }
                ev.prevent_default();
                start_drag(&widget, &drag_handles, client_point(ev));
            },
        )?);

        // Click anywhere on the note raises it.
        let widget = self.widget.clone();
        self.element_listeners
            .push(ElementListener::attach(&element, "pointerdown", move |_ev| {
                if let Ok(mut w) = widget.try_borrow_mut() {
                    // The handle listener already raised it.
                    if !w.is_dragging() {
                        w.bring_to_front();
                    }
                }
            })?);

        let widget = self.widget.clone();
        self.element_listeners
            .push(ElementListener::attach(&element, "focusin", move |_ev| {
                if let Ok(mut w) = widget.try_borrow_mut() {
                    w.bring_to_front();
                }
            })?);

        let widget = self.widget.clone();
        self.element_listeners
            .push(ElementListener::attach(&element, "pointerenter", move |_ev| {
                if let Ok(mut w) = widget.try_borrow_mut() {
                    w.pointer_entered();
                }
            })?);

        let widget = self.widget.clone();
        self.element_listeners
            .push(ElementListener::attach(&element, "pointerleave", move |_ev| {
                if let Ok(mut w) = widget.try_borrow_mut() {
                    w.pointer_left();
                }
            })?);

        let widget = self.widget.clone();
        self.window_handles
            .push(window_event_listener(ev::resize, move |_ev| {
                if let Ok(mut w) = widget.try_borrow_mut() {
                    w.handle_window_resize();
                }
            }));

        let widget = self.widget.clone();
        self.window_handles
            .push(window_event_listener(ev::scroll, move |_ev| {
                if let Ok(mut w) = widget.try_borrow_mut() {
                    if !w.is_dragging() {
                        w.update_position();
                    }
                }
            }));

        Ok(())
    }

    /// Cancel any drag and remove every listener. Safe to call twice.
    pub fn teardown(&mut self) {
        release(&self.drag_handles);
        for l in self.element_listeners.drain(..) {
            l.detach();
        }
        for h in self.window_handles.drain(..) {
            h.remove();
        }
        if let Ok(mut w) = self.widget.try_borrow_mut() {
            w.teardown();
        }
    }
}

impl Drop for MountedNote {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn start_drag(
    widget: &SharedWidget,
    drag_handles: &Rc<RefCell<Vec<WindowListenerHandle>>>,
    pointer: Point,
) {
    {
        let Ok(mut w) = widget.try_borrow_mut() else {
            return;
        };
        if w.is_torn_down() {
            return;
        }
        w.begin_drag(pointer);
    }

    // A lost pointerup can leave stale listeners behind.
    release(drag_handles);

    let w2 = widget.clone();
    let on_move = window_event_listener(ev::pointermove, move |ev: web_sys::PointerEvent| {
        if let Ok(mut w) = w2.try_borrow_mut() {
            w.drag_to(client_point(&ev));
        }
    });

    let w3 = widget.clone();
    let handles = drag_handles.clone();
    let on_up = window_event_listener(ev::pointerup, move |_ev: web_sys::PointerEvent| {
        if let Ok(mut w) = w3.try_borrow_mut() {
            w.end_drag();
        }
        release(&handles);
    });

    drag_handles.borrow_mut().extend([on_move, on_up]);
}
