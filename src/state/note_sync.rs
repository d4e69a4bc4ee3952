use crate::models::{NoteFields, NoteSnapshot};
use crate::reconcile::{calculate_note_diff, CreateInstruction};
use crate::state::OverlayContext;
use leptos::logging::{log, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// The widget manager: builds and destroys note widgets on instruction.
pub trait NoteSink {
    fn create(&self, instruction: &CreateInstruction);
    fn update(&self, note: &NoteSnapshot);
    fn remove(&self, id: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Applied {
        created: usize,
        updated: usize,
        removed: usize,
    },
    /// An older fetch than one already applied.
    Stale,
    /// Arrived while another snapshot was being applied; dropped.
    Busy,
}

/// Local side of note synchronization for one overlay.
///
/// Responsibilities:
/// - the rendered-note map the reconciler diffs against
/// - session markers for optimistic local creates
/// - applying reconciler output to the widget manager
/// - the recurring marker purge
///
/// Non-responsibilities:
/// - fetching snapshots or talking to the backend
/// - positioning (each widget handles its own)
#[derive(Clone)]
pub struct OverlaySync {
    ctx: OverlayContext,
    sink: Rc<dyn NoteSink>,

    /// note id -> what is currently rendered.
    notes: Rc<RefCell<HashMap<String, NoteFields>>>,

    /// Snapshot guards (serialize application + ignore out-of-order fetches).
    applying: Rc<Cell<bool>>,
    last_request_id: Rc<Cell<u64>>,
    last_applied_request_id: Rc<Cell<u64>>,

    /// Purge worker.
    purge_timer_id: Rc<Cell<Option<i32>>>,
    purge_callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

/// Clears the `applying` flag however `apply_snapshot` exits.
struct ApplyingGuard(Rc<Cell<bool>>);

impl Drop for ApplyingGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl OverlaySync {
    pub fn new(ctx: OverlayContext, sink: Rc<dyn NoteSink>) -> Self {
        Self {
            ctx,
            sink,
            notes: Rc::new(RefCell::new(HashMap::new())),
            applying: Rc::new(Cell::new(false)),
            last_request_id: Rc::new(Cell::new(0)),
            last_applied_request_id: Rc::new(Cell::new(0)),
            purge_timer_id: Rc::new(Cell::new(None)),
            purge_callback: Rc::new(RefCell::new(None)),
        }
    }

    pub fn context(&self) -> &OverlayContext {
        &self.ctx
    }

    pub fn rendered_ids(&self) -> Vec<String> {
        self.notes.borrow().keys().cloned().collect()
    }

    pub fn is_rendered(&self, id: &str) -> bool {
        self.notes.borrow().contains_key(id)
    }

    /// The local UI created a note before the server knows about it.
    pub fn note_created_locally(&self, id: &str, fields: NoteFields) {
        if id.trim().is_empty() {
            return;
        }
        let now = self.ctx.clock.now_ms();
        self.ctx.session_markers.borrow_mut().mark(id, now);
        self.notes.borrow_mut().insert(id.to_string(), fields);
    }

    pub fn note_edited_locally(&self, id: &str, fields: NoteFields) {
        if let Some(existing) = self.notes.borrow_mut().get_mut(id) {
            *existing = fields;
        }
    }

    pub fn note_deleted_locally(&self, id: &str) {
        self.notes.borrow_mut().remove(id);
        self.ctx.session_markers.borrow_mut().confirm(id);
    }

    /// Issue an id for a snapshot fetch about to start.
    pub fn begin_fetch(&self) -> u64 {
        let id = self.last_request_id.get() + 1;
        self.last_request_id.set(id);
        id
    }

    /// Apply the result of the fetch started with `request_id`, unless a newer
    /// fetch has already been applied.
    pub fn apply_fetched(&self, request_id: u64, remote: &[NoteSnapshot]) -> SnapshotOutcome {
        if request_id <= self.last_applied_request_id.get() {
            warn!("dropping stale note snapshot (request {request_id})");
            return SnapshotOutcome::Stale;
        }

        let outcome = self.apply_snapshot(remote);
        if matches!(outcome, SnapshotOutcome::Applied { .. }) {
            self.last_applied_request_id.set(request_id);
        }
        outcome
    }

    /// Reconcile one complete remote snapshot (poll result or push).
    pub fn apply_snapshot(&self, remote: &[NoteSnapshot]) -> SnapshotOutcome {
        if self.applying.get() {
            warn!("note snapshot arrived while another was being applied; dropped");
            return SnapshotOutcome::Busy;
        }
        self.applying.set(true);
        let _guard = ApplyingGuard(self.applying.clone());

        let diff = {
            let notes = self.notes.borrow();
            let markers = self.ctx.session_markers.borrow();
            calculate_note_diff(&notes, remote, &markers)
        };

        {
            let mut notes = self.notes.borrow_mut();
            for c in diff.to_create.iter() {
                notes.insert(c.note_data.id.clone(), c.note_data.fields());
            }
            for u in diff.to_update.iter() {
                notes.insert(u.id.clone(), u.fields());
            }
            for id in diff.to_remove.iter() {
                notes.remove(id);
            }
        }

        {
            // Echoed back: the replication-lag guard is no longer needed.
            let mut markers = self.ctx.session_markers.borrow_mut();
            for n in remote {
                markers.confirm(&n.id);
            }
        }

        for c in diff.to_create.iter() {
            self.sink.create(c);
        }
        for u in diff.to_update.iter() {
            self.sink.update(u);
        }
        for id in diff.to_remove.iter() {
            self.sink.remove(id);
        }

        SnapshotOutcome::Applied {
            created: diff.to_create.len(),
            updated: diff.to_update.len(),
            removed: diff.to_remove.len(),
        }
    }

    /// Drop session markers past the grace period.
    pub fn purge_tick(&self) -> Vec<String> {
        let now = self.ctx.clock.now_ms();
        let grace = self.ctx.config.session_grace_ms;
        let expired = self
            .ctx
            .session_markers
            .borrow_mut()
            .purge_expired(now, grace);
        if !expired.is_empty() {
            log!("session markers expired: {}", expired.join(", "));
        }
        expired
    }

    /// Start the purge worker. Runs independently of snapshot cadence so
    /// markers expire even if no snapshot ever arrives.
    pub fn start(&self) {
        if self.purge_timer_id.get().is_some() {
            return;
        }
        let Some(win) = web_sys::window() else {
            return;
        };

        let s2 = self.clone();
        let cb = Closure::wrap(Box::new(move || {
            s2.purge_tick();
        }) as Box<dyn FnMut()>);

        match win.set_interval_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            self.ctx.config.purge_interval_ms,
        ) {
            Ok(tid) => {
                self.purge_timer_id.set(Some(tid));
                *self.purge_callback.borrow_mut() = Some(cb);
            }
            Err(e) => warn!("could not start session marker purge: {e:?}"),
        }
    }

    pub fn stop(&self) {
        if let Some(tid) = self.purge_timer_id.take() {
            if let Some(win) = web_sys::window() {
                win.clear_interval_with_handle(tid);
            }
        }
        self.purge_callback.borrow_mut().take();
    }
}
