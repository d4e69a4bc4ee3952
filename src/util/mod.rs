use std::cell::Cell;
use std::rc::Rc;

/// Monotonic millisecond clock used for session markers.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// `performance.now()` when available, wall clock otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> i64 {
        now_ms()
    }
}

pub fn now_ms() -> i64 {
    let perf = web_sys::window().and_then(|w| w.performance());
    match perf {
        Some(p) => p.now().round() as i64,
        None => js_sys::Date::now().round() as i64,
    }
}

/// Hand-driven clock for tests and replayed sessions.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<i64>>);

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    pub fn set(&self, ms: i64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: i64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}
