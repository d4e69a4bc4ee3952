use crate::error::OverlayResult;
use crate::stacking::DEFAULT_STACKING_BASE;
use leptos::logging::warn;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SESSION_GRACE_MS: i64 = 30_000;
pub const DEFAULT_PURGE_INTERVAL_MS: i32 = 5_000;
pub const DEFAULT_HIGHLIGHT_CLASS: &str = "sticky-note-anchor-highlight";

/// Overlay tuning knobs.
///
/// The host page (or the extension's content script) may provide these under
/// `window.ENV.STICKY_NOTES`; every field is optional.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    /// How long a locally created note is protected from removal.
    pub session_grace_ms: i64,
    pub purge_interval_ms: i32,
    pub stacking_base: i32,
    pub highlight_class: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            session_grace_ms: DEFAULT_SESSION_GRACE_MS,
            purge_interval_ms: DEFAULT_PURGE_INTERVAL_MS,
            stacking_base: DEFAULT_STACKING_BASE,
            highlight_class: DEFAULT_HIGHLIGHT_CLASS.to_string(),
        }
    }
}

impl OverlayConfig {
    pub fn from_json(json: &str) -> OverlayResult<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        Ok(cfg.sanitized())
    }

    /// Read `window.ENV.STICKY_NOTES` (or `window.ENV.sticky_notes`), falling
    /// back to defaults when absent or unreadable.
    pub fn from_window() -> Self {
        let Some(json) = Self::window_json() else {
            return Self::default();
        };

        match Self::from_json(&json) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("{e}; using default overlay config");
                Self::default()
            }
        }
    }

    fn window_json() -> Option<String> {
        let window = web_sys::window()?;
        let env = window.get("ENV")?;
        if env.is_undefined() || !env.is_object() {
            return None;
        }

        for key in ["STICKY_NOTES", "sticky_notes"] {
            let Ok(v) = js_sys::Reflect::get(&env, &key.into()) else {
                continue;
            };
            if v.is_undefined() || v.is_null() {
                continue;
            }
            if let Some(s) = js_sys::JSON::stringify(&v).ok().and_then(|s| s.as_string()) {
                return Some(s);
            }
        }
        None
    }

    fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.session_grace_ms < 0 {
            self.session_grace_ms = d.session_grace_ms;
        }
        if self.purge_interval_ms <= 0 {
            self.purge_interval_ms = d.purge_interval_ms;
        }
        if self.stacking_base < 0 || self.stacking_base == i32::MAX {
            self.stacking_base = d.stacking_base;
        }
        if self.highlight_class.trim().is_empty() {
            self.highlight_class = d.highlight_class;
        }
        self
    }
}
