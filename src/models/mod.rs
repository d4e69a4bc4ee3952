use serde::{Deserialize, Serialize};

/// One note as delivered by the server-of-record.
///
/// Only `id`, `content` and `theme` take part in reconciliation. Everything
/// else the backend sends is carried through untouched so the widget manager
/// can still read it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NoteSnapshot {
    pub id: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub theme: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NoteSnapshot {
    pub fn new(id: impl Into<String>, content: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            theme: theme.into(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn fields(&self) -> NoteFields {
        NoteFields {
            content: self.content.clone(),
            theme: self.theme.clone(),
        }
    }
}

/// What the local side remembers about a rendered note for diffing.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub content: String,
    pub theme: String,
}

impl NoteFields {
    pub fn new(content: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            theme: theme.into(),
        }
    }
}
