//! Watch event and batch types.

use serde::{Deserialize, Serialize};

/// Kind of change reported by the watch provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Added,
    Modified,
    Deleted,
    /// Progress marker carrying only a resource version.
    Bookmark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub resource_version: String,
    #[serde(default)]
    pub object: serde_json::Value,
}

impl WatchEvent {
    pub fn new(kind: EventKind, resource_version: impl Into<String>, object: serde_json::Value) -> Self {
        Self {
            kind,
            resource_version: resource_version.into(),
            object,
        }
    }

    pub fn bookmark(resource_version: impl Into<String>) -> Self {
        Self::new(EventKind::Bookmark, resource_version, serde_json::Value::Null)
    }

    pub fn is_bookmark(&self) -> bool {
        self.kind == EventKind::Bookmark
    }
}

/// Events delivered together by one read from the watch stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchBatch {
    events: Vec<WatchEvent>,
}

impl WatchBatch {
    pub fn new(events: Vec<WatchEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[WatchEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Version to checkpoint once the batch is processed: the last
    /// non-empty version in delivery order, bookmarks included.
    pub fn latest_version(&self) -> Option<&str> {
        self.events
            .iter()
            .rev()
            .map(|e| e.resource_version.as_str())
            .find(|v| !v.is_empty())
    }

    /// Events that carry work for the handler (bookmarks removed).
    pub fn into_work(self) -> Vec<WatchEvent> {
        self.events.into_iter().filter(|e| !e.is_bookmark()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn latest_version_includes_bookmarks() {
        let batch = WatchBatch::new(vec![
            WatchEvent::new(EventKind::Added, "10", json!({"name": "a"})),
            WatchEvent::bookmark("12"),
        ]);
        assert_eq!(batch.latest_version(), Some("12"));
        assert_eq!(batch.into_work().len(), 1);
    }

    #[test]
    fn latest_version_skips_empty_versions() {
        let batch = WatchBatch::new(vec![
            WatchEvent::new(EventKind::Modified, "7", json!({})),
            WatchEvent::new(EventKind::Deleted, "", json!({})),
        ]);
        assert_eq!(batch.latest_version(), Some("7"));
        assert_eq!(WatchBatch::default().latest_version(), None);
    }

    #[test]
    fn events_parse_from_provider_json() {
        let raw = r#"{"type":"MODIFIED","resource_version":"99","object":{"metadata":{"name":"pod-1"}}}"#;
        let event: WatchEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind, EventKind::Modified);
        assert_eq!(event.object["metadata"]["name"], "pod-1");
    }
}
