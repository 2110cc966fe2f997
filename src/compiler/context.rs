//! Per-call search context

use uuid::Uuid;

use crate::entity::KindTag;
use crate::observability::SearchEvent;

/// Identity of one public search call, attached to every log line it emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchContext {
    pub search_id: Uuid,
    pub kind: KindTag,
}

impl SearchContext {
    /// Fresh context with a random search id
    pub fn new(kind: KindTag) -> Self {
        Self {
            search_id: Uuid::new_v4(),
            kind,
        }
    }

    /// Logs `event` with the search id and kind prepended to `fields`
    pub fn log(&self, event: SearchEvent, fields: &[(&str, &str)]) {
        let search_id = self.search_id.to_string();
        let mut all = Vec::with_capacity(fields.len() + 2);
        all.push(("search_id", search_id.as_str()));
        all.push(("kind", self.kind.as_str()));
        all.extend_from_slice(fields);
        event.log(&all);
    }
}
