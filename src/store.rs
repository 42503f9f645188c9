// In-memory record store shared by the console actions

use crate::record::Consultation;
use tracing::debug;

/// Change notification delivered to store subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Full list and filtered subset were replaced by a fetch
    Replaced { count: usize },
    /// Filtered subset was re-evaluated
    Filtered { count: usize },
    /// A record was removed from both lists
    Removed { id: String },
}

type Listener = Box<dyn Fn(&StoreEvent)>;

/// Full consultation list plus the currently filtered subset
///
/// Only the console actions mutate the store, one at a time, and every
/// mutation is announced to subscribers after it has been applied.
#[derive(Default)]
pub struct RecordStore {
    all: Vec<Consultation>,
    filtered: Vec<Consultation>,
    listeners: Vec<Listener>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record from the last successful fetch
    pub fn all(&self) -> &[Consultation] {
        &self.all
    }

    /// Records currently shown and exported
    pub fn filtered(&self) -> &[Consultation] {
        &self.filtered
    }

    /// Register a listener for subsequent changes
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&StoreEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Replace both lists with a freshly fetched set
    pub fn replace_all(&mut self, records: Vec<Consultation>) {
        self.filtered = records.clone();
        self.all = records;
        debug!(count = self.all.len(), "Replaced records");
        self.notify(StoreEvent::Replaced { count: self.all.len() });
    }

    /// Replace only the filtered subset
    pub fn set_filtered(&mut self, subset: Vec<Consultation>) {
        self.filtered = subset;
        self.notify(StoreEvent::Filtered {
            count: self.filtered.len(),
        });
    }

    /// Remove a record from both lists. Returns false when the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.all.len() + self.filtered.len();
        self.all.retain(|r| r.id != id);
        self.filtered.retain(|r| r.id != id);

        if self.all.len() + self.filtered.len() == before {
            debug!(id, "Remove of unknown record ignored");
            return false;
        }

        self.notify(StoreEvent::Removed { id: id.to_string() });
        true
    }

    fn notify(&self, event: StoreEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("all", &self.all.len())
            .field("filtered", &self.filtered.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
