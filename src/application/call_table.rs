//! Table of calls the core currently tracks

use crate::domain::call::{CallRecord, CallSnapshot, CallState};
use crate::domain::shared::value_objects::CallId;
use std::collections::BTreeMap;

/// Call records keyed by id, plus the current call
///
/// The current call is `None` or points at exactly one call whose last
/// state is Connected or StreamsRunning.
#[derive(Debug, Default)]
pub struct CallTable {
    calls: BTreeMap<CallId, CallRecord>,
    current: Option<CallId>,
}

impl CallTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for the call, created on first mention
    pub fn upsert(&mut self, snapshot: CallSnapshot) -> &mut CallRecord {
        let id = snapshot.id;
        match self.calls.entry(id) {
            std::collections::btree_map::Entry::Occupied(entry) => {
                let record = entry.into_mut();
                record.refresh(snapshot);
                record
            }
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(CallRecord::new(snapshot))
            }
        }
    }

    pub fn get(&self, id: &CallId) -> Option<&CallRecord> {
        self.calls.get(id)
    }

    pub fn get_mut(&mut self, id: &CallId) -> Option<&mut CallRecord> {
        self.calls.get_mut(id)
    }

    pub fn contains(&self, id: &CallId) -> bool {
        self.calls.contains_key(id)
    }

    pub fn remove(&mut self, id: &CallId) -> Option<CallRecord> {
        self.release_current(id);
        self.calls.remove(id)
    }

    /// Point the current call at `id` after it reached an established state
    pub fn set_current(&mut self, id: CallId, state: CallState) {
        if state.is_established() {
            self.current = Some(id);
        }
    }

    /// Clear the current call if it is `id`
    pub fn release_current(&mut self, id: &CallId) {
        if self.current.as_ref() == Some(id) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&CallRecord> {
        self.current.as_ref().and_then(|id| self.calls.get(id))
    }

    pub fn current_id(&self) -> Option<CallId> {
        self.current
    }

    /// Current call, or any tracked call when there is none
    pub fn current_or_first(&self) -> Option<&CallRecord> {
        self.current().or_else(|| self.calls.values().next())
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Calls that have not reached End, Error or Released
    pub fn active_len(&self) -> usize {
        self.calls
            .values()
            .filter(|record| !record.last_state().is_terminal())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallRecord> {
        self.calls.values()
    }
}
