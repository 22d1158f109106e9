use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{ActivityRecord, CapacitySnapshot, ControlPhase, SignupControlState};
use crate::services::sanitizer;

#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub record: ActivityRecord,
    pub control: SignupControlState,
}

impl RosterEntry {
    fn new(record: ActivityRecord, registered: i64, signed: bool) -> Self {
        let control = SignupControlState::new(record.id.clone(), record.capacity, registered, signed);
        Self { record, control }
    }
}

/// In-memory roster for one page session, keyed by activity id and kept in
/// server order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    order: Vec<String>,
    entries: HashMap<String, RosterEntry>,
}

impl Roster {
    /// Builds the roster from the `GET /activities` mapping (name -> details).
    pub fn init_from_server(activities: &Map<String, Value>) -> Self {
        let mut roster = Self::default();
        for (name, details) in activities {
            let details = match details {
                Value::Object(map) => sanitizer::clean(map),
                _ => Map::new(),
            };
            let record = ActivityRecord::from_details(name, &details);
            let registered = record.registered();
            roster.insert(RosterEntry::new(record, registered, false));
        }
        roster
    }

    /// Builds the roster from the `GET /activities.json` array. Elements are
    /// expected to have passed through `sanitizer::clean_many` already.
    pub fn from_loose_records(records: &[Value]) -> Self {
        let mut roster = Self::default();
        for record in records {
            let Value::Object(map) = record else {
                continue;
            };
            let (record, registered, signed) = ActivityRecord::from_loose(map);
            let registered = registered.unwrap_or_else(|| record.registered());
            roster.insert(RosterEntry::new(record, registered, signed));
        }
        roster
    }

    fn insert(&mut self, entry: RosterEntry) {
        let id = entry.record.id.clone();
        if self.entries.contains_key(&id) {
            warn!("Duplicate activity id {:?} in roster payload, keeping the first", id);
            return;
        }
        self.order.push(id.clone());
        self.entries.insert(id, entry);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn get(&self, activity_id: &str) -> Option<&RosterEntry> {
        self.entries.get(activity_id)
    }

    /// Resolves a displayed activity name to its id.
    pub fn find_by_title(&self, title: &str) -> Option<&str> {
        self.iter()
            .find(|e| e.record.title == title)
            .map(|e| e.record.id.as_str())
    }

    pub fn snapshot(&self, activity_id: &str) -> Option<CapacitySnapshot> {
        self.get(activity_id).map(|e| e.control.snapshot())
    }

    // fresh value -> stored value -> 0
    pub fn capacity_of(&self, activity_id: &str, fresh: Option<i64>) -> i64 {
        fresh
            .or_else(|| self.get(activity_id).map(|e| e.control.capacity))
            .unwrap_or(0)
    }

    pub fn registered_of(&self, activity_id: &str, fresh: Option<i64>) -> i64 {
        fresh
            .or_else(|| self.get(activity_id).map(|e| e.control.registered))
            .unwrap_or(0)
    }

    pub fn phase(&self, activity_id: &str) -> Option<ControlPhase> {
        self.get(activity_id).map(|e| e.control.phase)
    }

    pub fn set_phase(&mut self, activity_id: &str, phase: ControlPhase) -> bool {
        match self.entries.get_mut(activity_id) {
            Some(entry) => {
                entry.control.phase = phase;
                true
            }
            None => false,
        }
    }

    /// Records one successful signup: `registered` grows by exactly one and,
    /// when the signup carried an email, it is appended to the participants.
    pub fn apply_signup_success(
        &mut self,
        activity_id: &str,
        email: Option<&str>,
    ) -> Option<CapacitySnapshot> {
        let entry = self.entries.get_mut(activity_id)?;
        entry.control.registered += 1;
        if let Some(email) = email {
            entry.record.participants.push(email.to_string());
        }
        Some(entry.control.snapshot())
    }

    /// Records a confirmed unregistration.
    pub fn apply_participant_removed(
        &mut self,
        activity_id: &str,
        email: &str,
    ) -> Option<CapacitySnapshot> {
        let entry = self.entries.get_mut(activity_id)?;
        if let Some(pos) = entry.record.participants.iter().position(|p| p == email) {
            entry.record.participants.remove(pos);
        }
        entry.control.registered = (entry.control.registered - 1).max(0);
        Some(entry.control.snapshot())
    }
}
