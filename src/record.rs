//! Server record shapes
//!
//! A server entry in the document has been written by more than one code path
//! over time. It may be a bare array of location objects or an object with
//! `locations` and/or `userIds`. Everything is folded into [`ServerRecord`]
//! on read, and only the canonical object shape is ever written back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker reported for servers that have users but no locations yet
pub const UNKNOWN_MARKER: &str = "unknown";

/// A single labelled coordinate attached to a server
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationEntry {
    /// Caller-supplied coordinate value, kept as parsed JSON
    pub coords: Value,
    /// Display label
    pub location: String,
    /// User that created the entry
    pub user_id: String,
}

impl LocationEntry {
    pub fn new(coords: Value, location: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            coords,
            location: location.into(),
            user_id: user_id.into(),
        }
    }

    /// Coerce a loosely shaped JSON object into an entry.
    /// Non-objects and mistyped fields are rejected; missing fields get defaults.
    fn coerce(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

/// The shapes a stored server entry may take
#[derive(Debug, PartialEq)]
pub enum RawRecord<'a> {
    /// No entry, or an entry we cannot make sense of
    Absent,
    /// Legacy bare array of location objects
    Bare(&'a [Value]),
    /// Object carrying at least one of `locations` / `userIds`
    Structured {
        locations: Option<&'a Value>,
        user_ids: Option<&'a Value>,
    },
}

impl<'a> RawRecord<'a> {
    /// Inspect a stored value and decide which shape it is
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Array(items)) => RawRecord::Bare(items),
            Some(Value::Object(obj)) => {
                let locations = obj.get("locations");
                let user_ids = obj.get("userIds");
                if locations.is_none() && user_ids.is_none() {
                    RawRecord::Absent
                } else {
                    RawRecord::Structured { locations, user_ids }
                }
            }
            _ => RawRecord::Absent,
        }
    }
}

/// Canonical in-memory server record
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    /// Location entries in insertion order
    pub locations: Vec<LocationEntry>,
    /// Member user identifiers, no duplicates
    pub user_ids: Vec<String>,
}

impl ServerRecord {
    /// Fold any stored shape into the canonical record. Never fails.
    pub fn normalize(raw: Option<&Value>) -> Self {
        match RawRecord::classify(raw) {
            RawRecord::Absent => Self::default(),
            RawRecord::Bare(items) => Self {
                locations: coerce_locations(items),
                user_ids: Vec::new(),
            },
            RawRecord::Structured { locations, user_ids } => {
                let locations = locations
                    .and_then(Value::as_array)
                    .map(|items| coerce_locations(items))
                    .unwrap_or_default();

                let mut record = Self {
                    locations,
                    user_ids: Vec::new(),
                };
                for id in user_ids.and_then(Value::as_array).into_iter().flatten() {
                    if let Some(id) = id.as_str() {
                        record.add_user(id);
                    }
                }
                record
            }
        }
    }

    /// Encode in the canonical stored shape
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.user_ids.iter().any(|id| id == user_id)
    }

    /// Add a member; returns false if it was already present
    pub fn add_user(&mut self, user_id: &str) -> bool {
        if self.has_user(user_id) {
            return false;
        }
        self.user_ids.push(user_id.to_string());
        true
    }

    /// Remove a member; returns false if it was not present
    pub fn remove_user(&mut self, user_id: &str) -> bool {
        let before = self.user_ids.len();
        self.user_ids.retain(|id| id != user_id);
        self.user_ids.len() != before
    }

    pub fn push_location(&mut self, entry: LocationEntry) {
        self.locations.push(entry);
    }

    /// Overwrite the first entry sharing `entry`'s label, or append if none does
    pub fn upsert_location(&mut self, entry: LocationEntry) {
        match self.locations.iter_mut().find(|e| e.location == entry.location) {
            Some(existing) => *existing = entry,
            None => self.locations.push(entry),
        }
    }

    pub fn has_location(&self, label: &str) -> bool {
        self.locations.iter().any(|e| e.location == label)
    }

    /// Remove the first entry whose label matches, whoever owns it
    pub fn remove_first_location(&mut self, label: &str) -> Option<LocationEntry> {
        let index = self.locations.iter().position(|e| e.location == label)?;
        Some(self.locations.remove(index))
    }
}

fn coerce_locations(items: &[Value]) -> Vec<LocationEntry> {
    items.iter().filter_map(LocationEntry::coerce).collect()
}
