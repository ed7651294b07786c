//! Read-only projections of the document

use serde::Serialize;
use serde_json::Value;

use crate::record::{ServerRecord, UNKNOWN_MARKER};
use crate::store::Document;

/// One item of a coordinates listing
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Coordinate {
    pub coords: Value,
    pub location: String,
}

impl Coordinate {
    fn unknown() -> Self {
        Self {
            coords: Value::String(UNKNOWN_MARKER.to_string()),
            location: UNKNOWN_MARKER.to_string(),
        }
    }
}

/// List `{coords, location}` pairs for a server, in insertion order.
///
/// Returns `None` when the server is not in the document. A server with
/// members but no locations reports one "unknown" item per member.
pub fn list_locations(document: &Document, server_id: &str) -> Option<Vec<Coordinate>> {
    let raw = document.get(server_id)?;
    let record = ServerRecord::normalize(Some(raw));

    if record.locations.is_empty() && !record.user_ids.is_empty() {
        return Some(record.user_ids.iter().map(|_| Coordinate::unknown()).collect());
    }

    Some(
        record
            .locations
            .into_iter()
            .map(|entry| Coordinate {
                coords: entry.coords,
                location: entry.location,
            })
            .collect(),
    )
}
