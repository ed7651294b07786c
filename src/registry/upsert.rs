//! Mutating operations on the document
//!
//! Every function normalizes the one affected server entry, mutates it, and
//! either writes the canonical record back or removes the key when a
//! cascade-delete rule fires. Persisting is the caller's job.

use log::debug;
use serde_json::Value;

use crate::record::{LocationEntry, ServerRecord};
use crate::registry::Outcome;
use crate::store::{Document, StoreError};

fn load_record(document: &Document, server_id: &str) -> ServerRecord {
    ServerRecord::normalize(document.get(server_id))
}

fn store_record(document: &mut Document, server_id: &str, record: &ServerRecord) -> Result<(), StoreError> {
    document.insert(server_id.to_string(), record.to_value()?);
    Ok(())
}

/// Attach a location to a server, registering `user_id` as a member.
///
/// With `dedupe_labels` off, entries are appended even if the label exists.
pub fn add_location(
    document: &mut Document,
    server_id: &str,
    coords: Value,
    location: &str,
    user_id: &str,
    dedupe_labels: bool,
) -> Result<Outcome, StoreError> {
    let mut record = load_record(document, server_id);
    record.add_user(user_id);

    let entry = LocationEntry::new(coords, location, user_id);
    if dedupe_labels {
        record.upsert_location(entry);
    } else {
        record.push_location(entry);
    }

    debug!("Server {} now has {} locations", server_id, record.locations.len());
    store_record(document, server_id, &record)?;
    Ok(Outcome::Applied)
}

pub fn add_user(document: &mut Document, server_id: &str, user_id: &str) -> Result<Outcome, StoreError> {
    let mut record = load_record(document, server_id);
    if !record.add_user(user_id) {
        debug!("User {} already registered on server {}", user_id, server_id);
    }
    store_record(document, server_id, &record)?;
    Ok(Outcome::Applied)
}

/// Drop a member. Removing the last member deletes the whole server entry,
/// locations included.
pub fn remove_user(document: &mut Document, server_id: &str, user_id: &str) -> Result<Outcome, StoreError> {
    if !document.contains_key(server_id) {
        return Ok(Outcome::NotFound);
    }

    let mut record = load_record(document, server_id);
    if !record.remove_user(user_id) {
        return Ok(Outcome::NotFound);
    }

    if record.user_ids.is_empty() {
        debug!("Last user removed, deleting server {}", server_id);
        document.remove(server_id);
    } else {
        store_record(document, server_id, &record)?;
    }
    Ok(Outcome::Applied)
}

/// Remove the first entry labelled `location`. The caller must be a member,
/// but the entry is removed regardless of which user created it. Removing
/// the last location deletes the whole server entry.
pub fn remove_location(
    document: &mut Document,
    server_id: &str,
    user_id: &str,
    location: &str,
) -> Result<Outcome, StoreError> {
    if !document.contains_key(server_id) {
        return Ok(Outcome::NotFound);
    }

    let mut record = load_record(document, server_id);
    if !record.has_user(user_id) {
        return Ok(Outcome::NotFound);
    }
    if record.remove_first_location(location).is_none() {
        return Ok(Outcome::NotFound);
    }

    if record.locations.is_empty() {
        debug!("Last location removed, deleting server {}", server_id);
        document.remove(server_id);
    } else {
        store_record(document, server_id, &record)?;
    }
    Ok(Outcome::Applied)
}
