// API key authentication
use actix_web::{web, HttpRequest};
use log::warn;
use std::collections::HashMap;
use std::fmt;

use crate::api::error::ApiError;

/// Query parameter carrying the shared secret
pub const API_KEY_PARAM: &str = "apiKey";

/// Allow-list of shared secrets. An empty list rejects everything.
#[derive(Clone)]
pub struct ApiKeys {
    keys: Vec<String>,
}

impl ApiKeys {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn validate(&self, provided: &str) -> bool {
        // Check every key so the time taken does not depend on which one matched
        self.keys
            .iter()
            .fold(false, |found, key| constant_time_eq(key, provided) | found)
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKeys({} keys)", self.keys.len())
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

/// Pull the API key out of the query string
pub fn extract_api_key(req: &HttpRequest) -> Option<String> {
    web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().remove(API_KEY_PARAM))
}

/// Reject the request unless it carries an allow-listed key
pub fn authenticate(req: &HttpRequest, keys: &ApiKeys) -> Result<(), ApiError> {
    let provided = extract_api_key(req).ok_or_else(|| {
        warn!("Missing API key on {}", req.path());
        ApiError::Unauthorized
    })?;

    if !keys.validate(&provided) {
        warn!("Invalid API key on {}", req.path());
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}
