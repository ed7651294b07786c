//! Request parameter extraction
//!
//! Parameters come from the query string. POST requests may also send a JSON
//! object body; its fields override query parameters of the same name.

use actix_web::{web, HttpRequest};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::api::error::ApiError;

#[derive(Debug, Default)]
pub struct RequestParams {
    values: Map<String, Value>,
}

impl RequestParams {
    pub fn parse(req: &HttpRequest, body: &[u8]) -> Result<Self, ApiError> {
        let mut values = Map::new();

        if let Ok(query) = web::Query::<HashMap<String, String>>::from_query(req.query_string()) {
            for (name, value) in query.into_inner() {
                values.insert(name, Value::String(value));
            }
        }

        if !body.iter().all(u8::is_ascii_whitespace) {
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(fields)) => values.extend(fields),
                _ => return Err(ApiError::InvalidBody),
            }
        }

        Ok(Self { values })
    }

    /// A non-empty string parameter; numbers are accepted in their decimal form
    pub fn require(&self, name: &'static str) -> Result<String, ApiError> {
        match self.values.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(ApiError::MissingParam(name)),
        }
    }

    /// The `coordinates` parameter, parsed once.
    ///
    /// A string is decoded as JSON text; an inline JSON value from a body is
    /// taken as-is.
    pub fn coordinates(&self) -> Result<Value, ApiError> {
        match self.values.get("coordinates") {
            None | Some(Value::Null) => Err(ApiError::MissingParam("coordinates")),
            Some(Value::String(text)) => {
                serde_json::from_str(text).map_err(|_| ApiError::InvalidCoordinates)
            }
            Some(inline) => Ok(inline.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use serde_json::json;

    #[test]
    async fn test_query_params() {
        let req = test::TestRequest::default()
            .uri("/api/save?serverId=s1&userId=u1&location=home&coordinates=%7B%22x%22%3A1%7D")
            .to_http_request();
        let params = RequestParams::parse(&req, b"").unwrap();

        assert_eq!(params.require("serverId").unwrap(), "s1");
        assert_eq!(params.require("location").unwrap(), "home");
        assert_eq!(params.coordinates().unwrap(), json!({"x": 1}));
    }

    #[test]
    async fn test_missing_and_empty() {
        let req = test::TestRequest::default()
            .uri("/api/addUser?serverId=&userId=u1")
            .to_http_request();
        let params = RequestParams::parse(&req, b"").unwrap();

        assert!(matches!(params.require("serverId"), Err(ApiError::MissingParam("serverId"))));
        assert!(matches!(params.require("location"), Err(ApiError::MissingParam("location"))));
        assert!(matches!(params.coordinates(), Err(ApiError::MissingParam("coordinates"))));
    }

    #[test]
    async fn test_invalid_coordinates() {
        let req = test::TestRequest::default()
            .uri("/api/save?coordinates=not-json")
            .to_http_request();
        let params = RequestParams::parse(&req, b"").unwrap();
        assert!(matches!(params.coordinates(), Err(ApiError::InvalidCoordinates)));
    }

    #[test]
    async fn test_body_overrides_query() {
        let req = test::TestRequest::default()
            .uri("/api/addLocation?serverId=from-query&userId=u1")
            .to_http_request();
        let body = br#"{"serverId": "from-body", "coordinates": {"lat": 1.5}, "location": 7}"#;
        let params = RequestParams::parse(&req, body).unwrap();

        assert_eq!(params.require("serverId").unwrap(), "from-body");
        assert_eq!(params.require("userId").unwrap(), "u1");
        assert_eq!(params.require("location").unwrap(), "7");
        assert_eq!(params.coordinates().unwrap(), json!({"lat": 1.5}));
    }

    #[test]
    async fn test_body_must_be_object() {
        let req = test::TestRequest::default().uri("/api/remove").to_http_request();
        assert!(matches!(RequestParams::parse(&req, b"[1,2]"), Err(ApiError::InvalidBody)));
        assert!(matches!(RequestParams::parse(&req, b"{oops"), Err(ApiError::InvalidBody)));
        assert!(RequestParams::parse(&req, b"  \n").is_ok());
    }
}
