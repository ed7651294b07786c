// HTTP handlers for the registry endpoints
use actix_web::{web, Error, HttpRequest, HttpResponse};
use log::{debug, error, info};
use serde_json::json;
use std::sync::Arc;

use crate::api::auth::authenticate;
use crate::api::error::ApiError;
use crate::api::params::RequestParams;
use crate::api::rate_limit::enforce;
use crate::app_state::AppState;
use crate::registry::{LocationRegistry, Outcome};
use crate::store::StoreError;

const SERVER_OR_USER_NOT_FOUND: &str = "Server ID or User ID not found";
const SERVER_NOT_FOUND: &str = "Server ID not found";
const LOCATION_NOT_FOUND: &str = "Location not found";

/// Rate limit, authenticate, then decode parameters
fn admit(req: &HttpRequest, body: &[u8], app_state: &AppState) -> Result<RequestParams, ApiError> {
    enforce(req, &app_state.rate_limiter)?;
    authenticate(req, &app_state.api_keys)?;
    RequestParams::parse(req, body)
}

/// MDC fields for one request. The MDC is thread-local, so the context is
/// applied on every thread that logs for the request.
#[derive(Debug, Clone)]
struct LogContext {
    server: String,
    user: Option<String>,
}

impl LogContext {
    fn new(server_id: &str, user_id: Option<&str>) -> Self {
        Self {
            server: server_id.to_string(),
            user: user_id.map(str::to_string),
        }
    }

    fn apply(&self) {
        log_mdc::clear();
        log_mdc::insert("server", self.server.as_str());
        if let Some(user) = &self.user {
            log_mdc::insert("user", user.as_str());
        }
    }
}

/// Run a registry operation on the blocking pool.
/// `failure` is the public error text should the store fail.
///
/// The log context is set on the pool thread for the duration of the
/// operation and reapplied on this thread once the await completes, since
/// other requests may have run on this worker meanwhile.
async fn run_blocking<R, F>(
    app_state: &AppState,
    context: &LogContext,
    failure: &'static str,
    operation: F,
) -> Result<R, ApiError>
where
    F: FnOnce(&LocationRegistry) -> Result<R, StoreError> + Send + 'static,
    R: Send + 'static,
{
    let registry = Arc::clone(&app_state.registry);
    let pool_context = context.clone();
    let result = web::block(move || {
        pool_context.apply();
        let result = operation(registry.as_ref());
        log_mdc::clear();
        result
    })
    .await;
    context.apply();

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => {
            error!("{}: {}", failure, source);
            Err(ApiError::Store { message: failure, source })
        }
        Err(e) => {
            error!("{}: blocking task failed: {}", failure, e);
            Err(ApiError::Worker(failure))
        }
    }
}

fn success() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true }))
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": false, "message": message }))
}

/// GET|POST /api/save, /api/addLocation
pub async fn add_location_handler(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let params = admit(&req, &body, &app_state)?;
    let server_id = params.require("serverId")?;
    let user_id = params.require("userId")?;
    let location = params.require("location")?;
    let coords = params.coordinates()?;
    let context = LogContext::new(&server_id, Some(&user_id));
    context.apply();
    debug!("add-location: server={}, user={}, location={}", server_id, user_id, location);

    run_blocking(&app_state, &context, "Failed to save data", move |registry| {
        registry.add_location(&server_id, coords, &location, &user_id)
    })
    .await?;
    Ok(success())
}

/// GET|POST /api/addUser
pub async fn add_user_handler(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let params = admit(&req, &body, &app_state)?;
    let server_id = params.require("serverId")?;
    let user_id = params.require("userId")?;
    let context = LogContext::new(&server_id, Some(&user_id));
    context.apply();

    run_blocking(&app_state, &context, "Failed to add user", move |registry| {
        registry.add_user(&server_id, &user_id)
    })
    .await?;
    Ok(success())
}

/// GET|POST /api/remove, /api/removeUser
pub async fn remove_user_handler(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let params = admit(&req, &body, &app_state)?;
    let server_id = params.require("serverId")?;
    let user_id = params.require("userId")?;
    let context = LogContext::new(&server_id, Some(&user_id));
    context.apply();

    let (sid, uid) = (server_id.clone(), user_id.clone());
    let outcome = run_blocking(&app_state, &context, "Failed to remove user", move |registry| {
        registry.remove_user(&sid, &uid)
    })
    .await?;

    match outcome {
        Outcome::Applied => {
            info!("Removed user {} from server {}", user_id, server_id);
            Ok(success())
        }
        Outcome::NotFound => {
            info!("remove-user: user {} not found on server {}", user_id, server_id);
            Ok(not_found(SERVER_OR_USER_NOT_FOUND))
        }
    }
}

/// GET|POST /api/removeLocation
pub async fn remove_location_handler(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let params = admit(&req, &body, &app_state)?;
    let server_id = params.require("serverId")?;
    let user_id = params.require("userId")?;
    let location = params.require("location")?;
    let context = LogContext::new(&server_id, Some(&user_id));
    context.apply();

    let (sid, uid, label) = (server_id.clone(), user_id.clone(), location.clone());
    let outcome = run_blocking(&app_state, &context, "Failed to remove location", move |registry| {
        registry.remove_location(&sid, &uid, &label)
    })
    .await?;

    match outcome {
        Outcome::Applied => {
            info!("Removed location {} from server {}", location, server_id);
            Ok(success())
        }
        Outcome::NotFound if app_state.config.compatibility.report_missing_location => {
            info!("remove-location: {} not found on server {}", location, server_id);
            Ok(not_found(LOCATION_NOT_FOUND))
        }
        Outcome::NotFound => {
            debug!("remove-location: {} not found on server {}, not reported", location, server_id);
            Ok(HttpResponse::NoContent().finish())
        }
    }
}

async fn list_coordinates(server_id: String, app_state: &AppState) -> Result<HttpResponse, Error> {
    let context = LogContext::new(&server_id, None);
    context.apply();

    let sid = server_id.clone();
    let listing = run_blocking(app_state, &context, "Failed to retrieve coordinates", move |registry| {
        registry.list_locations(&sid)
    })
    .await?;

    match listing {
        Some(coordinates) => {
            debug!("Listing {} coordinates for server {}", coordinates.len(), server_id);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "coordinates": coordinates })))
        }
        None => Ok(not_found(SERVER_NOT_FOUND)),
    }
}

/// GET /api/coordinates/{serverId}
pub async fn coordinates_by_path_handler(
    path: web::Path<String>,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    admit(&req, &[], &app_state)?;
    list_coordinates(path.into_inner(), &app_state).await
}

/// GET /api/coordinates?serverId=
pub async fn coordinates_by_query_handler(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let params = admit(&req, &[], &app_state)?;
    let server_id = params.require("serverId")?;
    list_coordinates(server_id, &app_state).await
}

/// GET /health
pub async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mdc(key: &str) -> Option<String> {
        log_mdc::get(key, |value| value.map(str::to_string))
    }

    #[actix_web::test]
    async fn test_log_context_reaches_blocking_pool() {
        let app_state = AppState::new_for_testing();
        let context = LogContext::new("s1", Some("u1"));

        let seen = run_blocking(&app_state, &context, "failed", |_registry| {
            Ok((mdc("server"), mdc("user")))
        })
        .await
        .unwrap();

        assert_eq!(seen, (Some("s1".to_string()), Some("u1".to_string())));
    }

    #[actix_web::test]
    async fn test_log_context_restored_after_await() {
        let app_state = AppState::new_for_testing();
        let context = LogContext::new("s1", None);
        context.apply();

        let (server, user) = run_blocking(&app_state, &context, "failed", |_registry| {
            Ok((mdc("server"), mdc("user")))
        })
        .await
        .unwrap();
        assert_eq!(server.as_deref(), Some("s1"));
        assert_eq!(user, None);

        // Another request on this worker overwrote the fields mid-await
        LogContext::new("s2", Some("u2")).apply();
        run_blocking(&app_state, &context, "failed", |_registry| Ok(())).await.unwrap();
        assert_eq!(mdc("server").as_deref(), Some("s1"));
        assert_eq!(mdc("user"), None);
    }

    #[actix_web::test]
    async fn test_blocking_pool_context_cleared_after_operation() {
        let app_state = AppState::new_for_testing();
        let context = LogContext::new("s1", Some("u1"));
        run_blocking(&app_state, &context, "failed", |_registry| Ok(())).await.unwrap();

        // Pool threads never keep a finished request's fields
        let leftover = web::block(|| mdc("server")).await.unwrap();
        assert_eq!(leftover, None);
    }
}
