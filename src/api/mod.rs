//! HTTP request boundary
//!
//! Routing, rate limiting, API-key checks and parameter validation in front
//! of the location registry.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod params;
pub mod rate_limit;

use actix_web::web;

use handlers::{
    add_location_handler, add_user_handler, coordinates_by_path_handler, coordinates_by_query_handler,
    health_handler, remove_location_handler, remove_user_handler,
};

/// Register every route on an actix `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_handler))
        .service(
            web::scope("/api")
                .service(
                    web::resource(["/save", "/addLocation"])
                        .route(web::get().to(add_location_handler))
                        .route(web::post().to(add_location_handler)),
                )
                .service(
                    web::resource("/addUser")
                        .route(web::get().to(add_user_handler))
                        .route(web::post().to(add_user_handler)),
                )
                .service(
                    web::resource(["/remove", "/removeUser"])
                        .route(web::get().to(remove_user_handler))
                        .route(web::post().to(remove_user_handler)),
                )
                .service(
                    web::resource("/removeLocation")
                        .route(web::get().to(remove_location_handler))
                        .route(web::post().to(remove_location_handler)),
                )
                .route("/coordinates", web::get().to(coordinates_by_query_handler))
                .route("/coordinates/{server_id}", web::get().to(coordinates_by_path_handler)),
        );
}
