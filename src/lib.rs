// src/lib.rs

pub mod api;
pub mod app_state;
pub mod config;
pub mod record;
pub mod registry;
pub mod store;
