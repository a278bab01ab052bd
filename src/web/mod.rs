//! HTTP front end for the classification pipeline.

pub mod routes;

pub use routes::{AppState, app_routes};
