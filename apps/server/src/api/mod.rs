//! HTTP API handlers for clipdex-server

pub mod error;
pub mod health;
pub mod videos;

pub use error::ApiError;
pub use health::health_routes;
pub use videos::{list_videos, reload_catalog};
