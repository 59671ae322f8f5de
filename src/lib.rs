//! umanager - user and link gateway
//!
//! Library exports for the server binary and for testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod models;
pub mod proto;
pub mod services;
pub mod state;
pub mod translate;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
