//! startupmgr - Resource-aware management of auto-launch startup entries
//!
//! Discovers programs registered to start at login, disables the ones with
//! no proven resource cost, measures them, and re-launches the retained set
//! cheapest-first while honoring declared dependencies.

pub mod core;
pub mod persistence;
pub mod platform;

/// Application name constant
pub const APP_NAME: &str = "startupmgr";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
