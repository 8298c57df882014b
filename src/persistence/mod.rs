//! Persistence module - JSON state storage

mod store;

pub use store::{StateStore, StoreError};
