use crate::engine::PermissionEngine;
use std::sync::RwLock;

/// Queries take the read lock; distributor and permission updates take the
/// write lock, so no query observes a half-applied update.
pub struct AppState {
    pub engine: RwLock<PermissionEngine>,
}

impl AppState {
    pub fn new(engine: PermissionEngine) -> Self {
        Self {
            engine: RwLock::new(engine),
        }
    }
}
