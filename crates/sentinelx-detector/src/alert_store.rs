//! Shared in-memory alert history.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sentinelx_models::Alert;

/// Append-only alert list shared between the pipeline and HTTP readers.
///
/// Only the pipeline appends and only a reset clears; everything else reads.
#[derive(Debug, Clone, Default)]
pub struct AlertStore {
    inner: Arc<RwLock<Vec<Alert>>>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Alert>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Alert>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn append(&self, alert: Alert) {
        self.write().push(alert);
    }

    /// Remove every alert, returning how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let mut alerts = self.write();
        let cleared = alerts.len();
        alerts.clear();
        cleared
    }

    /// Copy of the history, most recent first.
    pub fn list_newest_first(&self) -> Vec<Alert> {
        self.read().iter().rev().cloned().collect()
    }

    pub fn latest(&self) -> Option<Alert> {
        self.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
