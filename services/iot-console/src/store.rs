//! Holder of the current project snapshot

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::model::{Project, SensorReading};
use crate::reconcile;

/// Latest [`Project`] snapshot of a view, observable through `watch`
#[derive(Debug)]
pub struct ProjectStore {
    tx: watch::Sender<Option<Arc<Project>>>,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Swap in a freshly fetched snapshot
    pub fn replace(&self, project: Project) {
        self.tx.send_replace(Some(Arc::new(project)));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn snapshot(&self) -> Option<Arc<Project>> {
        self.tx.borrow().clone()
    }

    /// Merge a reading into the current snapshot
    ///
    /// Watchers are only woken when the snapshot changed. Returns whether it did.
    pub fn apply(&self, reading: &SensorReading) -> bool {
        self.tx.send_if_modified(|current| {
            let Some(project) = current.as_ref() else {
                return false;
            };
            let next = reconcile::merge(project, reading);
            if Arc::ptr_eq(&next, project) {
                debug!("No sensor on pin {}, reading dropped", reading.pin);
                return false;
            }
            *current = Some(next);
            true
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Project>>> {
        self.tx.subscribe()
    }
}
