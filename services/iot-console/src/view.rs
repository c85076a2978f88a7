//! A mounted project: fetched snapshot kept current by live readings
//!
//! Everything a view starts runs inside its cancellation scope. Unmounting
//! or dropping the view cancels the scope, so a fetch still in flight is
//! discarded instead of overwriting the store after the view is gone, and
//! releases the project on the live channel.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::{ConsoleError, Result};
use crate::live::LiveSubscriber;
use crate::model::{Project, SensorReading};
use crate::store::ProjectStore;

pub struct ProjectView {
    project_id: String,
    api: ApiClient,
    live: Arc<LiveSubscriber>,
    store: Arc<ProjectStore>,
    scope: CancellationToken,
    merge_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ProjectView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectView")
            .field("project_id", &self.project_id)
            .field("mounted", &!self.scope.is_cancelled())
            .finish()
    }
}

impl ProjectView {
    pub async fn mount(api: ApiClient, live: Arc<LiveSubscriber>, project_id: &str) -> Result<Self> {
        Self::mount_scoped(api, live, project_id, &CancellationToken::new()).await
    }

    /// Mount inside `parent`; cancelling `parent` also unmounts the view
    pub async fn mount_scoped(
        api: ApiClient,
        live: Arc<LiveSubscriber>,
        project_id: &str,
        parent: &CancellationToken,
    ) -> Result<Self> {
        let scope = parent.child_token();
        let store = Arc::new(ProjectStore::new());

        let project = fetch_in_scope(&api, project_id, &scope).await?;
        store.replace(project);

        if let Err(e) = live.join_project(project_id).await {
            warn!("Failed to join project {}: {}", project_id, e);
        }

        // Only readings that arrive after mounting are merged
        let readings = live.readings();
        let merge_task = tokio::spawn(merge_readings(readings, store.clone(), scope.clone()));

        info!("Mounted project {}", project_id);
        Ok(Self {
            project_id: project_id.to_string(),
            api,
            live,
            store,
            scope,
            merge_task: Some(merge_task),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &Arc<ProjectStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Option<Arc<Project>> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Project>>> {
        self.store.subscribe()
    }

    /// Token of the view's scope, for tying other work to the view's lifetime
    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    /// Refetch the project and replace the snapshot wholesale
    pub async fn refresh(&self) -> Result<()> {
        let project = fetch_in_scope(&self.api, &self.project_id, &self.scope).await?;
        self.store.replace(project);
        Ok(())
    }

    /// Cancel the scope, leave the project and wait for the merge task
    pub async fn unmount(&mut self) {
        if self.scope.is_cancelled() && self.merge_task.is_none() {
            return;
        }
        self.scope.cancel();
        if let Err(e) = self.live.leave_project(&self.project_id).await {
            debug!("Leaving project {}: {}", self.project_id, e);
        }
        if let Some(task) = self.merge_task.take() {
            if let Err(e) = task.await {
                warn!("Merge task for {} failed: {}", self.project_id, e);
            }
        }
        info!("Unmounted project {}", self.project_id);
    }
}

impl Drop for ProjectView {
    fn drop(&mut self) {
        self.scope.cancel();
        // Already unmounted
        if self.merge_task.is_none() {
            return;
        }
        if !self.live.forget_project(&self.project_id) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let live = self.live.clone();
                let project_id = self.project_id.clone();
                handle.spawn(async move {
                    if let Err(e) = live.leave_project(&project_id).await {
                        debug!("Leaving project {} on drop: {}", project_id, e);
                    }
                });
            }
            Err(_) => debug!(
                "No runtime to leave project {}; it will not be re-joined",
                self.project_id
            ),
        }
    }
}

/// Fetch a project, giving up if `scope` is cancelled first
async fn fetch_in_scope(
    api: &ApiClient,
    project_id: &str,
    scope: &CancellationToken,
) -> Result<Project> {
    let project = tokio::select! {
        _ = scope.cancelled() => return Err(ConsoleError::Cancelled),
        project = api.fetch_project(project_id) => project?,
    };
    if scope.is_cancelled() {
        debug!("Discarding stale snapshot of {}", project_id);
        return Err(ConsoleError::Cancelled);
    }
    Ok(project)
}

/// Apply every reading, in arrival order, until the scope is cancelled
async fn merge_readings(
    mut readings: broadcast::Receiver<SensorReading>,
    store: Arc<ProjectStore>,
    scope: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            _ = scope.cancelled() => break,
            received = readings.recv() => received,
        };
        match received {
            Ok(reading) => {
                store.apply(&reading);
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Merge task fell behind, {} readings lost", missed);
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Live channel closed, merge task ending");
                break;
            }
        }
    }
}
