use serde::de::IgnoredAny;

use super::ApiClient;
use crate::error::Result;
use crate::io::Method;
use crate::model::{Project, ProjectDraft};

impl ApiClient {
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.call(Method::Get, "/projects", None).await
    }

    /// Full snapshot of one project
    pub async fn fetch_project(&self, project_id: &str) -> Result<Project> {
        self.call(Method::Get, &format!("/projects/{}", project_id), None)
            .await
    }

    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
        self.mutate(
            Method::Post,
            "/projects",
            Some(serde_json::to_value(draft)?),
            "Project created successfully",
        )
        .await
    }

    pub async fn update_project(&self, project_id: &str, draft: &ProjectDraft) -> Result<Project> {
        self.mutate(
            Method::Put,
            &format!("/projects/{}", project_id),
            Some(serde_json::to_value(draft)?),
            "Project updated successfully",
        )
        .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .mutate(
                Method::Delete,
                &format!("/projects/{}", project_id),
                None,
                "Project deleted successfully",
            )
            .await?;
        Ok(())
    }
}
