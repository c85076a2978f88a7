use serde::de::IgnoredAny;

use super::ApiClient;
use crate::chart::DateRange;
use crate::error::Result;
use crate::io::Method;
use crate::model::{CombinedGraph, CombinedGraphData, NewCombinedGraph};

impl ApiClient {
    pub async fn create_combined_graph(
        &self,
        project_id: &str,
        graph: &NewCombinedGraph,
    ) -> Result<CombinedGraph> {
        self.mutate(
            Method::Post,
            &format!("/projects/{}/combined-graphs", project_id),
            Some(serde_json::to_value(graph)?),
            "Combined graph created successfully",
        )
        .await
    }

    pub async fn update_combined_graph(
        &self,
        graph_id: &str,
        graph: &NewCombinedGraph,
    ) -> Result<CombinedGraph> {
        self.mutate(
            Method::Put,
            &format!("/combined-graphs/{}", graph_id),
            Some(serde_json::to_value(graph)?),
            "Combined graph updated successfully",
        )
        .await
    }

    pub async fn delete_combined_graph(&self, graph_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .mutate(
                Method::Delete,
                &format!("/combined-graphs/{}", graph_id),
                None,
                "Combined graph deleted successfully",
            )
            .await?;
        Ok(())
    }

    /// Server-side averages for a combined graph, optionally bounded in time
    pub async fn combined_graph_data(
        &self,
        graph_id: &str,
        range: &DateRange,
    ) -> Result<CombinedGraphData> {
        self.call_with_query(
            Method::Get,
            &format!("/combined-graphs/{}/data", graph_id),
            range.query_pairs(),
            None,
        )
        .await
    }
}
