use serde::de::IgnoredAny;

use super::ApiClient;
use crate::error::Result;
use crate::io::Method;
use crate::model::{GraphInfo, NewSensor, Sensor, SensorUpdate};

impl ApiClient {
    pub async fn add_sensor(&self, project_id: &str, sensor: &NewSensor) -> Result<Sensor> {
        self.mutate(
            Method::Post,
            &format!("/projects/{}/sensors", project_id),
            Some(serde_json::to_value(sensor)?),
            "Sensor added successfully",
        )
        .await
    }

    pub async fn project_sensors(&self, project_id: &str) -> Result<Vec<Sensor>> {
        self.call(
            Method::Get,
            &format!("/projects/{}/sensors", project_id),
            None,
        )
        .await
    }

    pub async fn update_sensor(&self, sensor_id: &str, update: &SensorUpdate) -> Result<Sensor> {
        self.mutate(
            Method::Put,
            &format!("/sensors/{}", sensor_id),
            Some(serde_json::to_value(update)?),
            "Sensor updated successfully",
        )
        .await
    }

    pub async fn delete_sensor(&self, sensor_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .mutate(
                Method::Delete,
                &format!("/sensors/{}", sensor_id),
                None,
                "Sensor deleted successfully",
            )
            .await?;
        Ok(())
    }

    pub async fn update_graph_info(&self, sensor_id: &str, info: &GraphInfo) -> Result<Sensor> {
        self.mutate(
            Method::Put,
            &format!("/sensors/{}/graph-info", sensor_id),
            Some(serde_json::to_value(info)?),
            "Graph settings updated successfully",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::io::{HttpResponse, MockHttpClient};
    use crate::model::GraphType;
    use crate::notice::NoticeHistory;
    use crate::session::Session;

    #[tokio::test]
    async fn update_graph_info_sends_wire_names() {
        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .withf(|req| {
                let body = req.body.as_ref();
                req.method == Method::Put
                    && req.url == "http://b/api/sensors/s1/graph-info"
                    && body.map(|b| b["type"] == "area" && b["maxDataPoints"] == 20) == Some(true)
            })
            .returning(|_| {
                Box::pin(async {
                    Ok(HttpResponse {
                        status: 200,
                        body: r#"{"success": true, "data": {"id": "s1",
                            "graphInfo": {"type": "area", "maxDataPoints": 20}}}"#
                            .to_string(),
                    })
                })
            });

        let history = Arc::new(NoticeHistory::new(5));
        let client = ApiClient::new("http://b/api", Arc::new(mock), history.clone())
            .authenticated(&Session::new("tok", None));
        let info = GraphInfo {
            graph_type: GraphType::Area,
            max_data_points: 20,
            ..GraphInfo::default()
        };
        let sensor = client.update_graph_info("s1", &info).await.unwrap();

        assert_eq!(sensor.graph_info.graph_type, GraphType::Area);
        assert_eq!(
            history.last().unwrap().message,
            "Graph settings updated successfully"
        );
    }

    #[tokio::test]
    async fn project_sensors_lists_without_notice() {
        let mut mock = MockHttpClient::new();
        mock.expect_send()
            .withf(|req| req.method == Method::Get && req.url.ends_with("/projects/p1/sensors"))
            .returning(|_| {
                Box::pin(async {
                    Ok(HttpResponse {
                        status: 200,
                        body: r#"{"success": true, "data": [{"id": "s1"}, {"id": "s2"}]}"#
                            .to_string(),
                    })
                })
            });

        let history = Arc::new(NoticeHistory::new(5));
        let client = ApiClient::new("http://b/api", Arc::new(mock), history.clone())
            .authenticated(&Session::new("tok", None));

        assert_eq!(client.project_sensors("p1").await.unwrap().len(), 2);
        assert!(history.entries().is_empty());
    }
}
