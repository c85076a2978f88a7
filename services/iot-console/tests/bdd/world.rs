use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cucumber::World;
use iot_console::api::ApiClient;
use iot_console::controls::{ButtonControl, Transition};
use iot_console::io::{HttpClient, HttpRequest, HttpResponse};
use iot_console::model::Project;
use iot_console::notice::NoticeHistory;
use iot_console::session::Session;
use iot_console::ConsoleError;

/// Backend that replays queued responses
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<HttpResponse>>,
}

impl ScriptedBackend {
    pub fn queue(&self, status: u16, body: String) {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse { status, body });
    }
}

#[async_trait]
impl HttpClient for ScriptedBackend {
    async fn send(&self, _request: HttpRequest) -> iot_console::Result<HttpResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ConsoleError::Http("No scripted response".to_string()))
    }
}

#[derive(Debug, Default, World)]
pub struct ConsoleWorld {
    pub project: Option<Arc<Project>>,
    pub previous: Option<Arc<Project>>,
    pub control: Option<ButtonControl>,
    pub transitions: Vec<Transition>,
    pub backend: Arc<ScriptedBackend>,
    pub notices: Arc<NoticeHistory>,
    pub last_error: Option<ConsoleError>,
}

impl ConsoleWorld {
    pub fn api(&self) -> ApiClient {
        ApiClient::new(
            "http://backend/api",
            self.backend.clone(),
            self.notices.clone(),
        )
        .authenticated(&Session::new("token", None))
    }

    pub fn project(&self) -> &Arc<Project> {
        self.project.as_ref().expect("project not loaded")
    }

    pub fn control(&mut self) -> &mut ButtonControl {
        self.control.as_mut().expect("button not created")
    }
}
