//! IoT Console - client for IoT project dashboards
//!
//! Talks to the dashboard's REST backend, follows live sensor readings over
//! Socket.IO, keeps project snapshots current and drives device buttons.

pub mod api;
pub mod chart;
pub mod config;
pub mod controls;
pub mod error;
pub mod io;
pub mod live;
pub mod model;
pub mod notice;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod view;

pub use config::{load_config, Config};
pub use error::{ConsoleError, Result};

use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiClient;
use crate::io::{ReqwestHttpClient, SocketConnector, WsConnector};
use crate::live::{LiveOptions, LiveSubscriber};
use crate::notice::{FanoutNotices, LogNotices, Notice, NoticeHistory, NoticeSink};
use crate::session::{Session, SessionFile};

/// Everything a front-end needs, wired from one [`Config`]
pub struct Console {
    config: Config,
    api: ApiClient,
    connector: Arc<dyn SocketConnector>,
    sessions: SessionFile,
    notices: Arc<dyn NoticeSink>,
    history: Arc<NoticeHistory>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("api", &self.api)
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl Console {
    pub fn new(config: Config) -> Result<Self> {
        let timeout = config.api.timeout_seconds.map(Duration::from_secs);
        let http = Arc::new(ReqwestHttpClient::new(timeout)?);
        Ok(Self::with_io(config, http, Arc::new(WsConnector)))
    }

    /// Wire the console over custom transports
    pub fn with_io(
        config: Config,
        http: Arc<dyn io::HttpClient>,
        connector: Arc<dyn SocketConnector>,
    ) -> Self {
        let history = Arc::new(NoticeHistory::new(config.notices.history_size));
        let notices: Arc<dyn NoticeSink> = Arc::new(FanoutNotices::new(vec![
            Arc::new(LogNotices),
            history.clone(),
        ]));
        let api = ApiClient::new(config.api.base_url.clone(), http, notices.clone());
        let sessions = SessionFile::new(config.session.path.clone());
        Self {
            config,
            api,
            connector,
            sessions,
            notices,
            history,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Client without credentials, for login and registration
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn sessions(&self) -> &SessionFile {
        &self.sessions
    }

    /// Recent notices, oldest first
    pub fn notices(&self) -> &Arc<NoticeHistory> {
        &self.history
    }

    pub fn notify(&self, notice: Notice) {
        self.notices.notify(notice);
    }

    /// The stored session, or `NotAuthenticated` when nobody is logged in
    pub fn session(&self) -> Result<Session> {
        self.sessions.load()?.ok_or(ConsoleError::NotAuthenticated)
    }

    pub fn authenticated_api(&self, session: &Session) -> ApiClient {
        self.api.authenticated(session)
    }

    /// Open the live channel for `session`
    pub async fn connect_live(&self, session: &Session) -> Result<LiveSubscriber> {
        LiveSubscriber::connect(
            self.connector.clone(),
            LiveOptions {
                endpoint: self.config.live.endpoint(),
                token: Some(session.token.clone()),
                reconnect: self.config.live.reconnect.clone(),
            },
        )
        .await
    }
}
