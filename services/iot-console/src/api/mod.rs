//! Client for the dashboard's REST backend
//!
//! Every endpoint answers with a `{success, message, data}` envelope.
//! [`ApiClient::call`] performs one request, unwraps the envelope and
//! reports the outcome to the configured [`NoticeSink`]; the operation
//! wrappers in the submodules only pick the method, path and body.

mod auth;
mod graphs;
mod projects;
mod sensors;
mod signals;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

pub use auth::{Credentials, Registration};

use crate::error::{ConsoleError, Result};
use crate::io::{HttpClient, HttpRequest, HttpResponse, Method};
use crate::notice::{Notice, NoticeSink};
use crate::session::Session;

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

/// Authenticated access to the backend
///
/// The client is immutable; [`ApiClient::authenticated`] returns a copy
/// carrying a session's token.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
    notices: Arc<dyn NoticeSink>,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            notices,
            token: None,
        }
    }

    pub fn authenticated(&self, session: &Session) -> Self {
        Self {
            token: Some(session.token.clone()),
            ..self.clone()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn notices(&self) -> &Arc<dyn NoticeSink> {
        &self.notices
    }

    /// Perform an authenticated request and decode the envelope's `data`
    ///
    /// Failures are reported as error notices before being returned.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        self.call_with_query(method, path, Vec::new(), body).await
    }

    pub async fn call_with_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let result = match &self.token {
            Some(token) => {
                self.execute(method, path, Some(token.clone()), query, body)
                    .await
            }
            None => Err(ConsoleError::NotAuthenticated),
        };
        self.report_failure(result)
    }

    /// Request that needs no token, used for login and registration
    pub(crate) async fn call_public<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.execute(method, path, None, Vec::new(), Some(body))
            .await
    }

    /// Authenticated request that announces `success` when it completes
    pub(crate) async fn mutate<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        success: &str,
    ) -> Result<T> {
        let value = self.call(method, path, body).await?;
        self.notices.notify(Notice::success(success));
        Ok(value)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        bearer: Option<String>,
        query: Vec<(String, String)>,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let request = HttpRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            bearer,
            query,
            body,
        };
        let response = self.http.send(request).await?;
        decode(path, response)
    }

    fn report_failure<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.notices.notify(Notice::error(e.to_string()));
        }
        result
    }
}

/// Unwrap an envelope into its `data`
fn decode<T: DeserializeOwned>(path: &str, response: HttpResponse) -> Result<T> {
    let HttpResponse { status, body } = response;
    let is_ok = (200..300).contains(&status);

    let envelope = match serde_json::from_str::<Envelope>(&body) {
        Ok(envelope) => envelope,
        Err(_) if !is_ok => {
            return Err(ConsoleError::Http(format!(
                "{} returned status {}: {}",
                path,
                status,
                body.trim()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| format!("Request to {} failed with status {}", path, status));
        debug!("{} rejected: {}", path, message);
        return Err(ConsoleError::Api(message));
    }

    Ok(serde_json::from_value(envelope.data)?)
}
