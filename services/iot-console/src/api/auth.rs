use serde::Serialize;

use super::ApiClient;
use crate::error::Result;
use crate::io::Method;
use crate::notice::Notice;
use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl ApiClient {
    /// Exchange credentials for a session
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let result = self
            .call_public(
                Method::Post,
                "/auth/login",
                serde_json::to_value(credentials)?,
            )
            .await;
        self.announce(
            result,
            Notice::success("You have successfully logged in.").with_title("Welcome back!"),
            "Login Failed",
        )
    }

    pub async fn register(&self, registration: &Registration) -> Result<Session> {
        let result = self
            .call_public(
                Method::Post,
                "/auth/register",
                serde_json::to_value(registration)?,
            )
            .await;
        self.announce(
            result,
            Notice::success("Your account has been created successfully.")
                .with_title("Account Created!"),
            "Registration Failed",
        )
    }

    fn announce(
        &self,
        result: Result<Session>,
        success: Notice,
        failure_title: &str,
    ) -> Result<Session> {
        match &result {
            Ok(_) => self.notices().notify(success),
            Err(e) => self
                .notices()
                .notify(Notice::error(e.to_string()).with_title(failure_title)),
        }
        result
    }
}
