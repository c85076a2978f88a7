use serde::de::IgnoredAny;

use super::ApiClient;
use crate::error::Result;
use crate::io::Method;
use crate::model::{Button, ButtonDraft, NewSignal, PinCommand, Signal};

impl ApiClient {
    pub async fn create_signal(&self, project_id: &str, signal: &NewSignal) -> Result<Signal> {
        self.mutate(
            Method::Post,
            &format!("/projects/{}/signals", project_id),
            Some(serde_json::to_value(signal)?),
            "Signal created successfully",
        )
        .await
    }

    pub async fn update_signal_title(&self, signal_id: &str, title: &str) -> Result<Signal> {
        self.mutate(
            Method::Put,
            &format!("/signals/{}", signal_id),
            Some(serde_json::json!({ "title": title })),
            "Signal updated successfully",
        )
        .await
    }

    pub async fn delete_signal(&self, signal_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .mutate(
                Method::Delete,
                &format!("/signals/{}", signal_id),
                None,
                "Signal deleted successfully",
            )
            .await?;
        Ok(())
    }

    pub async fn add_button(&self, signal_id: &str, button: &ButtonDraft) -> Result<Button> {
        self.mutate(
            Method::Post,
            &format!("/signals/{}/buttons", signal_id),
            Some(serde_json::to_value(button)?),
            "Button added successfully",
        )
        .await
    }

    pub async fn update_button(&self, button_id: &str, button: &ButtonDraft) -> Result<Button> {
        self.mutate(
            Method::Put,
            &format!("/buttons/{}", button_id),
            Some(serde_json::to_value(button)?),
            "Button updated successfully",
        )
        .await
    }

    pub async fn delete_button(&self, button_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .mutate(
                Method::Delete,
                &format!("/buttons/{}", button_id),
                None,
                "Button deleted successfully",
            )
            .await?;
        Ok(())
    }

    /// Store the last value a toggle or touch control sent
    ///
    /// Silent on success; controls call this on every activation.
    pub async fn update_released_value(&self, button_id: &str, value: &str) -> Result<()> {
        let _: IgnoredAny = self
            .call(
                Method::Put,
                &format!("/buttons/{}/released", button_id),
                Some(serde_json::json!({ "releaseddata": value })),
            )
            .await?;
        Ok(())
    }

    /// Ask the backend to forward a value to a device pin
    pub async fn send_pin_command(&self, command: &PinCommand) -> Result<()> {
        let _: IgnoredAny = self
            .call(
                Method::Post,
                "/devices/command",
                Some(serde_json::to_value(command)?),
            )
            .await?;
        Ok(())
    }
}
