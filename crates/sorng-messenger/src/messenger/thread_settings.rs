//! Thread settings: greeting text, get-started button, persistent menu.
//!
//! All calls target the fixed `me/thread_settings` path.

use crate::messenger::api_client::GraphClient;
use crate::messenger::error::{MessengerError, MessengerResult};
use crate::messenger::types::THREAD_SETTINGS_PATH;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const MAX_GREETING_LENGTH: usize = 160;
pub const MAX_MENU_ITEMS: usize = 5;
const MAX_MENU_TITLE_LENGTH: usize = 30;

/// One persistent-menu entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuItem {
    Postback { title: String, payload: String },
    WebUrl { title: String, url: String },
}

impl MenuItem {
    pub fn postback(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Postback {
            title: title.into(),
            payload: payload.into(),
        }
    }

    pub fn web_url(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::WebUrl {
            title: title.into(),
            url: url.into(),
        }
    }

    fn title(&self) -> &str {
        match self {
            Self::Postback { title, .. } | Self::WebUrl { title, .. } => title,
        }
    }
}

/// Thread-settings client.
#[derive(Debug, Clone)]
pub struct ThreadSettings {
    client: GraphClient,
}

impl ThreadSettings {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Text shown on the welcome screen before the conversation starts.
    pub async fn set_greeting_text(&self, text: &str) -> MessengerResult<()> {
        let body = Self::greeting_body(text)?;
        self.client.post_json(THREAD_SETTINGS_PATH, &body).await?;
        info!("Greeting text updated");
        Ok(())
    }

    /// Show a "Get Started" button that posts `payload` back.
    pub async fn set_get_started_button(&self, payload: &str) -> MessengerResult<()> {
        let body = Self::get_started_body(payload)?;
        self.client.post_json(THREAD_SETTINGS_PATH, &body).await?;
        info!("Get-started button set");
        Ok(())
    }

    pub async fn delete_get_started_button(&self) -> MessengerResult<()> {
        let body = json!({ "setting_type": "call_to_actions", "thread_state": "new_thread" });
        self.client.delete_json(THREAD_SETTINGS_PATH, &body).await?;
        info!("Get-started button removed");
        Ok(())
    }

    pub async fn set_persistent_menu(&self, items: &[MenuItem]) -> MessengerResult<()> {
        let body = Self::persistent_menu_body(items)?;
        self.client.post_json(THREAD_SETTINGS_PATH, &body).await?;
        info!("Persistent menu set ({} items)", items.len());
        Ok(())
    }

    pub async fn delete_persistent_menu(&self) -> MessengerResult<()> {
        let body = json!({ "setting_type": "call_to_actions", "thread_state": "existing_thread" });
        self.client.delete_json(THREAD_SETTINGS_PATH, &body).await?;
        info!("Persistent menu removed");
        Ok(())
    }

    // ─── Bodies ──────────────────────────────────────────────────────

    fn greeting_body(text: &str) -> MessengerResult<serde_json::Value> {
        if text.is_empty() || text.chars().count() > MAX_GREETING_LENGTH {
            return Err(MessengerError::invalid_parameter(format!(
                "Greeting text must be 1–{} characters",
                MAX_GREETING_LENGTH
            )));
        }
        Ok(json!({ "setting_type": "greeting", "greeting": { "text": text } }))
    }

    fn get_started_body(payload: &str) -> MessengerResult<serde_json::Value> {
        if payload.is_empty() {
            return Err(MessengerError::invalid_parameter("Get-started payload must not be empty"));
        }
        Ok(json!({
            "setting_type": "call_to_actions",
            "thread_state": "new_thread",
            "call_to_actions": [{ "payload": payload }]
        }))
    }

    fn persistent_menu_body(items: &[MenuItem]) -> MessengerResult<serde_json::Value> {
        if items.is_empty() || items.len() > MAX_MENU_ITEMS {
            return Err(MessengerError::invalid_parameter(format!(
                "Persistent menu takes 1–{} items",
                MAX_MENU_ITEMS
            )));
        }
        if let Some(item) = items
            .iter()
            .find(|i| i.title().is_empty() || i.title().chars().count() > MAX_MENU_TITLE_LENGTH)
        {
            return Err(MessengerError::invalid_parameter(format!(
                "Invalid menu item title: '{}'",
                item.title()
            )));
        }
        Ok(json!({
            "setting_type": "call_to_actions",
            "thread_state": "existing_thread",
            "call_to_actions": items
        }))
    }
}
