//! Handover protocol: move thread ownership between apps on the page.

use crate::messenger::api_client::GraphClient;
use crate::messenger::error::{MessengerError, MessengerResult};
use crate::messenger::types::{Recipient, PASS_THREAD_CONTROL_PATH, TAKE_THREAD_CONTROL_PATH};
use log::info;
use serde_json::json;

/// Page inbox app id, used as the pass target to hand a thread to humans.
pub const PAGE_INBOX_APP_ID: &str = "263902037430900";

#[derive(Debug, Clone)]
pub struct Handover {
    client: GraphClient,
}

impl Handover {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Hand the thread to `target_app_id`.
    pub async fn pass_thread_control(
        &self,
        recipient: &Recipient,
        target_app_id: &str,
        metadata: Option<&str>,
    ) -> MessengerResult<()> {
        let body = Self::pass_body(recipient, target_app_id, metadata)?;
        self.client.post_json(PASS_THREAD_CONTROL_PATH, &body).await?;
        info!("Passed thread control to app {}", target_app_id);
        Ok(())
    }

    /// Take the thread back from its current owner (primary receiver only).
    pub async fn take_thread_control(
        &self,
        recipient: &Recipient,
        metadata: Option<&str>,
    ) -> MessengerResult<()> {
        let body = Self::take_body(recipient, metadata);
        self.client.post_json(TAKE_THREAD_CONTROL_PATH, &body).await?;
        info!("Took thread control");
        Ok(())
    }

    fn pass_body(
        recipient: &Recipient,
        target_app_id: &str,
        metadata: Option<&str>,
    ) -> MessengerResult<serde_json::Value> {
        if target_app_id.is_empty() || !target_app_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(MessengerError::invalid_parameter(format!(
                "Invalid target app id: '{}'",
                target_app_id
            )));
        }
        let mut body = json!({
            "recipient": recipient.to_json(),
            "target_app_id": target_app_id,
        });
        if let Some(m) = metadata {
            body["metadata"] = json!(m);
        }
        Ok(body)
    }

    fn take_body(recipient: &Recipient, metadata: Option<&str>) -> serde_json::Value {
        let mut body = json!({ "recipient": recipient.to_json() });
        if let Some(m) = metadata {
            body["metadata"] = json!(m);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_body_shape() {
        let body = Handover::pass_body(&Recipient::id("U1"), PAGE_INBOX_APP_ID, Some("escalate")).unwrap();
        assert_eq!(body["recipient"]["id"], "U1");
        assert_eq!(body["target_app_id"], PAGE_INBOX_APP_ID);
        assert_eq!(body["metadata"], "escalate");
    }

    #[test]
    fn pass_body_rejects_bad_app_id() {
        assert!(Handover::pass_body(&Recipient::id("U1"), "", None).is_err());
        assert!(Handover::pass_body(&Recipient::id("U1"), "abc", None).is_err());
    }

    #[test]
    fn take_body_without_metadata() {
        let body = Handover::take_body(&Recipient::id("U1"), None);
        assert_eq!(body, json!({ "recipient": { "id": "U1" } }));
    }
}
