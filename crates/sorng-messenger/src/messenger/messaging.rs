//! Send messages via the Send API.
//!
//! Every send goes to `POST /me/messages` as named form parameters
//! (`recipient`, `message` or `sender_action`, `notification_type`, `tag`).

use crate::messenger::api_client::GraphClient;
use crate::messenger::error::MessengerResult;
use crate::messenger::types::*;
use log::debug;

/// Message sender backed by the Graph HTTP client.
#[derive(Debug, Clone)]
pub struct MessengerSendApi {
    client: GraphClient,
}

impl MessengerSendApi {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    // ─── Core send helper ────────────────────────────────────────────

    /// Send a fully built request.
    pub async fn send(&self, request: &SendRequest) -> MessengerResult<SendResponse> {
        let params = request.to_params()?;
        let resp = self.client.post_form(MESSAGES_PATH, &params).await?;
        let parsed: SendResponse = serde_json::from_value(resp)?;
        debug!(
            "Send API accepted message {}",
            parsed.message_id.as_deref().unwrap_or("-")
        );
        Ok(parsed)
    }

    // ─── Convenience senders ─────────────────────────────────────────

    /// Send a plain text message.
    pub async fn send_text(
        &self,
        recipient: Recipient,
        text: &str,
        quick_replies: Vec<QuickReply>,
    ) -> MessengerResult<SendResponse> {
        let payload = SendPayload::text(text).with_quick_replies(quick_replies);
        self.send(&SendRequest::message(recipient, payload)).await
    }

    /// Send an image / audio / video / file by public URL.
    pub async fn send_attachment(
        &self,
        recipient: Recipient,
        kind: AttachmentKind,
        url: &str,
    ) -> MessengerResult<SendResponse> {
        let payload = SendPayload::attachment(kind, url);
        self.send(&SendRequest::message(recipient, payload)).await
    }

    /// Send a structured template; `template` is the attachment payload
    /// (`{"template_type": ..., ...}`).
    pub async fn send_template(
        &self,
        recipient: Recipient,
        template: serde_json::Value,
        quick_replies: Vec<QuickReply>,
    ) -> MessengerResult<SendResponse> {
        let payload = SendPayload::template(template).with_quick_replies(quick_replies);
        self.send(&SendRequest::message(recipient, payload)).await
    }

    /// Send a typing indicator or read receipt.
    pub async fn send_sender_action(
        &self,
        recipient: Recipient,
        action: SenderAction,
    ) -> MessengerResult<SendResponse> {
        debug!("Sending sender action {}", action.as_str());
        self.send(&SendRequest::sender_action(recipient, action)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::error::MessengerErrorCode;

    fn api() -> MessengerSendApi {
        let cfg = MessengerConfig::new("token", "verify");
        MessengerSendApi::new(GraphClient::new(&cfg).unwrap())
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected_before_any_request() {
        let err = api()
            .send_text(Recipient::id("1"), "", Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, MessengerErrorCode::InvalidParameter);

        let err = api()
            .send_attachment(Recipient::id("1"), AttachmentKind::File, "")
            .await
            .unwrap_err();
        assert_eq!(err.code, MessengerErrorCode::InvalidParameter);
    }

    #[test]
    fn send_response_parses() {
        let resp: SendResponse = serde_json::from_value(serde_json::json!({
            "recipient_id": "1254477777772919",
            "message_id": "AG5Hz2Uq7tuwNEhXfYYKj8mJEM_QPpz5jdCK48PnKAjSdjfipqxqMvK8ma6AC8fplwlqLP_5cgXIbu7I3rBN0P"
        }))
        .unwrap();
        assert_eq!(resp.recipient_id.as_deref(), Some("1254477777772919"));

        let bare: SendResponse = serde_json::from_value(serde_json::json!({ "success": true })).unwrap();
        assert!(bare.message_id.is_none());
    }
}
