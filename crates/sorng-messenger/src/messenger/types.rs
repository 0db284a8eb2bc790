//! Shared types for the Messenger Platform integration.
//!
//! Covers adapter configuration and the outbound Send API model:
//! recipients, message payloads, quick replies, sender actions,
//! notification types and message tags. Inbound webhook types live in
//! [`crate::messenger::events`].

use crate::messenger::error::{MessengerError, MessengerResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::borrow::Cow;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
//  Wire constants
// ═══════════════════════════════════════════════════════════════════════

/// Header carrying the `sha1=<hex>` payload signature on webhook POSTs.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
/// Envelope `object` value for page subscriptions; anything else is ignored.
pub const PAGE_OBJECT: &str = "page";
/// Query parameters of the subscription handshake.
pub const HUB_MODE: &str = "hub.mode";
pub const HUB_VERIFY_TOKEN: &str = "hub.verify_token";
pub const HUB_CHALLENGE: &str = "hub.challenge";
/// The only `hub.mode` accepted by the handshake.
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Fixed Graph paths.
pub const MESSAGES_PATH: &str = "me/messages";
pub const THREAD_SETTINGS_PATH: &str = "me/thread_settings";
pub const PASS_THREAD_CONTROL_PATH: &str = "me/pass_thread_control";
pub const TAKE_THREAD_CONTROL_PATH: &str = "me/take_thread_control";

/// Platform limits.
pub const MAX_TEXT_LENGTH: usize = 2000;
pub const MAX_QUICK_REPLIES: usize = 11;

/// Largest accepted `max_retries`.
pub const MAX_RETRIES: u32 = 10;

// ═══════════════════════════════════════════════════════════════════════
//  Configuration
// ═══════════════════════════════════════════════════════════════════════

/// Adapter configuration, shared read-only by every request.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessengerConfig {
    /// Page access token used for Send API calls.
    pub access_token: String,
    /// Token expected in `hub.verify_token` during the subscription handshake.
    pub verify_token: String,
    /// App secret for `X-Hub-Signature` verification.
    ///
    /// When absent, signature verification is disabled and every callback
    /// is dispatched. Only intended for local development.
    #[serde(default)]
    pub app_secret: Option<String>,
    /// Graph API version (e.g. "v21.0").
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Base URL override (default: `https://graph.facebook.com`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout in seconds for API calls.
    #[serde(default = "default_timeout")]
    pub timeout_sec: u32,
    /// Maximum retries for transient failures (at most [`MAX_RETRIES`]).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_version() -> String {
    "v21.0".to_string()
}
fn default_base_url() -> String {
    "https://graph.facebook.com".to_string()
}
fn default_timeout() -> u32 {
    30
}
fn default_max_retries() -> u32 {
    3
}

impl fmt::Debug for MessengerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessengerConfig")
            .field("access_token", &"<redacted>")
            .field("verify_token", &"<redacted>")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("timeout_sec", &self.timeout_sec)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl MessengerConfig {
    /// Configuration with defaults for everything but the credentials.
    pub fn new(access_token: impl Into<String>, verify_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            verify_token: verify_token.into(),
            app_secret: None,
            api_version: default_api_version(),
            base_url: default_base_url(),
            timeout_sec: default_timeout(),
            max_retries: default_max_retries(),
        }
    }

    pub fn with_app_secret(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(app_secret.into());
        self
    }

    /// Check the configuration before any client is built.
    pub fn validate(&self) -> MessengerResult<()> {
        if self.access_token.trim().is_empty() {
            return Err(MessengerError::invalid_config("No access token configured"));
        }
        if self.verify_token.is_empty() {
            return Err(MessengerError::invalid_config("No verify token configured"));
        }
        if self.api_version.trim().is_empty() {
            return Err(MessengerError::invalid_config("API version must not be empty"));
        }
        match reqwest::Url::parse(&self.base_url) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            _ => {
                return Err(MessengerError::invalid_config(format!(
                    "Invalid base URL: {}",
                    self.base_url
                )))
            }
        }
        if self.timeout_sec == 0 {
            return Err(MessengerError::invalid_config("Timeout must be at least one second"));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(MessengerError::invalid_config(format!(
                "max_retries must be at most {}",
                MAX_RETRIES
            )));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Message tags & notification types
// ═══════════════════════════════════════════════════════════════════════

/// Label permitting certain message categories outside the standard
/// messaging window.
///
/// Open set: the platform-defined tags are provided as constants, any other
/// string can be wrapped with [`MessageTag::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageTag(Cow<'static, str>);

impl MessageTag {
    pub const SHIPPING_UPDATE: MessageTag = MessageTag(Cow::Borrowed("SHIPPING_UPDATE"));
    pub const RESERVATION_UPDATE: MessageTag = MessageTag(Cow::Borrowed("RESERVATION_UPDATE"));
    pub const ISSUE_RESOLUTION: MessageTag = MessageTag(Cow::Borrowed("ISSUE_RESOLUTION"));
    pub const APPOINTMENT_UPDATE: MessageTag = MessageTag(Cow::Borrowed("APPOINTMENT_UPDATE"));
    pub const GAME_EVENT: MessageTag = MessageTag(Cow::Borrowed("GAME_EVENT"));
    pub const TRANSPORTATION_UPDATE: MessageTag =
        MessageTag(Cow::Borrowed("TRANSPORTATION_UPDATE"));
    pub const FEATURE_FUNCTIONALITY_UPDATE: MessageTag =
        MessageTag(Cow::Borrowed("FEATURE_FUNCTIONALITY_UPDATE"));
    pub const TICKET_UPDATE: MessageTag = MessageTag(Cow::Borrowed("TICKET_UPDATE"));
    pub const ACCOUNT_UPDATE: MessageTag = MessageTag(Cow::Borrowed("ACCOUNT_UPDATE"));
    pub const PAYMENT_UPDATE: MessageTag = MessageTag(Cow::Borrowed("PAYMENT_UPDATE"));
    pub const PERSONAL_FINANCE_UPDATE: MessageTag =
        MessageTag(Cow::Borrowed("PERSONAL_FINANCE_UPDATE"));
    pub const PAIRING_UPDATE: MessageTag = MessageTag(Cow::Borrowed("PAIRING_UPDATE"));
    pub const HUMAN_AGENT: MessageTag = MessageTag(Cow::Borrowed("HUMAN_AGENT"));

    /// Wrap an arbitrary tag string.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MessageTag {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Push notification behaviour for a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Regular,
    SilentPush,
    NoPush,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::SilentPush => "SILENT_PUSH",
            Self::NoPush => "NO_PUSH",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Recipients
// ═══════════════════════════════════════════════════════════════════════

/// Who a send request is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// Page-scoped user id.
    Id(String),
    /// Phone number (requires the customer matching feature).
    PhoneNumber(String),
    /// Token from the checkbox plugin opt-in.
    UserRef(String),
}

impl Recipient {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Id(id) => json!({ "id": id }),
            Self::PhoneNumber(phone) => json!({ "phone_number": phone }),
            Self::UserRef(user_ref) => json!({ "user_ref": user_ref }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Message payloads
// ═══════════════════════════════════════════════════════════════════════

/// Quick reply button shown above the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickReply {
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl QuickReply {
    /// Text quick reply posting `payload` back when tapped.
    pub fn text(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            content_type: "text".into(),
            title: Some(title.into()),
            payload: Some(payload.into()),
            image_url: None,
        }
    }

    /// Location picker quick reply.
    pub fn location() -> Self {
        Self {
            content_type: "location".into(),
            title: None,
            payload: None,
            image_url: None,
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Media kinds accepted by URL attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    Video,
    File,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::File => "file",
        }
    }
}

/// The `message` object of a send request.
#[derive(Debug, Clone, PartialEq)]
pub enum SendPayload {
    Text {
        text: String,
        quick_replies: Vec<QuickReply>,
    },
    Attachment {
        kind: AttachmentKind,
        url: String,
        is_reusable: bool,
        quick_replies: Vec<QuickReply>,
    },
    /// Structured template; the template body is passed through untouched.
    Template {
        payload: serde_json::Value,
        quick_replies: Vec<QuickReply>,
    },
}

impl SendPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            quick_replies: Vec::new(),
        }
    }

    pub fn attachment(kind: AttachmentKind, url: impl Into<String>) -> Self {
        Self::Attachment {
            kind,
            url: url.into(),
            is_reusable: false,
            quick_replies: Vec::new(),
        }
    }

    pub fn template(payload: serde_json::Value) -> Self {
        Self::Template {
            payload,
            quick_replies: Vec::new(),
        }
    }

    pub fn with_quick_replies(mut self, replies: Vec<QuickReply>) -> Self {
        match &mut self {
            Self::Text { quick_replies, .. }
            | Self::Attachment { quick_replies, .. }
            | Self::Template { quick_replies, .. } => *quick_replies = replies,
        }
        self
    }

    pub fn quick_replies(&self) -> &[QuickReply] {
        match self {
            Self::Text { quick_replies, .. }
            | Self::Attachment { quick_replies, .. }
            | Self::Template { quick_replies, .. } => quick_replies,
        }
    }

    /// Check platform limits.
    pub fn validate(&self) -> MessengerResult<()> {
        if let Self::Text { text, .. } = self {
            if text.is_empty() {
                return Err(MessengerError::invalid_parameter("Message text must not be empty"));
            }
            if text.chars().count() > MAX_TEXT_LENGTH {
                return Err(MessengerError::invalid_parameter(format!(
                    "Message text exceeds {} characters",
                    MAX_TEXT_LENGTH
                )));
            }
        }
        if let Self::Attachment { url, .. } = self {
            if url.is_empty() {
                return Err(MessengerError::invalid_parameter("Attachment URL must not be empty"));
            }
        }
        if self.quick_replies().len() > MAX_QUICK_REPLIES {
            return Err(MessengerError::invalid_parameter(format!(
                "At most {} quick replies are allowed",
                MAX_QUICK_REPLIES
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut message = match self {
            Self::Text { text, .. } => json!({ "text": text }),
            Self::Attachment {
                kind,
                url,
                is_reusable,
                ..
            } => {
                let mut payload = json!({ "url": url });
                if *is_reusable {
                    payload["is_reusable"] = json!(true);
                }
                json!({ "attachment": { "type": kind.as_str(), "payload": payload } })
            }
            Self::Template { payload, .. } => {
                json!({ "attachment": { "type": "template", "payload": payload } })
            }
        };
        let replies = self.quick_replies();
        if !replies.is_empty() {
            message["quick_replies"] = json!(replies);
        }
        message
    }
}

/// Typing indicators and read receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    MarkSeen,
    TypingOn,
    TypingOff,
}

impl SenderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarkSeen => "mark_seen",
            Self::TypingOn => "typing_on",
            Self::TypingOff => "typing_off",
        }
    }
}

/// Either a message or a sender action; the Send API takes exactly one.
#[derive(Debug, Clone, PartialEq)]
pub enum SendContent {
    Message(SendPayload),
    Action(SenderAction),
}

// ═══════════════════════════════════════════════════════════════════════
//  Send request / response
// ═══════════════════════════════════════════════════════════════════════

/// One outbound Send API call (maps to POST /me/messages).
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub recipient: Recipient,
    pub content: SendContent,
    pub notification_type: Option<NotificationType>,
    pub tag: Option<MessageTag>,
}

impl SendRequest {
    pub fn message(recipient: Recipient, payload: SendPayload) -> Self {
        Self {
            recipient,
            content: SendContent::Message(payload),
            notification_type: None,
            tag: None,
        }
    }

    pub fn sender_action(recipient: Recipient, action: SenderAction) -> Self {
        Self {
            recipient,
            content: SendContent::Action(action),
            notification_type: None,
            tag: None,
        }
    }

    pub fn with_notification_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = Some(notification_type);
        self
    }

    pub fn with_tag(mut self, tag: MessageTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Render as the named parameters of the Send API form body.
    ///
    /// JSON-valued parameters are compact JSON strings.
    pub fn to_params(&self) -> MessengerResult<Vec<(&'static str, String)>> {
        let mut params = vec![("recipient", serde_json::to_string(&self.recipient.to_json())?)];
        match &self.content {
            SendContent::Message(payload) => {
                payload.validate()?;
                params.push(("message", serde_json::to_string(&payload.to_json())?));
            }
            SendContent::Action(action) => {
                params.push(("sender_action", action.as_str().to_string()));
            }
        }
        if let Some(nt) = self.notification_type {
            params.push(("notification_type", nt.as_str().to_string()));
        }
        if let Some(ref tag) = self.tag {
            params.push(("tag", tag.as_str().to_string()));
        }
        Ok(params)
    }
}

/// Send API success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}
