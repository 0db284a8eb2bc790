//! Inbound webhook model.
//!
//! A webhook POST body decodes into a [`WebhookEnvelope`]. Every item of an
//! entry's `messaging` and `standby` lists is classified while decoding:
//! the platform sends each item as an object with several optional fields
//! of which one is expected to be populated. The populated fields are
//! checked in a fixed order and the first match decides the variant, so a
//! malformed item carrying several fields still resolves deterministically.
//! A populated field that does not fit its payload shape makes the item
//! unrecognized; it never fails the envelope.

use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════
//  Envelope
// ═══════════════════════════════════════════════════════════════════════

/// Top-level webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

/// One batch unit of a webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub messaging: Option<Vec<MessagingItem>>,
    #[serde(default, deserialize_with = "lenient")]
    pub standby: Option<Vec<StandbyItem>>,
}

impl WebhookEnvelope {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Number of messaging and standby items across all entries.
    pub fn item_count(&self) -> usize {
        self.entry
            .iter()
            .map(|e| {
                e.messaging.as_ref().map_or(0, Vec::len) + e.standby.as_ref().map_or(0, Vec::len)
            })
            .sum()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Item context
// ═══════════════════════════════════════════════════════════════════════

/// Sender or recipient of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub id: Option<String>,
    /// Set instead of `id` for checkbox plugin opt-ins.
    #[serde(default)]
    pub user_ref: Option<String>,
}

/// A classified item: the common envelope fields plus the event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<T> {
    pub sender: Option<Participant>,
    pub recipient: Option<Participant>,
    /// Milliseconds since the epoch.
    pub timestamp: Option<i64>,
    pub payload: T,
}

impl<T> Event<T> {
    /// Page-scoped id of the sender, if any.
    pub fn sender_id(&self) -> Option<&str> {
        self.sender.as_ref().and_then(|p| p.id.as_deref())
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().and_then(|p| p.id.as_deref())
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Payloads
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub quick_reply: Option<QuickReplyPayload>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
    /// True when this is a copy of a message the page itself sent.
    #[serde(default)]
    pub is_echo: bool,
    /// Sending app, only on echoes.
    #[serde(default)]
    pub app_id: Option<u64>,
    /// Developer metadata, only on echoes.
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub reply_to: Option<ReplyTo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickReplyPayload {
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyTo {
    pub mid: String,
}

/// Attachment on an inbound message; the payload shape depends on `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl Attachment {
    pub fn url(&self) -> Option<&str> {
        self.payload.as_ref().and_then(|p| p["url"].as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub mids: Vec<String>,
    /// Every message sent before this timestamp was delivered.
    #[serde(default)]
    pub watermark: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Read {
    /// Every message sent before this timestamp was read.
    #[serde(default)]
    pub watermark: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Postback {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub referral: Option<Referral>,
    #[serde(default)]
    pub mid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optin {
    #[serde(rename = "ref", default)]
    pub ref_param: Option<String>,
    #[serde(default)]
    pub user_ref: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    #[serde(rename = "ref", default)]
    pub ref_param: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub ad_id: Option<String>,
    #[serde(default)]
    pub referer_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAmount {
    pub currency: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub requested_user_info: Option<serde_json::Value>,
    #[serde(default)]
    pub payment_credential: Option<serde_json::Value>,
    #[serde(default)]
    pub amount: Option<PaymentAmount>,
    #[serde(default)]
    pub shipping_option_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutUpdate {
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountLinkingStatus {
    Linked,
    Unlinked,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLinking {
    pub status: AccountLinkingStatus,
    /// Present only when `status` is `linked`.
    #[serde(default)]
    pub authorization_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEnforcement {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeThreadControl {
    #[serde(default)]
    pub previous_owner_app_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassThreadControl {
    #[serde(default)]
    pub new_owner_app_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// App id → roles held on the page (e.g. `primary_receiver`).
pub type AppRoles = HashMap<String, Vec<String>>;

// ═══════════════════════════════════════════════════════════════════════
//  Classified items
// ═══════════════════════════════════════════════════════════════════════

/// Item of an entry's `messaging` list.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagingItem {
    Message(Event<Message>),
    MessageEcho(Event<Message>),
    Delivery(Event<Delivery>),
    Read(Event<Read>),
    Postback(Event<Postback>),
    Optin(Event<Optin>),
    Referral(Event<Referral>),
    Payment(Event<Payment>),
    CheckoutUpdate(Event<CheckoutUpdate>),
    AccountLinking(Event<AccountLinking>),
    PolicyEnforcement(Event<PolicyEnforcement>),
    TakeThreadControl(Event<TakeThreadControl>),
    PassThreadControl(Event<PassThreadControl>),
    AppRoles(Event<AppRoles>),
    /// None of the known fields was populated; carries the raw item.
    Unrecognized(Event<serde_json::Value>),
}

/// Item of an entry's `standby` list.
///
/// Standby only carries the message, delivery and read kinds; any other
/// populated field is unrecognized here.
#[derive(Debug, Clone, PartialEq)]
pub enum StandbyItem {
    Message(Event<Message>),
    MessageEcho(Event<Message>),
    Delivery(Event<Delivery>),
    Read(Event<Read>),
    Unrecognized(Event<serde_json::Value>),
}

impl MessagingItem {
    /// Name of the hook this item is routed to.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::MessageEcho(_) => "message_echo",
            Self::Delivery(_) => "delivery",
            Self::Read(_) => "read",
            Self::Postback(_) => "postback",
            Self::Optin(_) => "optin",
            Self::Referral(_) => "referral",
            Self::Payment(_) => "payment",
            Self::CheckoutUpdate(_) => "checkout_update",
            Self::AccountLinking(_) => "account_linking",
            Self::PolicyEnforcement(_) => "policy_enforcement",
            Self::TakeThreadControl(_) => "take_thread_control",
            Self::PassThreadControl(_) => "pass_thread_control",
            Self::AppRoles(_) => "app_roles",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

impl StandbyItem {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::MessageEcho(_) => "message_echo",
            Self::Delivery(_) => "delivery",
            Self::Read(_) => "read",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Wire shape of an item before classification.
///
/// Payload fields stay untyped until classification so that one irregular
/// field only affects its own item. A `null` field counts as absent.
#[derive(Default, Deserialize)]
struct RawItem {
    #[serde(default, deserialize_with = "lenient")]
    sender: Option<Participant>,
    #[serde(default, deserialize_with = "lenient")]
    recipient: Option<Participant>,
    #[serde(default, deserialize_with = "lenient")]
    timestamp: Option<i64>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    delivery: Option<Value>,
    #[serde(default)]
    read: Option<Value>,
    #[serde(default)]
    postback: Option<Value>,
    #[serde(default)]
    optin: Option<Value>,
    #[serde(default)]
    referral: Option<Value>,
    #[serde(default)]
    payment: Option<Value>,
    #[serde(default)]
    checkout_update: Option<Value>,
    #[serde(default)]
    account_linking: Option<Value>,
    #[serde(rename = "policy-enforcement", default)]
    policy_enforcement: Option<Value>,
    #[serde(default)]
    take_thread_control: Option<Value>,
    #[serde(default)]
    pass_thread_control: Option<Value>,
    #[serde(default)]
    app_roles: Option<Value>,
}

impl RawItem {
    fn event<T>(&self, payload: T) -> Event<T> {
        Event {
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
            timestamp: self.timestamp,
            payload,
        }
    }

    /// Decode the populated field into `known`, or hand the whole raw item
    /// to `unrecognized` when the field does not fit its payload type.
    fn resolve<T, U>(
        &self,
        field: &str,
        value: Value,
        raw: Value,
        known: fn(Event<T>) -> U,
        unrecognized: fn(Event<Value>) -> U,
    ) -> U
    where
        T: DeserializeOwned,
    {
        match decode_field(field, value) {
            Some(payload) => known(self.event(payload)),
            None => unrecognized(self.event(raw)),
        }
    }

    // Order: message, delivery, read, postback, optin, referral, payment,
    // checkout_update, account_linking, policy-enforcement,
    // take_thread_control, pass_thread_control, app_roles.
    // The first populated field decides, even when it fails to decode.
    fn into_messaging_item(mut self, raw: Value) -> MessagingItem {
        use MessagingItem as M;

        if let Some(v) = self.message.take() {
            return match decode_field::<Message>("message", v) {
                Some(m) if m.is_echo => M::MessageEcho(self.event(m)),
                Some(m) => M::Message(self.event(m)),
                None => M::Unrecognized(self.event(raw)),
            };
        }
        if let Some(v) = self.delivery.take() {
            return self.resolve("delivery", v, raw, M::Delivery, M::Unrecognized);
        }
        if let Some(v) = self.read.take() {
            return self.resolve("read", v, raw, M::Read, M::Unrecognized);
        }
        if let Some(v) = self.postback.take() {
            return self.resolve("postback", v, raw, M::Postback, M::Unrecognized);
        }
        if let Some(v) = self.optin.take() {
            return self.resolve("optin", v, raw, M::Optin, M::Unrecognized);
        }
        if let Some(v) = self.referral.take() {
            return self.resolve("referral", v, raw, M::Referral, M::Unrecognized);
        }
        if let Some(v) = self.payment.take() {
            return self.resolve("payment", v, raw, M::Payment, M::Unrecognized);
        }
        if let Some(v) = self.checkout_update.take() {
            return self.resolve("checkout_update", v, raw, M::CheckoutUpdate, M::Unrecognized);
        }
        if let Some(v) = self.account_linking.take() {
            return self.resolve("account_linking", v, raw, M::AccountLinking, M::Unrecognized);
        }
        if let Some(v) = self.policy_enforcement.take() {
            return self.resolve("policy-enforcement", v, raw, M::PolicyEnforcement, M::Unrecognized);
        }
        if let Some(v) = self.take_thread_control.take() {
            return self.resolve("take_thread_control", v, raw, M::TakeThreadControl, M::Unrecognized);
        }
        if let Some(v) = self.pass_thread_control.take() {
            return self.resolve("pass_thread_control", v, raw, M::PassThreadControl, M::Unrecognized);
        }
        if let Some(v) = self.app_roles.take() {
            return self.resolve("app_roles", v, raw, M::AppRoles, M::Unrecognized);
        }
        M::Unrecognized(self.event(raw))
    }

    fn into_standby_item(mut self, raw: Value) -> StandbyItem {
        use StandbyItem as S;

        if let Some(v) = self.message.take() {
            return match decode_field::<Message>("message", v) {
                Some(m) if m.is_echo => S::MessageEcho(self.event(m)),
                Some(m) => S::Message(self.event(m)),
                None => S::Unrecognized(self.event(raw)),
            };
        }
        if let Some(v) = self.delivery.take() {
            return self.resolve("delivery", v, raw, S::Delivery, S::Unrecognized);
        }
        if let Some(v) = self.read.take() {
            return self.resolve("read", v, raw, S::Read, S::Unrecognized);
        }
        S::Unrecognized(self.event(raw))
    }
}

fn decode_field<T: DeserializeOwned>(field: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(payload) => Some(payload),
        Err(e) => {
            debug!("Webhook item field '{}' not decodable: {}", field, e);
            None
        }
    }
}

/// Deserialize `T`, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn decode_raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<(RawItem, Value), D::Error> {
    let raw = Value::deserialize(deserializer)?;
    // Items that are not JSON objects carry no known field.
    let item = RawItem::deserialize(&raw).unwrap_or_default();
    Ok((item, raw))
}

impl<'de> Deserialize<'de> for MessagingItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (item, raw) = decode_raw(deserializer)?;
        Ok(item.into_messaging_item(raw))
    }
}

impl<'de> Deserialize<'de> for StandbyItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (item, raw) = decode_raw(deserializer)?;
        Ok(item.into_standby_item(raw))
    }
}
