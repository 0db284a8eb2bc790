//! High-level Messenger facade.
//!
//! `Messenger` ties together the subscription handshake, signature
//! verification, callback dispatch and the Graph API clients. It holds
//! only read-only state, so one instance can be cloned or shared across
//! concurrently handled requests.

use crate::messenger::api_client::GraphClient;
use crate::messenger::dispatcher::{self, DispatchOutcome};
use crate::messenger::error::{MessengerError, MessengerResult};
use crate::messenger::events::WebhookEnvelope;
use crate::messenger::handler::CallbackHandler;
use crate::messenger::handover::Handover;
use crate::messenger::messaging::MessengerSendApi;
use crate::messenger::profile::UserProfiles;
use crate::messenger::signature::SignatureVerifier;
use crate::messenger::thread_settings::ThreadSettings;
use crate::messenger::types::*;
use log::{debug, info, warn};
use std::sync::Arc;

/// Adapter handle passed to every callback hook.
#[derive(Debug, Clone)]
pub struct Messenger {
    config: Arc<MessengerConfig>,
    verifier: SignatureVerifier,
    client: GraphClient,
    messaging: MessengerSendApi,
    thread_settings: ThreadSettings,
    handover: Handover,
    profiles: UserProfiles,
}

impl Messenger {
    /// Validate `config` and build the adapter.
    ///
    /// Fails on invalid configuration or app secret; both are fatal and not
    /// worth retrying.
    pub fn new(config: MessengerConfig) -> MessengerResult<Self> {
        config.validate()?;
        let verifier = SignatureVerifier::new(config.app_secret.as_deref())?;
        let client = GraphClient::new(&config)?;

        let messenger = Self {
            verifier,
            messaging: MessengerSendApi::new(client.clone()),
            thread_settings: ThreadSettings::new(client.clone()),
            handover: Handover::new(client.clone()),
            profiles: UserProfiles::new(client.clone()),
            client,
            config: Arc::new(config),
        };
        info!(
            "Messenger adapter configured (Graph {}, signature verification {})",
            messenger.config.api_version,
            if messenger.verifier.is_enabled() { "on" } else { "off" }
        );
        Ok(messenger)
    }

    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }

    pub fn messaging(&self) -> &MessengerSendApi {
        &self.messaging
    }

    pub fn thread_settings(&self) -> &ThreadSettings {
        &self.thread_settings
    }

    pub fn handover(&self) -> &Handover {
        &self.handover
    }

    pub fn profiles(&self) -> &UserProfiles {
        &self.profiles
    }

    // ─── Subscription handshake ──────────────────────────────────────

    /// Answer the webhook GET handshake.
    ///
    /// Returns the `hub.challenge` value (respond 200 with it as the body)
    /// when `hub.mode` is `subscribe` and `hub.verify_token` matches. Any
    /// other combination, missing parameters included, is an error carrying
    /// HTTP status 403.
    pub fn verify_challenge(
        &self,
        mode: Option<&str>,
        verify_token: Option<&str>,
        challenge: Option<&str>,
    ) -> MessengerResult<String> {
        if mode != Some(SUBSCRIBE_MODE) {
            return Err(MessengerError::verification_failed(
                "Invalid webhook mode (expected 'subscribe')",
            ));
        }
        if verify_token != Some(self.config.verify_token.as_str()) {
            warn!("Webhook subscription rejected: verify token mismatch");
            return Err(MessengerError::verification_failed("Verify token mismatch"));
        }
        let challenge = challenge
            .ok_or_else(|| MessengerError::verification_failed("Missing hub.challenge"))?;

        info!("Webhook verification challenge accepted");
        Ok(challenge.to_string())
    }

    /// Convenience for HTTP layers holding the raw query pairs.
    pub fn verify_challenge_query<'a, I>(&self, query: I) -> MessengerResult<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (mut mode, mut token, mut challenge) = (None, None, None);
        for (k, v) in query {
            match k {
                HUB_MODE => mode = Some(v),
                HUB_VERIFY_TOKEN => token = Some(v),
                HUB_CHALLENGE => challenge = Some(v),
                _ => {}
            }
        }
        self.verify_challenge(mode, token, challenge)
    }

    // ─── Callbacks ───────────────────────────────────────────────────

    /// Check the `X-Hub-Signature` value of a webhook POST.
    ///
    /// Always true when no app secret is configured.
    pub fn verify_signature(&self, payload: &[u8], signature: Option<&str>) -> bool {
        self.verifier.verify(payload, signature)
    }

    /// Handle a webhook POST: verify, decode, dispatch.
    ///
    /// A failed signature check returns [`DispatchOutcome::SignatureRejected`]
    /// without decoding the body; the HTTP layer answers 200 either way.
    /// A body whose `object` is not `"page"` is ignored before its entries
    /// are looked at. Malformed JSON is a `SerializationError`; hook errors
    /// propagate.
    pub async fn handle_callback<H>(
        &self,
        payload: &str,
        signature: Option<&str>,
        handler: &H,
    ) -> MessengerResult<DispatchOutcome>
    where
        H: CallbackHandler + ?Sized,
    {
        if !self.verify_signature(payload.as_bytes(), signature) {
            warn!("Webhook signature rejected; callback not dispatched");
            return Ok(DispatchOutcome::SignatureRejected);
        }

        let body: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| MessengerError::serialization(format!("Webhook JSON parse: {}", e)))?;

        // Entries of other subscriptions are never decoded.
        let object = body.get("object").and_then(serde_json::Value::as_str);
        if object != Some(PAGE_OBJECT) {
            debug!("Ignoring webhook for object {:?}", object);
            return Ok(DispatchOutcome::ObjectIgnored);
        }

        let envelope: WebhookEnvelope = serde_json::from_value(body)
            .map_err(|e| MessengerError::serialization(format!("Webhook envelope: {}", e)))?;

        self.dispatch(&envelope, handler).await
    }

    /// Dispatch an already decoded envelope.
    pub async fn dispatch<H>(
        &self,
        envelope: &WebhookEnvelope,
        handler: &H,
    ) -> MessengerResult<DispatchOutcome>
    where
        H: CallbackHandler + ?Sized,
    {
        dispatcher::dispatch(self, envelope, handler).await
    }

    // ─── Send shortcuts ──────────────────────────────────────────────

    pub async fn send(&self, request: &SendRequest) -> MessengerResult<SendResponse> {
        self.messaging.send(request).await
    }

    /// Reply with plain text to the sender of an event.
    pub async fn send_text(&self, recipient_id: &str, text: &str) -> MessengerResult<SendResponse> {
        self.messaging
            .send_text(Recipient::id(recipient_id), text, Vec::new())
            .await
    }
}
