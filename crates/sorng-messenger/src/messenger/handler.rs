//! Application hooks for webhook callbacks.
//!
//! Implement [`CallbackHandler`] and override only the hooks you care
//! about; every hook defaults to doing nothing. Each hook receives the
//! [`Messenger`] handle (for replying through the Send API) and the
//! classified event.
//!
//! A hook returning `Err` stops the dispatch of the remaining items and
//! the error is returned to whoever called the dispatcher.

use crate::messenger::error::MessengerResult;
use crate::messenger::events::*;
use crate::messenger::service::Messenger;
use async_trait::async_trait;

#[async_trait]
pub trait CallbackHandler: Send + Sync {
    // ── messaging ───────────────────────────────────────────────────

    async fn on_message(&self, _messenger: &Messenger, _event: &Event<Message>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_message_echo(&self, _messenger: &Messenger, _event: &Event<Message>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_message_delivered(&self, _messenger: &Messenger, _event: &Event<Delivery>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_message_read(&self, _messenger: &Messenger, _event: &Event<Read>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_postback(&self, _messenger: &Messenger, _event: &Event<Postback>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_optin(&self, _messenger: &Messenger, _event: &Event<Optin>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_referral(&self, _messenger: &Messenger, _event: &Event<Referral>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_payment(&self, _messenger: &Messenger, _event: &Event<Payment>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_checkout_update(&self, _messenger: &Messenger, _event: &Event<CheckoutUpdate>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_account_linking(&self, _messenger: &Messenger, _event: &Event<AccountLinking>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_policy_enforcement(
        &self,
        _messenger: &Messenger,
        _event: &Event<PolicyEnforcement>,
    ) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_take_thread_control(
        &self,
        _messenger: &Messenger,
        _event: &Event<TakeThreadControl>,
    ) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_pass_thread_control(
        &self,
        _messenger: &Messenger,
        _event: &Event<PassThreadControl>,
    ) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_app_roles(&self, _messenger: &Messenger, _event: &Event<AppRoles>) -> MessengerResult<()> {
        Ok(())
    }

    /// Messaging item with none of the known fields populated.
    async fn fallback(&self, _messenger: &Messenger, _event: &Event<serde_json::Value>) -> MessengerResult<()> {
        Ok(())
    }

    // ── standby ─────────────────────────────────────────────────────

    async fn on_standby_message(&self, _messenger: &Messenger, _event: &Event<Message>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_standby_message_echo(&self, _messenger: &Messenger, _event: &Event<Message>) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_standby_message_delivered(
        &self,
        _messenger: &Messenger,
        _event: &Event<Delivery>,
    ) -> MessengerResult<()> {
        Ok(())
    }

    async fn on_standby_message_read(&self, _messenger: &Messenger, _event: &Event<Read>) -> MessengerResult<()> {
        Ok(())
    }

    /// Standby item that is not a message, echo, delivery or read.
    async fn standby_fallback(
        &self,
        _messenger: &Messenger,
        _event: &Event<serde_json::Value>,
    ) -> MessengerResult<()> {
        Ok(())
    }
}
