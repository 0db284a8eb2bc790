//! Callback dispatch.
//!
//! Walks a decoded [`WebhookEnvelope`] and invokes exactly one
//! [`CallbackHandler`] hook per item, in the order the items arrived:
//! entry by entry, the `messaging` list first, then the `standby` list.

use crate::messenger::error::MessengerResult;
use crate::messenger::events::{MessagingItem, StandbyItem, WebhookEnvelope};
use crate::messenger::handler::CallbackHandler;
use crate::messenger::service::Messenger;
use crate::messenger::types::PAGE_OBJECT;
use log::debug;

/// What happened to an inbound callback.
///
/// Neither a rejected signature nor a foreign `object` is an error: the
/// HTTP layer still answers 200 and nothing is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Hooks were invoked for `items` items.
    Dispatched { items: usize },
    /// The `X-Hub-Signature` check failed; the body was not decoded.
    SignatureRejected,
    /// The envelope `object` was not `"page"`.
    ObjectIgnored,
}

/// Dispatch every item of `envelope` to `handler`.
///
/// Stops at the first hook error and returns it.
pub async fn dispatch<H>(
    messenger: &Messenger,
    envelope: &WebhookEnvelope,
    handler: &H,
) -> MessengerResult<DispatchOutcome>
where
    H: CallbackHandler + ?Sized,
{
    if envelope.object != PAGE_OBJECT {
        debug!("Ignoring webhook for object '{}'", envelope.object);
        return Ok(DispatchOutcome::ObjectIgnored);
    }

    let mut items = 0usize;
    for entry in &envelope.entry {
        for item in entry.messaging.iter().flatten() {
            dispatch_messaging(messenger, item, handler).await?;
            items += 1;
        }
        for item in entry.standby.iter().flatten() {
            dispatch_standby(messenger, item, handler).await?;
            items += 1;
        }
    }

    debug!("Dispatched {} webhook items", items);
    Ok(DispatchOutcome::Dispatched { items })
}

async fn dispatch_messaging<H>(
    messenger: &Messenger,
    item: &MessagingItem,
    handler: &H,
) -> MessengerResult<()>
where
    H: CallbackHandler + ?Sized,
{
    match item {
        MessagingItem::Message(ev) => handler.on_message(messenger, ev).await,
        MessagingItem::MessageEcho(ev) => handler.on_message_echo(messenger, ev).await,
        MessagingItem::Delivery(ev) => handler.on_message_delivered(messenger, ev).await,
        MessagingItem::Read(ev) => handler.on_message_read(messenger, ev).await,
        MessagingItem::Postback(ev) => handler.on_postback(messenger, ev).await,
        MessagingItem::Optin(ev) => handler.on_optin(messenger, ev).await,
        MessagingItem::Referral(ev) => handler.on_referral(messenger, ev).await,
        MessagingItem::Payment(ev) => handler.on_payment(messenger, ev).await,
        MessagingItem::CheckoutUpdate(ev) => handler.on_checkout_update(messenger, ev).await,
        MessagingItem::AccountLinking(ev) => handler.on_account_linking(messenger, ev).await,
        MessagingItem::PolicyEnforcement(ev) => handler.on_policy_enforcement(messenger, ev).await,
        MessagingItem::TakeThreadControl(ev) => handler.on_take_thread_control(messenger, ev).await,
        MessagingItem::PassThreadControl(ev) => handler.on_pass_thread_control(messenger, ev).await,
        MessagingItem::AppRoles(ev) => handler.on_app_roles(messenger, ev).await,
        MessagingItem::Unrecognized(ev) => handler.fallback(messenger, ev).await,
    }
}

async fn dispatch_standby<H>(
    messenger: &Messenger,
    item: &StandbyItem,
    handler: &H,
) -> MessengerResult<()>
where
    H: CallbackHandler + ?Sized,
{
    match item {
        StandbyItem::Message(ev) => handler.on_standby_message(messenger, ev).await,
        StandbyItem::MessageEcho(ev) => handler.on_standby_message_echo(messenger, ev).await,
        StandbyItem::Delivery(ev) => handler.on_standby_message_delivered(messenger, ev).await,
        StandbyItem::Read(ev) => handler.on_standby_message_read(messenger, ev).await,
        StandbyItem::Unrecognized(ev) => handler.standby_fallback(messenger, ev).await,
    }
}
