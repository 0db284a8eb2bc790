//! # SortOfRemote NG – Messenger Platform Integration
//!
//! Adapter for receiving Messenger Platform webhook callbacks and calling
//! the Graph Send API:
//!
//! - **Subscription handshake** – `hub.mode` / `hub.verify_token` /
//!   `hub.challenge` verification for the webhook GET request
//! - **Signature verification** – `X-Hub-Signature` HMAC-SHA1 check of the
//!   raw POST body against the app secret
//! - **Callback dispatch** – every messaging and standby item of a webhook
//!   envelope is routed to exactly one hook of a [`CallbackHandler`]
//! - **Send API** – text, attachment, template, quick replies, sender
//!   actions, notification types and message tags
//! - **Thread settings** – greeting text, get-started button, persistent menu
//! - **Handover protocol** – pass / take thread control
//! - **User profiles** – basic profile lookup by page-scoped id
//!
//! [`CallbackHandler`]: messenger::handler::CallbackHandler

pub mod messenger;
