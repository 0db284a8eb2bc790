//! Messenger crate: sub-modules.

pub mod types;
pub mod events;
pub mod error;
pub mod api_client;
pub mod signature;
pub mod handler;
pub mod dispatcher;
pub mod messaging;
pub mod thread_settings;
pub mod handover;
pub mod profile;
pub mod service;

// Re-exports
pub use dispatcher::{dispatch, DispatchOutcome};
pub use error::{MessengerError, MessengerErrorCode, MessengerResult};
pub use events::*;
pub use handler::CallbackHandler;
pub use service::Messenger;
pub use signature::SignatureVerifier;
pub use types::*;
