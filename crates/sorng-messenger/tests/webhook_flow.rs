use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use sorng_messenger::messenger::{
    AccountLinking, AccountLinkingStatus, CallbackHandler, DispatchOutcome, Event, Message,
    Messenger, MessengerConfig, MessengerResult, Postback, SignatureVerifier,
};

const SECRET: &str = "app_secret_for_tests";

#[derive(Default)]
struct EchoBot {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl CallbackHandler for EchoBot {
    async fn on_message(&self, _messenger: &Messenger, event: &Event<Message>) -> MessengerResult<()> {
        let text = event.payload.text.clone().unwrap_or_default();
        self.seen.lock().unwrap().push(format!("message:{}", text));
        Ok(())
    }

    async fn on_postback(&self, _messenger: &Messenger, event: &Event<Postback>) -> MessengerResult<()> {
        let payload = event.payload.payload.clone().unwrap_or_default();
        self.seen.lock().unwrap().push(format!("postback:{}", payload));
        Ok(())
    }

    async fn on_account_linking(
        &self,
        _messenger: &Messenger,
        event: &Event<AccountLinking>,
    ) -> MessengerResult<()> {
        let linked = event.payload.status == AccountLinkingStatus::Linked;
        self.seen.lock().unwrap().push(format!("account_linking:{}", linked));
        Ok(())
    }

    async fn fallback(&self, _messenger: &Messenger, _event: &Event<serde_json::Value>) -> MessengerResult<()> {
        self.seen.lock().unwrap().push("fallback".to_string());
        Ok(())
    }
}

impl EchoBot {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

fn body() -> String {
    json!({
        "object": "page",
        "entry": [{
            "id": "PAGE_ID",
            "time": 1458692752478i64,
            "messaging": [
                { "sender": { "id": "USER_ID" }, "recipient": { "id": "PAGE_ID" }, "timestamp": 1458692752478i64,
                  "message": { "mid": "mid.1", "text": "hello" } },
                { "sender": { "id": "USER_ID" }, "recipient": { "id": "PAGE_ID" }, "timestamp": 1458692752479i64,
                  "message": { "mid": "mid.2", "text": "again" } },
                { "sender": { "id": "USER_ID" }, "recipient": { "id": "PAGE_ID" }, "timestamp": 1458692752480i64,
                  "postback": { "title": "Start", "payload": "GET_STARTED" } },
                { "sender": { "id": "USER_ID" }, "recipient": { "id": "PAGE_ID" }, "timestamp": 1458692752481i64 }
            ]
        }]
    })
    .to_string()
}

fn secured() -> Messenger {
    Messenger::new(MessengerConfig::new("page_token", "verify_me").with_app_secret(SECRET)).unwrap()
}

#[tokio::test]
async fn signed_callback_is_dispatched_in_order() {
    let messenger = secured();
    let payload = body();
    let signature = SignatureVerifier::new(Some(SECRET))
        .unwrap()
        .sign(payload.as_bytes())
        .unwrap();

    let bot = EchoBot::default();
    let outcome = messenger
        .handle_callback(&payload, Some(&signature), &bot)
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Dispatched { items: 4 });
    assert_eq!(
        bot.seen(),
        vec!["message:hello", "message:again", "postback:GET_STARTED", "fallback"]
    );
}

#[tokio::test]
async fn bad_signature_dispatches_nothing() {
    let messenger = secured();
    let bot = EchoBot::default();

    for sig in [None, Some("sha1=deadbeef"), Some("deadbeef"), Some("sha256=abc")] {
        let outcome = messenger.handle_callback(&body(), sig, &bot).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::SignatureRejected);
    }
    assert!(bot.seen().is_empty());
}

#[tokio::test]
async fn bad_signature_skips_decoding() {
    let bot = EchoBot::default();
    let outcome = secured()
        .handle_callback("not even json", Some("sha1=00"), &bot)
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::SignatureRejected);
}

#[test]
fn without_secret_any_signature_dispatches() {
    let messenger = Messenger::new(MessengerConfig::new("page_token", "verify_me")).unwrap();

    for sig in [None, Some("garbage"), Some("sha1=0000")] {
        let bot = EchoBot::default();
        let outcome = tokio_test::block_on(messenger.handle_callback(&body(), sig, &bot)).unwrap();
        assert_eq!(outcome, DispatchOutcome::Dispatched { items: 4 });
        assert_eq!(bot.seen().len(), 4);
    }
}

#[tokio::test]
async fn foreign_object_is_ignored() {
    let messenger = Messenger::new(MessengerConfig::new("page_token", "verify_me")).unwrap();
    let payload = body().replace("\"page\"", "\"user\"");
    let bot = EchoBot::default();
    let outcome = messenger.handle_callback(&payload, None, &bot).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::ObjectIgnored);
    assert!(bot.seen().is_empty());
}

#[tokio::test]
async fn shared_adapter_handles_concurrent_requests() {
    let messenger = std::sync::Arc::new(secured());
    let payload = body();
    let signature = SignatureVerifier::new(Some(SECRET))
        .unwrap()
        .sign(payload.as_bytes())
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let messenger = messenger.clone();
        let payload = payload.clone();
        let signature = signature.clone();
        tasks.push(tokio::spawn(async move {
            let bot = EchoBot::default();
            let outcome = messenger
                .handle_callback(&payload, Some(&signature), &bot)
                .await
                .unwrap();
            (outcome, bot.seen().len())
        }));
    }
    for task in tasks {
        let (outcome, seen) = task.await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Dispatched { items: 4 });
        assert_eq!(seen, 4);
    }
}

#[tokio::test]
async fn foreign_object_with_unfamiliar_items_is_ignored() {
    let messenger = Messenger::new(MessengerConfig::new("page_token", "verify_me")).unwrap();
    let payload = json!({
        "object": "instagram",
        "entry": [{
            "id": 17841400000000000u64,
            "messaging": [{ "read": { "mid": "x" } }, { "delivery": "soon" }],
            "changes": [{ "field": "comments", "value": { "text": "nice" } }]
        }]
    })
    .to_string();
    let bot = EchoBot::default();
    let outcome = messenger.handle_callback(&payload, None, &bot).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::ObjectIgnored);
    assert!(bot.seen().is_empty());
}

#[tokio::test]
async fn irregular_item_does_not_block_its_siblings() {
    let messenger = secured();
    let payload = json!({
        "object": "page",
        "entry": [{
            "id": "PAGE_ID",
            "time": 1458692752478i64,
            "messaging": [
                { "sender": { "id": "USER_ID" }, "recipient": { "id": "PAGE_ID" }, "timestamp": 1,
                  "message": { "mid": "mid.1", "text": "hello" } },
                { "sender": { "id": "USER_ID" }, "recipient": { "id": "PAGE_ID" }, "timestamp": 2,
                  "account_linking": { "status": "pending" } },
                { "sender": { "id": "USER_ID" }, "recipient": { "id": "PAGE_ID" }, "timestamp": 3,
                  "postback": { "payload": ["not", "a", "string"] } },
                { "sender": { "id": "USER_ID" }, "recipient": { "id": "PAGE_ID" }, "timestamp": 4,
                  "message": null, "postback": { "payload": "AFTER_NULL" } }
            ]
        }]
    })
    .to_string();
    let signature = SignatureVerifier::new(Some(SECRET))
        .unwrap()
        .sign(payload.as_bytes())
        .unwrap();

    let bot = EchoBot::default();
    let outcome = messenger
        .handle_callback(&payload, Some(&signature), &bot)
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Dispatched { items: 4 });
    assert_eq!(
        bot.seen(),
        vec!["message:hello", "account_linking:false", "fallback", "postback:AFTER_NULL"]
    );
}
