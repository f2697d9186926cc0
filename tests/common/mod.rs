//! Shared fixtures for dispatch tests
//!
//! Updates are built by deserializing Telegram-shaped JSON into teloxide
//! types, so the fixtures stay honest about what the wire actually carries.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use commandbot::{BotCommand, CommandIdentifier, FallbackHandler, HandlerError, WebhookReply};
use serde_json::json;
use teloxide::Bot;
use teloxide::types::{Chat, Update, User};

pub const TEST_CHAT_ID: i64 = 123456789;

/// Bot instance that never talks to the network in these tests
pub fn test_bot() -> Bot {
    Bot::new("123456:TEST-TOKEN")
}

fn message_json(content_field: &str, value: serde_json::Value) -> serde_json::Value {
    let mut message = json!({
        "message_id": 1,
        "date": 1693000000,
        "chat": {
            "id": TEST_CHAT_ID,
            "type": "private",
            "first_name": "Test"
        },
        "from": {
            "id": TEST_CHAT_ID,
            "is_bot": false,
            "first_name": "Test"
        }
    });
    message[content_field] = value;
    message
}

/// Deserialize an update fixture through its string form; teloxide's
/// custom `UpdateKind` deserializer misparses `serde_json::from_value`
/// input into `UpdateKind::Error`, but handles `from_str` correctly.
fn update_from_json(value: serde_json::Value) -> Result<Update, serde_json::Error> {
    serde_json::from_str(&value.to_string())
}

/// Update carrying a plain text message
pub fn text_update(text: &str) -> Update {
    update_from_json(json!({
        "update_id": 1,
        "message": message_json("text", json!(text))
    }))
    .expect("failed to build text update fixture")
}

/// Update carrying a text message in a group chat
pub fn group_text_update(text: &str) -> Update {
    update_from_json(json!({
        "update_id": 2,
        "message": {
            "message_id": 2,
            "date": 1693000001,
            "chat": {
                "id": -1001234567i64,
                "type": "group",
                "title": "Test Group"
            },
            "from": {
                "id": TEST_CHAT_ID,
                "is_bot": false,
                "first_name": "Test"
            },
            "text": text
        }
    }))
    .expect("failed to build group update fixture")
}

/// Update carrying a non-text (photo) message
pub fn photo_update() -> Update {
    update_from_json(json!({
        "update_id": 3,
        "message": message_json("photo", json!([{
            "file_id": "AgACAgIAAxkBAAM",
            "file_unique_id": "AQADBAAD",
            "width": 90,
            "height": 90,
            "file_size": 1253
        }]))
    }))
    .expect("failed to build photo update fixture")
}

/// Update carrying no message at all (an edited message is routed as
/// message-absent by the dispatcher)
pub fn no_message_update() -> Update {
    update_from_json(json!({
        "update_id": 4,
        "edited_message": message_json("text", json!("edited"))
    }))
    .expect("failed to build edited-message update fixture")
}

/// Command stub that records every invocation's arguments
pub struct RecordingCommand {
    identifier: CommandIdentifier,
    pub calls: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl RecordingCommand {
    pub fn new(identifier: &str) -> Arc<Self> {
        Arc::new(Self {
            identifier: CommandIdentifier::new(identifier),
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    /// A stub whose `execute` always fails
    pub fn failing(identifier: &str) -> Arc<Self> {
        Arc::new(Self {
            identifier: CommandIdentifier::new(identifier),
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_args(&self) -> Option<Vec<String>> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl BotCommand for RecordingCommand {
    fn identifier(&self) -> &CommandIdentifier {
        &self.identifier
    }

    fn description(&self) -> &str {
        "recording stub"
    }

    async fn execute(
        &self,
        _bot: &Bot,
        _chat: &Chat,
        _user: Option<&User>,
        args: &[String],
    ) -> Result<(), HandlerError> {
        self.calls.lock().unwrap().push(args.to_vec());
        if self.fail {
            return Err("handler failure".into());
        }
        Ok(())
    }
}

/// Command that overrides the webhook path to return a method object
pub struct WebhookReplyCommand {
    identifier: CommandIdentifier,
}

impl WebhookReplyCommand {
    pub fn new(identifier: &str) -> Arc<Self> {
        Arc::new(Self {
            identifier: CommandIdentifier::new(identifier),
        })
    }
}

#[async_trait]
impl BotCommand for WebhookReplyCommand {
    fn identifier(&self) -> &CommandIdentifier {
        &self.identifier
    }

    fn description(&self) -> &str {
        "replies through the webhook response body"
    }

    async fn execute(
        &self,
        _bot: &Bot,
        _chat: &Chat,
        _user: Option<&User>,
        _args: &[String],
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn execute_for_webhook(
        &self,
        _bot: &Bot,
        chat: &Chat,
        _user: Option<&User>,
        _args: &[String],
    ) -> Result<Option<WebhookReply>, HandlerError> {
        let reply = WebhookReply::new(
            "sendMessage",
            json!({
                "chat_id": chat.id.0,
                "text": "pong"
            }),
        );
        Ok(Some(reply))
    }
}

/// Fallback that only counts non-command calls
///
/// Deliberately does NOT override `process_invalid_command_update`, so the
/// trait's default delegation to the non-command hook is what gets tested.
#[derive(Default)]
pub struct CountingFallback {
    pub non_command: AtomicUsize,
}

impl CountingFallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn non_command_calls(&self) -> usize {
        self.non_command.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FallbackHandler for CountingFallback {
    async fn process_non_command_update(&self, _bot: &Bot, _update: &Update) -> Result<(), HandlerError> {
        self.non_command.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fallback that overrides the invalid-command hook with its own counter
#[derive(Default)]
pub struct StrictFallback {
    pub non_command: AtomicUsize,
    pub invalid_command: AtomicUsize,
}

impl StrictFallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn non_command_calls(&self) -> usize {
        self.non_command.load(Ordering::SeqCst)
    }

    pub fn invalid_command_calls(&self) -> usize {
        self.invalid_command.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FallbackHandler for StrictFallback {
    async fn process_non_command_update(&self, _bot: &Bot, _update: &Update) -> Result<(), HandlerError> {
        self.non_command.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn process_invalid_command_update(&self, _bot: &Bot, _update: &Update) -> Result<(), HandlerError> {
        self.invalid_command.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
