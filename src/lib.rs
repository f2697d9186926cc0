//! commandbot - Command registration and dispatch layer for Telegram bots
//!
//! This library sits between an inbound stream of `teloxide` updates
//! (delivered by a long-poll client or a webhook server, both outside this
//! crate) and integrator-defined command handlers. It classifies each update
//! as a command or non-command, resolves the command token to a registered
//! handler and falls back to the integrator's hooks when nothing matches.
//!
//! # Module Structure
//!
//! - `command`: the [`BotCommand`] capability trait and [`CommandIdentifier`]
//! - `parser`: pure command-token parsing
//! - `registry`: concurrent identifier → command mapping
//! - `dispatch`: routing engine, filter policy, fallback hooks and the
//!   default action chain
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use commandbot::{BotCommand, CommandDispatcher, CommandIdentifier, FallbackHandler, HandlerError};
//! use teloxide::Bot;
//! use teloxide::prelude::*;
//! use teloxide::types::{Chat, Update, User};
//!
//! struct Ping {
//!     identifier: CommandIdentifier,
//! }
//!
//! #[async_trait]
//! impl BotCommand for Ping {
//!     fn identifier(&self) -> &CommandIdentifier {
//!         &self.identifier
//!     }
//!
//!     fn description(&self) -> &str {
//!         "replies with pong"
//!     }
//!
//!     async fn execute(
//!         &self,
//!         bot: &Bot,
//!         chat: &Chat,
//!         _user: Option<&User>,
//!         _args: &[String],
//!     ) -> Result<(), HandlerError> {
//!         bot.send_message(chat.id, "pong").await?;
//!         Ok(())
//!     }
//! }
//!
//! struct IgnoreFallback;
//!
//! #[async_trait]
//! impl FallbackHandler for IgnoreFallback {
//!     async fn process_non_command_update(&self, _bot: &Bot, update: &Update) -> Result<(), HandlerError> {
//!         log::debug!("ignoring non-command update {}", update.id.0);
//!         Ok(())
//!     }
//! }
//!
//! let dispatcher = CommandDispatcher::new(Some("MyBot".to_string()), Arc::new(IgnoreFallback));
//! dispatcher.register(Arc::new(Ping {
//!     identifier: CommandIdentifier::new("/ping"),
//! }));
//! ```

pub mod command;
pub mod dispatch;
pub mod parser;
pub mod registry;

// Re-export commonly used types for convenience
pub use command::{BotCommand, COMMAND_PREFIX, CommandIdentifier, HandlerError};
pub use dispatch::{
    CommandDispatcher, CommandFilter, DefaultAction, DefaultActionChain, FallbackHandler, WebhookReply,
    WebhookReplyError,
};
pub use parser::{CommandCandidate, parse_command};
pub use registry::{CommandRegistry, MatchMode};
