//! Dispatch engine and fallback chain
//!
//! Routes each inbound update through the same decision sequence for both
//! delivery modes: message present → text present → filter veto → parse →
//! registry lookup → handler, with the integrator's fallback hooks catching
//! everything that is not a registered command.
//!
//! Unregistered-command handling deserves a careful read. When no default
//! action is set and `process_invalid_command_update` is not overridden, an
//! unregistered but syntactically valid command is forwarded to
//! `process_non_command_update` — from the chat user's point of view it is
//! indistinguishable from plain text, with no error reply. That delegation
//! is a contract of this crate, not an accident; integrators who want an
//! "unknown command" reply override the invalid-command hook. When a default
//! action IS set, it intercepts unregistered commands before either hook.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::Serialize;
use teloxide::Bot;
use teloxide::prelude::{Requester, ResponseResult};
use teloxide::types::{BotCommand as MenuCommand, Message, Update, UpdateKind};
use thiserror::Error;

use crate::command::{BotCommand, CommandIdentifier, HandlerError};
use crate::parser::parse_command;
use crate::registry::{CommandRegistry, MatchMode};

/// Predicate deciding whether a command-looking message should be treated
/// as ordinary text. `true` means veto: the update takes the non-command
/// path and never reaches the registry.
pub type CommandFilter = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// Consumer invoked for unregistered commands when set
pub type DefaultAction = Arc<dyn Fn(Bot, Message) -> BoxFuture<'static, ()> + Send + Sync>;

/// A serializable Bot API method object, suitable as a webhook HTTP
/// response body: `{"method": "sendMessage", "chat_id": ..., ...}`
#[derive(Debug, Clone, Serialize)]
pub struct WebhookReply {
    /// Bot API method name, e.g. `sendMessage`
    pub method: String,
    /// Method parameters, flattened next to `method` on the wire
    #[serde(flatten)]
    pub payload: serde_json::Value,
}

/// Failed to build a [`WebhookReply`] from a typed payload
#[derive(Error, Debug)]
pub enum WebhookReplyError {
    #[error("failed to serialize method payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl WebhookReply {
    /// Build a reply from a method name and already-serialized parameters
    pub fn new(method: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            payload,
        }
    }

    /// Build a reply by serializing a typed parameter struct
    pub fn from_payload<T: Serialize>(method: impl Into<String>, payload: &T) -> Result<Self, WebhookReplyError> {
        Ok(Self::new(method, serde_json::to_value(payload)?))
    }
}

/// Integrator hooks for everything that is not a registered command
///
/// `process_non_command_update` receives the full update, not just the
/// message: updates without a message (callback queries, polls, ...) land
/// here too.
#[async_trait]
pub trait FallbackHandler: Send + Sync {
    /// Handle an update that is not a command for this bot
    async fn process_non_command_update(&self, bot: &Bot, update: &Update) -> Result<(), HandlerError>;

    /// Handle a syntactically valid but unregistered command
    ///
    /// The provided implementation delegates to
    /// [`process_non_command_update`](Self::process_non_command_update);
    /// override it to send an error reply instead.
    async fn process_invalid_command_update(&self, bot: &Bot, update: &Update) -> Result<(), HandlerError> {
        self.process_non_command_update(bot, update).await
    }
}

/// Single-slot chain holding the default consumer for unregistered commands
///
/// Unlike the registry, setting a consumer replaces any previous one: last
/// write wins.
#[derive(Default)]
pub struct DefaultActionChain {
    slot: RwLock<Option<DefaultAction>>,
}

impl DefaultActionChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default consumer, replacing any existing one
    pub fn set_default<F, Fut>(&self, action: F)
    where
        F: Fn(Bot, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let action: DefaultAction = Arc::new(move |bot, msg| Box::pin(action(bot, msg)));
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(action);
        }
    }

    /// Snapshot of the current consumer, if any
    pub fn current(&self) -> Option<DefaultAction> {
        self.slot.read().ok().and_then(|slot| slot.clone())
    }

    /// Invoke the current consumer; a no-op, not an error, when none is set
    ///
    /// The slot lock is released before the consumer's future is awaited.
    pub async fn invoke(&self, bot: Bot, message: Message) {
        if let Some(action) = self.current() {
            (*action)(bot, message).await;
        }
    }
}

/// Where an update ends up after the routing decision
enum Route<'u> {
    NonCommand,
    InvalidCommand,
    DefaultAction {
        message: &'u Message,
        action: DefaultAction,
    },
    Execute {
        command: Arc<dyn BotCommand>,
        message: &'u Message,
        args: Vec<String>,
    },
}

/// Orchestrates parser, filter, registry and fallback for one bot instance
///
/// Safe to share behind an `Arc` and drive from any number of concurrent
/// webhook requests or poll-batch workers; commands may be registered and
/// deregistered while dispatch is in flight.
pub struct CommandDispatcher {
    registry: CommandRegistry,
    default_action: DefaultActionChain,
    fallback: Arc<dyn FallbackHandler>,
    filter: RwLock<CommandFilter>,
    bot_username: Option<String>,
}

impl CommandDispatcher {
    /// Create a dispatcher with an empty, exact-matching registry
    ///
    /// `bot_username` is this bot's own username, used to claim or disown
    /// `@username`-suffixed commands in group chats; pass `None` for a bot
    /// that never shares a chat with other bots.
    pub fn new(bot_username: Option<String>, fallback: Arc<dyn FallbackHandler>) -> Self {
        Self::with_match_mode(bot_username, fallback, MatchMode::Exact)
    }

    /// Create a dispatcher whose registry uses the given match mode
    pub fn with_match_mode(
        bot_username: Option<String>,
        fallback: Arc<dyn FallbackHandler>,
        match_mode: MatchMode,
    ) -> Self {
        Self {
            registry: CommandRegistry::with_match_mode(match_mode),
            default_action: DefaultActionChain::new(),
            fallback,
            filter: RwLock::new(Arc::new(|_: &Message| false)),
            bot_username,
        }
    }

    /// The underlying registry
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Register a command; `false` if its identifier is already taken
    pub fn register(&self, command: Arc<dyn BotCommand>) -> bool {
        self.registry.register(command)
    }

    /// Register several commands, collecting each individual outcome
    pub fn register_all<I>(&self, commands: I) -> Vec<(Arc<dyn BotCommand>, bool)>
    where
        I: IntoIterator<Item = Arc<dyn BotCommand>>,
    {
        self.registry.register_all(commands)
    }

    /// Deregister by the supplied command's identifier; `false` if absent
    pub fn deregister(&self, command: &dyn BotCommand) -> bool {
        self.registry.deregister(command)
    }

    /// Deregister several commands, collecting each individual outcome
    pub fn deregister_all<I>(&self, commands: I) -> Vec<(Arc<dyn BotCommand>, bool)>
    where
        I: IntoIterator<Item = Arc<dyn BotCommand>>,
    {
        self.registry.deregister_all(commands)
    }

    /// Read-only lookup for diagnostics
    pub fn get_registered_command(&self, identifier: &str) -> Option<Arc<dyn BotCommand>> {
        self.registry.lookup(&CommandIdentifier::new(identifier))
    }

    /// Snapshot of every registered command
    pub fn get_registered_commands(&self) -> Vec<Arc<dyn BotCommand>> {
        self.registry.commands()
    }

    /// Replace the filter policy
    ///
    /// The filter runs on every text message, strictly before parsing and
    /// registry lookup; returning `true` forces non-command treatment, so a
    /// filtered message never triggers the invalid-command path.
    pub fn set_filter<F>(&self, filter: F)
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        if let Ok(mut slot) = self.filter.write() {
            *slot = Arc::new(filter);
        }
    }

    /// Set the default consumer for unregistered commands (last write wins)
    pub fn register_default_action<F, Fut>(&self, action: F)
    where
        F: Fn(Bot, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.default_action.set_default(action);
    }

    /// The default action chain
    pub fn default_action(&self) -> &DefaultActionChain {
        &self.default_action
    }

    fn is_filtered(&self, message: &Message) -> bool {
        let filter = match self.filter.read() {
            Ok(slot) => Arc::clone(&*slot),
            Err(_) => return false,
        };
        (*filter)(message)
    }

    fn route<'u>(&self, update: &'u Update) -> Route<'u> {
        let message = match &update.kind {
            UpdateKind::Message(message) => message,
            _ => return Route::NonCommand,
        };

        let Some(text) = message.text() else {
            return Route::NonCommand;
        };

        if self.is_filtered(message) {
            log::debug!("message in chat {} vetoed by filter", message.chat.id);
            return Route::NonCommand;
        }

        let Some(candidate) = parse_command(text, self.bot_username.as_deref()) else {
            return Route::NonCommand;
        };

        match self.registry.lookup(&candidate.identifier) {
            Some(command) => {
                log::debug!(
                    "dispatching {} with {} args in chat {}",
                    candidate.identifier,
                    candidate.args.len(),
                    message.chat.id
                );
                Route::Execute {
                    command,
                    message,
                    args: candidate.args,
                }
            }
            None => match self.default_action.current() {
                Some(action) => {
                    log::debug!("{} not registered, running default action", candidate.identifier);
                    Route::DefaultAction { message, action }
                }
                None => {
                    log::debug!("{} not registered, taking invalid-command path", candidate.identifier);
                    Route::InvalidCommand
                }
            },
        }
    }

    /// Process one update in fire-and-forget mode
    ///
    /// Anything a handler wants to send goes through the injected [`Bot`].
    /// Handler failures are not caught here; they propagate to the caller.
    pub async fn on_update_received(&self, bot: &Bot, update: &Update) -> Result<(), HandlerError> {
        match self.route(update) {
            Route::Execute { command, message, args } => {
                command.execute(bot, &message.chat, message.from.as_ref(), &args).await
            }
            Route::DefaultAction { message, action } => {
                (*action)(bot.clone(), message.clone()).await;
                Ok(())
            }
            Route::InvalidCommand => self.fallback.process_invalid_command_update(bot, update).await,
            Route::NonCommand => self.fallback.process_non_command_update(bot, update).await,
        }
    }

    /// Process one update in webhook mode, producing the method object to
    /// embed as the HTTP response body
    ///
    /// Returns `Ok(None)` for every fallback path, and for matched handlers
    /// that send via the side channel instead of overriding
    /// [`BotCommand::execute_for_webhook`].
    pub async fn on_webhook_update_received(
        &self,
        bot: &Bot,
        update: &Update,
    ) -> Result<Option<WebhookReply>, HandlerError> {
        match self.route(update) {
            Route::Execute { command, message, args } => {
                command
                    .execute_for_webhook(bot, &message.chat, message.from.as_ref(), &args)
                    .await
            }
            Route::DefaultAction { message, action } => {
                (*action)(bot.clone(), message.clone()).await;
                Ok(None)
            }
            Route::InvalidCommand => {
                self.fallback.process_invalid_command_update(bot, update).await?;
                Ok(None)
            }
            Route::NonCommand => {
                self.fallback.process_non_command_update(bot, update).await?;
                Ok(None)
            }
        }
    }

    /// Push the registered commands to Telegram's command menu
    ///
    /// Sends identifier (without the `/`) and description for every
    /// registered command via `setMyCommands`.
    pub async fn sync_command_menu(&self, bot: &Bot) -> ResponseResult<()> {
        let mut menu: Vec<MenuCommand> = self
            .registry
            .commands()
            .iter()
            .map(|command| MenuCommand::new(command.identifier().name(), command.description()))
            .collect();
        menu.sort_by(|a, b| a.command.cmp(&b.command));

        bot.set_my_commands(menu).await?;
        Ok(())
    }
}
