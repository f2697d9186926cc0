//! Command capability trait and identifier type
//!
//! A command is anything the integrator can register against an identifier
//! such as `/start`. The registry and dispatcher only ever see commands
//! through the [`BotCommand`] trait object; they never construct, destroy
//! or mutate one.

use std::fmt;

use async_trait::async_trait;
use teloxide::Bot;
use teloxide::types::{Chat, User};

use crate::dispatch::WebhookReply;

/// Error type for command handlers and dispatch
///
/// Handler failures are deliberately not caught by the dispatcher: the core
/// has no idea what recovery means for an arbitrary handler, so errors
/// propagate to whoever called dispatch (usually the transport host).
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Leading character that marks a command in message text
pub const COMMAND_PREFIX: char = '/';

/// The token that names a registered command, e.g. `/start`
///
/// Identifiers are normalized to always carry the leading `/`. Equality and
/// hashing are by string content, so the registry matches by identifier and
/// never by object identity. Matching is case-sensitive unless the registry
/// is configured with [`MatchMode::AsciiCaseInsensitive`].
///
/// [`MatchMode::AsciiCaseInsensitive`]: crate::registry::MatchMode
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandIdentifier(String);

impl CommandIdentifier {
    /// Create an identifier from a raw token, with or without the leading `/`
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with(COMMAND_PREFIX) {
            Self(raw.to_string())
        } else {
            Self(format!("{COMMAND_PREFIX}{raw}"))
        }
    }

    /// Full token including the `/` prefix
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bare name without the `/` prefix, as the Bot API `setMyCommands` wants it
    pub fn name(&self) -> &str {
        &self.0[COMMAND_PREFIX.len_utf8()..]
    }

    /// Identifier with the name lowercased, for case-insensitive registries
    pub(crate) fn to_ascii_lowercase(&self) -> Self {
        Self(self.0.to_ascii_lowercase())
    }
}

impl fmt::Display for CommandIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommandIdentifier {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A named, registrable bot command
///
/// Implementations are supplied entirely by the integrator. `execute` is the
/// fire-and-forget entry point: anything the command wants to send goes out
/// through the injected [`Bot`], not through a return value.
///
/// `execute_for_webhook` exists for webhook delivery, where the HTTP response
/// body may carry a single Bot API method object. The default implementation
/// delegates to `execute` and returns `Ok(None)`, so a command that only
/// sends via the side channel yields an empty webhook response by design.
#[async_trait]
pub trait BotCommand: Send + Sync {
    /// The identifier this command is registered under
    fn identifier(&self) -> &CommandIdentifier;

    /// Human-readable description, used for the Telegram command menu
    fn description(&self) -> &str;

    /// Handle one invocation of the command
    ///
    /// # Arguments
    /// * `bot` - Sender capability for side-channel sends
    /// * `chat` - Chat the triggering message arrived in
    /// * `user` - Sending user, when the platform provides one
    /// * `args` - Whitespace-split tokens following the command token
    async fn execute(
        &self,
        bot: &Bot,
        chat: &Chat,
        user: Option<&User>,
        args: &[String],
    ) -> Result<(), HandlerError>;

    /// Handle one invocation on the webhook path, optionally producing the
    /// method object to embed in the HTTP response body
    async fn execute_for_webhook(
        &self,
        bot: &Bot,
        chat: &Chat,
        user: Option<&User>,
        args: &[String],
    ) -> Result<Option<WebhookReply>, HandlerError> {
        self.execute(bot, chat, user, args).await?;
        Ok(None)
    }
}
