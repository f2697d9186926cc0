//! Command token parser
//!
//! Extracts a candidate command identifier and its arguments from raw
//! message text. Pure functions of the text and the bot username; no side
//! effects.

use crate::command::{COMMAND_PREFIX, CommandIdentifier};

/// A command-looking token extracted from message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCandidate {
    /// The identifier, with any `@username` suffix already stripped
    pub identifier: CommandIdentifier,
    /// Whitespace-split tokens following the command token
    pub args: Vec<String>,
}

/// Parse message text into a command candidate
///
/// A command begins at position 0 with `/`. The identifier runs until the
/// first whitespace or an `@username` suffix, whichever comes first. The
/// suffix, if present, must match the bot's own username (Telegram usernames
/// are case-insensitive) — otherwise the message is addressed to another bot
/// sharing the group chat and is treated as a non-command.
///
/// Returns `None` when the text does not name a command for this bot.
///
/// # Examples
///
/// ```
/// use commandbot::parser::parse_command;
///
/// let candidate = parse_command("/help arg1 arg2", Some("MyBot")).unwrap();
/// assert_eq!(candidate.identifier.as_str(), "/help");
/// assert_eq!(candidate.args, vec!["arg1", "arg2"]);
///
/// assert!(parse_command("/help@OtherBot", Some("MyBot")).is_none());
/// assert!(parse_command("hello", Some("MyBot")).is_none());
/// ```
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<CommandCandidate> {
    if !text.starts_with(COMMAND_PREFIX) {
        return None;
    }

    let mut tokens = text.split_whitespace();
    let token = tokens.next()?;

    let identifier = match token.split_once('@') {
        Some((head, suffix)) => {
            // `@suffix` must name this bot, or the command belongs to
            // another bot in the same group chat.
            let matches_self = bot_username.is_some_and(|own| suffix.eq_ignore_ascii_case(own));
            if !matches_self {
                log::debug!("command {head} addressed to @{suffix}, ignoring");
                return None;
            }
            head
        }
        None => token,
    };

    Some(CommandCandidate {
        identifier: CommandIdentifier::new(identifier),
        args: tokens.map(str::to_string).collect(),
    })
}
