//! Command registry
//!
//! Concurrent mapping from [`CommandIdentifier`] to registered command.
//! Registration is first-come-first-served: a later registration under an
//! already-taken identifier is rejected, it never overwrites. Lookup during
//! a concurrent register never observes a partially-inserted entry, and no
//! registry lock is ever held across handler execution.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::command::{BotCommand, CommandIdentifier};

/// How identifiers are compared on register and lookup
///
/// `Exact` is the default. `AsciiCaseInsensitive` folds identifiers to
/// lowercase on both insert and lookup, so `/Start` and `/start` name the
/// same command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Case-sensitive exact match (default)
    #[default]
    Exact,
    /// ASCII-case-insensitive match
    AsciiCaseInsensitive,
}

/// Owns the identifier → command mapping for one bot instance
///
/// Created once per bot and shared for the process lifetime. All methods
/// take `&self` and are safe to call concurrently with dispatch.
pub struct CommandRegistry {
    commands: DashMap<CommandIdentifier, Arc<dyn BotCommand>>,
    match_mode: MatchMode,
}

impl CommandRegistry {
    /// Create an empty registry with exact identifier matching
    pub fn new() -> Self {
        Self::with_match_mode(MatchMode::Exact)
    }

    /// Create an empty registry with the given match mode
    pub fn with_match_mode(match_mode: MatchMode) -> Self {
        Self {
            commands: DashMap::new(),
            match_mode,
        }
    }

    fn key(&self, identifier: &CommandIdentifier) -> CommandIdentifier {
        match self.match_mode {
            MatchMode::Exact => identifier.clone(),
            MatchMode::AsciiCaseInsensitive => identifier.to_ascii_lowercase(),
        }
    }

    /// Register a command under its own identifier
    ///
    /// Returns `false` and leaves the registry untouched when the identifier
    /// is already taken. Atomic with respect to concurrent register,
    /// deregister and lookup.
    pub fn register(&self, command: Arc<dyn BotCommand>) -> bool {
        let key = self.key(command.identifier());
        match self.commands.entry(key) {
            Entry::Occupied(_) => {
                log::debug!("register rejected, {} already taken", command.identifier());
                false
            }
            Entry::Vacant(slot) => {
                log::debug!("registered command {}", command.identifier());
                slot.insert(command);
                true
            }
        }
    }

    /// Register several commands, collecting each individual outcome
    ///
    /// One rejection does not prevent attempting the rest; outcomes come
    /// back in input order.
    pub fn register_all<I>(&self, commands: I) -> Vec<(Arc<dyn BotCommand>, bool)>
    where
        I: IntoIterator<Item = Arc<dyn BotCommand>>,
    {
        commands
            .into_iter()
            .map(|command| {
                let registered = self.register(Arc::clone(&command));
                (command, registered)
            })
            .collect()
    }

    /// Remove the command registered under the supplied command's identifier
    ///
    /// Removal is by identifier, not by object identity. Returns `false` as
    /// a no-op when the identifier is absent.
    pub fn deregister(&self, command: &dyn BotCommand) -> bool {
        let removed = self.commands.remove(&self.key(command.identifier())).is_some();
        if removed {
            log::debug!("deregistered command {}", command.identifier());
        }
        removed
    }

    /// Deregister several commands, collecting each individual outcome
    pub fn deregister_all<I>(&self, commands: I) -> Vec<(Arc<dyn BotCommand>, bool)>
    where
        I: IntoIterator<Item = Arc<dyn BotCommand>>,
    {
        commands
            .into_iter()
            .map(|command| {
                let removed = self.deregister(command.as_ref());
                (command, removed)
            })
            .collect()
    }

    /// Look up the command registered under an identifier
    pub fn lookup(&self, identifier: &CommandIdentifier) -> Option<Arc<dyn BotCommand>> {
        self.commands.get(&self.key(identifier)).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of all registered commands; iteration order is unspecified
    pub fn commands(&self) -> Vec<Arc<dyn BotCommand>> {
        self.commands.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
