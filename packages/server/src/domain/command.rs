//! Chat input parser.
//!
//! Every inbound chat line is classified exactly once into a command, a
//! private message or a plain broadcast. Parsing is pure; delivery lives in
//! [`Room`](super::Room).

use rand::Rng;

use super::RoomName;

/// Character that turns a chat line into a command.
const COMMAND_TRIGGER: char = '/';

/// Prefix marking a private-message recipient.
const PM_PREFIX: char = '@';

/// Upper bound (exclusive) of `/roll`.
const ROLL_SIDES: u32 = 1000;

/// Result of parsing a chat input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Text containing the command trigger.
    Command(ChatCommand),
    /// Text addressed to one or more `@name` recipients (names without `@`).
    PrivateMessage(Vec<String>),
    /// Regular chat message for the whole room.
    Broadcast,
}

impl ChatInput {
    /// Classify a chat line.
    ///
    /// Precedence is fixed: command trigger first, then `@` recipients, then
    /// broadcast. The trigger may appear anywhere in the line; only the
    /// segment between the first trigger and the next one is read.
    pub fn parse(text: &str) -> Self {
        if let Some((_, rest)) = text.split_once(COMMAND_TRIGGER) {
            let segment = rest.split(COMMAND_TRIGGER).next().unwrap_or_default();
            return ChatInput::Command(ChatCommand::parse(segment));
        }

        let mut recipients: Vec<String> = Vec::new();
        for word in text.split_whitespace() {
            if let Some(name) = word.strip_prefix(PM_PREFIX)
                && !recipients.iter().any(|r| r == name)
            {
                recipients.push(name.to_string());
            }
        }
        if recipients.is_empty() {
            ChatInput::Broadcast
        } else {
            ChatInput::PrivateMessage(recipients)
        }
    }
}

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Create a room and move into it.
    CreateRoom(RoomName),
    /// Move into an existing room.
    JoinRoom(RoomName),
    /// Roll a number in `0..ROLL_SIDES`.
    Roll,
    /// Flip a coin.
    Flip,
    /// Known command with a missing or invalid argument.
    Malformed(String),
    /// Unknown command token.
    Unknown(String),
}

impl ChatCommand {
    fn parse(segment: &str) -> Self {
        let mut words = segment.split_whitespace();
        let Some(token) = words.next() else {
            return ChatCommand::Unknown(String::new());
        };
        let room_arg = |words: &mut std::str::SplitWhitespace<'_>| {
            words
                .next()
                .and_then(|w| RoomName::new(w.to_string()).ok())
        };

        match token.to_lowercase().as_str() {
            "createroom" => room_arg(&mut words)
                .map(ChatCommand::CreateRoom)
                .unwrap_or_else(|| ChatCommand::Malformed(segment.trim().to_string())),
            "joinroom" => room_arg(&mut words)
                .map(ChatCommand::JoinRoom)
                .unwrap_or_else(|| ChatCommand::Malformed(segment.trim().to_string())),
            "roll" => ChatCommand::Roll,
            "flip" => ChatCommand::Flip,
            _ => ChatCommand::Unknown(token.to_string()),
        }
    }

    /// Get the command name.
    pub fn name(&self) -> &str {
        match self {
            ChatCommand::CreateRoom(_) => "createroom",
            ChatCommand::JoinRoom(_) => "joinroom",
            ChatCommand::Roll => "roll",
            ChatCommand::Flip => "flip",
            ChatCommand::Malformed(segment) => segment,
            ChatCommand::Unknown(token) => token,
        }
    }
}

impl std::fmt::Display for ChatCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatCommand::CreateRoom(name) => write!(f, "/createroom {name}"),
            ChatCommand::JoinRoom(name) => write!(f, "/joinroom {name}"),
            ChatCommand::Roll => write!(f, "/roll"),
            ChatCommand::Flip => write!(f, "/flip"),
            ChatCommand::Malformed(segment) => write!(f, "/{segment}"),
            ChatCommand::Unknown(token) => write!(f, "/{token}"),
        }
    }
}

/// Roll result text for `/roll`.
pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("You rolled: {}", rng.random_range(0..ROLL_SIDES))
}

/// Coin flip result text for `/flip`.
pub fn flip<R: Rng + ?Sized>(rng: &mut R) -> String {
    if rng.random_bool(0.5) {
        "Heads".to_string()
    } else {
        "Tails".to_string()
    }
}
