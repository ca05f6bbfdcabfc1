//! Command parsing for the terminal front end.
//!
//! This module parses input lines into structured [`Command`] values.

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List friends with their presence.
    Friends,

    /// Open the chat with a friend.
    Open {
        /// Friend's username.
        username: String,
    },

    /// Close the active chat.
    Close,

    /// Send a sample image to the active chat.
    Image,

    /// Send a voice note to the active chat.
    Voice,

    /// Print the active chat's transcript.
    History,

    /// Quit the application.
    Quit,

    /// Send text to the active chat.
    Message {
        /// Message content.
        content: String,
    },

    /// Unknown or invalid command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Parse a user input string into a command.
///
/// Commands start with `/`. Anything else is treated as a message.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Message { content: input.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    match command {
        "friends" => Command::Friends,

        "open" => match parts.as_slice() {
            [_, username] => Command::Open { username: (*username).to_string() },
            [_] => Command::InvalidArgs {
                command: "open".into(),
                error: "Usage: /open <username>".into(),
            },
            _ => Command::InvalidArgs {
                command: "open".into(),
                error: "Usernames cannot contain spaces".into(),
            },
        },

        "close" => Command::Close,

        "image" => Command::Image,

        "voice" => Command::Voice,

        "history" => Command::History,

        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}

/// One-line help text for every command.
pub const HELP: &str = "/friends  /open <username>  /close  /image  /voice  /history  /quit";
