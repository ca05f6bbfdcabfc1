//! Terminal session.
//!
//! Holds the friend list and the active chat, turns parsed [`Command`]s into
//! runtime calls, and prints simulator events that concern the active chat.
//! Output goes to any [`AsyncWrite`] so tests can capture it.

use ephemera_core::{ChatEvent, MessageKind, MessageOrigin};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::{
    commands::{self, Command},
    demo::{self, Friend},
    render,
    runtime::{ChatHandle, RuntimeError},
};

/// Terminal front-end errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading input or writing output failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The chat runtime failed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Logging could not be initialised.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Whether the session continues after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading input.
    Continue,
    /// The user quit.
    Quit,
}

/// Line-oriented chat session.
pub struct Session<W> {
    handle: ChatHandle,
    roster: Vec<Friend>,
    active: Option<usize>,
    next_image: usize,
    out: W,
}

impl<W: AsyncWrite + Unpin> Session<W> {
    /// Session over `handle` showing `roster`, writing to `out`.
    pub fn new(handle: ChatHandle, roster: Vec<Friend>, out: W) -> Self {
        Self { handle, roster, active: None, next_image: 0, out }
    }

    /// Friend whose chat is open.
    pub fn active(&self) -> Option<&Friend> {
        self.active.and_then(|index| self.roster.get(index))
    }

    /// Output sink.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Print the command summary and the friend list.
    pub async fn welcome(&mut self) -> Result<(), CliError> {
        self.say(commands::HELP).await?;
        self.friends().await
    }

    /// Handle one input line.
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow, CliError> {
        let command = commands::parse(line);
        debug!(?command, "command");

        match command {
            Command::Friends => self.friends().await?,
            Command::Open { username } => self.open(&username).await?,
            Command::Close => self.close().await?,
            Command::Image => {
                let image = demo::SAMPLE_IMAGES[self.next_image % demo::SAMPLE_IMAGES.len()];
                self.next_image += 1;
                self.send(image, MessageKind::Image).await?;
            },
            Command::Voice => self.send(demo::VOICE_NOTE, MessageKind::Voice).await?,
            Command::History => self.history().await?,
            Command::Quit => {
                if self.active.is_some() {
                    self.close().await?;
                }
                return Ok(Flow::Quit);
            },
            Command::Message { content } => {
                if !content.is_empty() {
                    self.send(&content, MessageKind::Text).await?;
                }
            },
            Command::Unknown { input } => {
                self.say(&format!("Unknown command {input}. Try {}", commands::HELP)).await?;
            },
            Command::InvalidArgs { command, error } => {
                self.say(&format!("/{command}: {error}")).await?;
            },
        }
        Ok(Flow::Continue)
    }

    /// Print what an event means for the active chat. Events for other
    /// chats are ignored.
    pub async fn handle_event(&mut self, event: ChatEvent) -> Result<(), CliError> {
        let Some(friend) = self.active().cloned() else {
            return Ok(());
        };
        if event.conversation() != friend.conversation() {
            return Ok(());
        }

        match event {
            ChatEvent::MessageAppended { id } => {
                let Some(message) = self.handle.message(id).await? else {
                    return Ok(());
                };
                if message.origin() == MessageOrigin::Peer {
                    self.say(&render::message_line(&message, &friend.username)).await?;
                }
            },
            ChatEvent::StatusAdvanced { id, status } => {
                if let Some(message) = self.handle.message(id).await? {
                    self.say(&render::status_line(&message, status)).await?;
                }
            },
            ChatEvent::TypingChanged { typing: true, .. } => {
                self.say(&render::typing_line(&friend.username)).await?;
            },
            ChatEvent::TypingChanged { typing: false, .. } => {},
            ChatEvent::ConversationOpened { .. } | ChatEvent::ConversationClosed { .. } => {},
        }
        Ok(())
    }

    async fn friends(&mut self) -> Result<(), CliError> {
        let mut lines = Vec::with_capacity(self.roster.len());
        for friend in &self.roster {
            let presence = self.handle.presence(friend.id).await?;
            lines.push(render::friend_line(friend, presence));
        }
        self.say(&lines.join("\n")).await
    }

    async fn open(&mut self, username: &str) -> Result<(), CliError> {
        let Some(index) = demo::position(&self.roster, username) else {
            return self.say(&format!("No friend named {username}. Try /friends")).await;
        };
        if self.active == Some(index) {
            return Ok(());
        }
        if self.active.is_some() {
            self.close().await?;
        }

        let friend = self.roster[index].clone();
        self.handle.open(friend.conversation()).await?;
        self.active = Some(index);

        let presence = self.handle.presence(friend.id).await?;
        let messages = self.handle.messages(friend.conversation()).await?;
        self.say(&render::header(&friend, presence)).await?;
        self.say(&render::transcript(&messages, &friend.username)).await
    }

    async fn close(&mut self) -> Result<(), CliError> {
        let Some(friend) = self.active().cloned() else {
            return self.say("No chat is open.").await;
        };
        self.handle.close(friend.conversation()).await?;
        self.active = None;
        self.say(&format!("Closed chat with {}", friend.username)).await
    }

    async fn history(&mut self) -> Result<(), CliError> {
        let Some(friend) = self.active().cloned() else {
            return self.say("No chat is open. Use /open <username>").await;
        };
        let messages = self.handle.messages(friend.conversation()).await?;
        self.say(&render::transcript(&messages, &friend.username)).await
    }

    async fn send(&mut self, content: &str, kind: MessageKind) -> Result<(), CliError> {
        let Some(friend) = self.active().cloned() else {
            return self.say("No chat is open. Use /open <username>").await;
        };

        match self.handle.submit(friend.conversation(), content, kind).await {
            Ok(id) => {
                if let Some(message) = self.handle.message(id).await? {
                    self.say(&render::message_line(&message, &friend.username)).await?;
                }
                Ok(())
            },
            Err(RuntimeError::Submit(err)) => {
                warn!(%err, "message not sent");
                self.say(&format!("Not sent: {err}")).await
            },
            Err(err) => Err(err.into()),
        }
    }

    async fn say(&mut self, text: &str) -> Result<(), CliError> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}
