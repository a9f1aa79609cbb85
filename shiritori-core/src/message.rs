//! # Agent Messages
//!
//! The envelope two agents exchange for every turn. The waiting agent sends
//! a `Request` carrying the word to chain from; the mover answers with a
//! `Response` carrying its word, or with a typed `Error` / `Timeout` reply
//! when it has none.
//!
//! Each message moves through `pending -> sent -> received` and is finally
//! settled as `processed` or `failed`. The `Exchange` owns the transcript
//! in send order; per-agent sent/received views are derived from it.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// What a message is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Error,
    Timeout,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
            MessageType::Error => "error",
            MessageType::Timeout => "timeout",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery state of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Received,
    Processed,
    Failed,
}

impl MessageStatus {
    /// Processed or failed; nothing happens to the message afterwards
    pub fn is_settled(&self) -> bool {
        matches!(self, MessageStatus::Processed | MessageStatus::Failed)
    }
}

/// One message between two agents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct A2aMessage {
    /// Assigned by `Exchange::post`; empty while pending
    #[serde(rename = "message_id")]
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub message_type: MessageType,
    pub status: MessageStatus,
    /// Turn this message belongs to
    pub turn: u32,
    /// The word carried: the one to chain from, or the reply
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Id of the request this message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl A2aMessage {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        message_type: MessageType,
        turn: u32,
    ) -> Self {
        Self {
            id: String::new(),
            sender: sender.into(),
            receiver: receiver.into(),
            message_type,
            status: MessageStatus::Pending,
            turn,
            word: None,
            error: None,
            reply_to: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn with_word(mut self, word: Option<String>) -> Self {
        self.word = word;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn in_reply_to(mut self, request_id: impl Into<String>) -> Self {
        self.reply_to = Some(request_id.into());
        self
    }

    /// Timeout or error reply
    pub fn is_failure(&self) -> bool {
        matches!(self.message_type, MessageType::Error | MessageType::Timeout)
    }
}

/// Messages one agent sent and received, in send order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHistory<'a> {
    pub sent: Vec<&'a A2aMessage>,
    pub received: Vec<&'a A2aMessage>,
}

impl<'a> MessageHistory<'a> {
    /// Split a transcript into what `agent` sent and what it was sent
    pub fn for_agent(messages: &'a [A2aMessage], agent: &str) -> Self {
        Self {
            sent: messages.iter().filter(|m| m.sender == agent).collect(),
            received: messages.iter().filter(|m| m.receiver == agent).collect(),
        }
    }
}

/// Ordered transcript of every message in one game
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    messages: Vec<A2aMessage>,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an id, mark the message sent and append it. Returns the id.
    pub fn post(&mut self, mut message: A2aMessage) -> String {
        message.id = format!(
            "{}-{:04}",
            message.timestamp.format("%Y%m%d%H%M%S%6f"),
            self.messages.len() + 1
        );
        message.status = MessageStatus::Sent;
        debug!(
            id = %message.id,
            sender = %message.sender,
            receiver = %message.receiver,
            message_type = %message.message_type,
            turn = message.turn,
            "message sent"
        );
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// `receiver` picks up a sent message. Fails if it was addressed to
    /// someone else or is no longer in flight.
    pub fn receive(&mut self, receiver: &str, id: &str) -> Result<&A2aMessage> {
        let message = self.find_mut(id)?;
        if message.receiver != receiver {
            return Err(Error::invalid_argument("message addressed to another agent")
                .with_operation("exchange::receive")
                .with_context("expected", message.receiver.clone())
                .with_context("actual", receiver));
        }
        if message.status != MessageStatus::Sent {
            return Err(Error::invalid_argument("message is not in flight")
                .with_operation("exchange::receive")
                .with_context("status", format!("{:?}", message.status)));
        }
        message.status = MessageStatus::Received;
        Ok(message)
    }

    /// Mark a received message processed (`ok`) or failed
    pub fn settle(&mut self, id: &str, ok: bool) -> Result<()> {
        let message = self.find_mut(id)?;
        if message.status != MessageStatus::Received {
            return Err(Error::invalid_argument("message was not received")
                .with_operation("exchange::settle")
                .with_context("status", format!("{:?}", message.status)));
        }
        message.status = if ok {
            MessageStatus::Processed
        } else {
            MessageStatus::Failed
        };
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&A2aMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[A2aMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn history(&self, agent: &str) -> MessageHistory<'_> {
        MessageHistory::for_agent(&self.messages, agent)
    }

    pub fn into_messages(self) -> Vec<A2aMessage> {
        self.messages
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut A2aMessage> {
        self.messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| {
                Error::invalid_argument("unknown message id")
                    .with_operation("exchange::find")
                    .with_context("id", id)
            })
    }
}
