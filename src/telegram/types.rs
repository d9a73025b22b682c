//! Telegram Bot API wire types (the subset the bot reads and writes)

use crate::registration::IncomingMessage;
use serde::{Deserialize, Serialize};

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

impl Update {
    /// Messages without a sender (channel posts) are not registrations.
    /// Non-text messages arrive with empty text.
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        let message = self.message?;
        let from = message.from?;
        Some(IncomingMessage {
            chat_id: message.chat.id,
            account_id: from.id,
            sender_name: from.display_name(),
            handle: from.username,
            text: message.text.unwrap_or_default(),
        })
    }
}

/// Body of a `sendMessage` call
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'a str,
}
