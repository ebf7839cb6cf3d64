use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use cq_state::ConversationId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::game::{Game, Hook};

static CODE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`").expect("code span pattern is valid"));

/// Messaging app a conversation is styled after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Signal,
    Meshtastic,
    Bbs,
    #[default]
    #[serde(other)]
    Other,
}

impl ChatKind {
    pub fn icon(self) -> &'static str {
        match self {
            ChatKind::Signal => "🔒",
            ChatKind::Meshtastic => "📡",
            ChatKind::Bbs => "💻",
            ChatKind::Other => "💬",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    pub fn new(from: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            text: text.into(),
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// Piece of a formatted message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum MessageSpan {
    Text(String),
    Code(String),
    LineBreak,
}

/// Splits message text into plain runs, inline code (between backticks) and
/// line breaks.
pub fn format_message_text(text: &str) -> Vec<MessageSpan> {
    let mut spans = Vec::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            spans.push(MessageSpan::LineBreak);
        }
        let mut last = 0;
        for captures in CODE_SPAN.captures_iter(line) {
            let (Some(whole), Some(code)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > last {
                spans.push(MessageSpan::Text(line[last..whole.start()].to_string()));
            }
            spans.push(MessageSpan::Code(code.as_str().to_string()));
            last = whole.end();
        }
        if last < line.len() {
            spans.push(MessageSpan::Text(line[last..].to_string()));
        }
    }
    spans
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub sender: String,
    pub outgoing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub spans: Vec<MessageSpan>,
}

impl MessageView {
    pub fn from_message(message: &ChatMessage, player_name: &str) -> Self {
        Self {
            sender: message.from.clone(),
            outgoing: message.from == player_name,
            timestamp: message.timestamp.clone(),
            spans: format_message_text(&message.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationView {
    pub id: ConversationId,
    pub kind: ChatKind,
    pub icon: &'static str,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_subtitle: Option<String>,
    pub allow_reply: bool,
    pub messages: Vec<MessageView>,
}

pub type ReplyHook = Rc<dyn Fn(&mut Game, &ChatMessage)>;

/// Everything needed to open a conversation.
#[derive(Clone)]
pub struct ConversationConfig {
    pub id: ConversationId,
    pub kind: ChatKind,
    pub contact: String,
    pub contact_subtitle: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub allow_reply: bool,
    pub on_open: Option<Hook>,
    pub on_close: Option<Hook>,
    pub on_reply: Option<ReplyHook>,
}

impl ConversationConfig {
    pub fn new(id: impl Into<ConversationId>, kind: ChatKind, contact: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            contact: contact.into(),
            contact_subtitle: None,
            messages: Vec::new(),
            allow_reply: false,
            on_open: None,
            on_close: None,
            on_reply: None,
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.contact_subtitle = Some(subtitle.into());
        self
    }

    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn on_open(mut self, hook: impl Fn(&mut Game) + 'static) -> Self {
        self.on_open = Some(Rc::new(hook));
        self
    }

    pub fn on_close(mut self, hook: impl Fn(&mut Game) + 'static) -> Self {
        self.on_close = Some(Rc::new(hook));
        self
    }

    /// Enables the reply box and calls `hook` for every reply the player sends.
    pub fn on_reply(mut self, hook: impl Fn(&mut Game, &ChatMessage) + 'static) -> Self {
        self.allow_reply = true;
        self.on_reply = Some(Rc::new(hook));
        self
    }
}

impl fmt::Debug for ConversationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationConfig")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("contact", &self.contact)
            .field("messages", &self.messages.len())
            .field("allow_reply", &self.allow_reply)
            .finish()
    }
}

/// Stored conversation. `read` counts how many leading messages the player
/// has seen.
pub struct Conversation {
    pub config: ConversationConfig,
    pub read: usize,
}

impl Conversation {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.config.messages
    }

    pub fn unread(&self) -> usize {
        self.config.messages.len().saturating_sub(self.read)
    }
}

/// What the caller must do after [`ChatInterface::add_message`].
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    UnknownConversation,
    Stored,
    Shown(MessageView),
}

/// Chat overlay state: stored conversations plus which one is on screen.
#[derive(Default)]
pub struct ChatInterface {
    conversations: BTreeMap<ConversationId, Conversation>,
    open: Option<ConversationId>,
    typing: bool,
}

impl ChatInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_id(&self) -> Option<&ConversationId> {
        self.open.as_ref()
    }

    pub fn is_showing(&self, id: &str) -> bool {
        self.open.as_ref().map(|open| open.as_str() == id).unwrap_or(false)
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    /// Stores `config` (replacing any earlier conversation with that id),
    /// marks it open and read, and returns the view to present. The caller
    /// closes any previously open conversation first.
    pub fn open(&mut self, config: ConversationConfig, player_name: &str) -> ConversationView {
        let id = config.id.clone();
        let read = config.messages.len();
        self.conversations
            .insert(id.clone(), Conversation { config, read });
        self.open = Some(id.clone());
        self.typing = false;
        let conversation = &self.conversations[&id];
        conversation_view(conversation, player_name)
    }

    /// Closes the open conversation and hands back its id and close hook.
    pub fn close(&mut self) -> Option<(ConversationId, Option<Hook>)> {
        let id = self.open.take()?;
        self.typing = false;
        let hook = self
            .conversations
            .get(&id)
            .and_then(|conversation| conversation.config.on_close.clone());
        Some((id, hook))
    }

    pub fn add_message(
        &mut self,
        id: &str,
        message: ChatMessage,
        immediate: bool,
        player_name: &str,
    ) -> Delivery {
        let showing = self.is_showing(id);
        let Some(conversation) = self.conversations.get_mut(id) else {
            return Delivery::UnknownConversation;
        };
        let view = MessageView::from_message(&message, player_name);
        conversation.config.messages.push(message);
        if immediate && showing {
            conversation.read = conversation.config.messages.len();
            Delivery::Shown(view)
        } else {
            Delivery::Stored
        }
    }

    /// Typing indicator toggle; only meaningful for the open conversation.
    pub fn set_typing(&mut self, id: &str, visible: bool) -> bool {
        if !self.is_showing(id) || self.typing == visible {
            return false;
        }
        self.typing = visible;
        true
    }

    pub fn reply_hook(&self, id: &str) -> Option<ReplyHook> {
        self.conversations
            .get(id)
            .and_then(|conversation| conversation.config.on_reply.clone())
    }

    pub fn allows_reply(&self, id: &str) -> bool {
        self.conversations
            .get(id)
            .map(|conversation| conversation.config.allow_reply)
            .unwrap_or(false)
    }
}

fn conversation_view(conversation: &Conversation, player_name: &str) -> ConversationView {
    let config = &conversation.config;
    ConversationView {
        id: config.id.clone(),
        kind: config.kind,
        icon: config.kind.icon(),
        contact: config.contact.clone(),
        contact_subtitle: config.contact_subtitle.clone(),
        allow_reply: config.allow_reply,
        messages: config
            .messages
            .iter()
            .map(|message| MessageView::from_message(message, player_name))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_splits_code_spans_and_line_breaks() {
        let spans = format_message_text("Run `rtl_sdr -f 433M`\nthen wait.");
        assert_eq!(
            spans,
            vec![
                MessageSpan::Text("Run ".to_string()),
                MessageSpan::Code("rtl_sdr -f 433M".to_string()),
                MessageSpan::LineBreak,
                MessageSpan::Text("then wait.".to_string()),
            ]
        );
    }

    #[test]
    fn unmatched_backtick_stays_plain_text() {
        assert_eq!(
            format_message_text("half `open"),
            vec![MessageSpan::Text("half `open".to_string())]
        );
        assert_eq!(
            format_message_text("a\n\nb"),
            vec![
                MessageSpan::Text("a".to_string()),
                MessageSpan::LineBreak,
                MessageSpan::LineBreak,
                MessageSpan::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn kind_icons_and_unknown_kinds() {
        assert_eq!(ChatKind::Signal.icon(), "🔒");
        assert_eq!(ChatKind::Meshtastic.icon(), "📡");
        assert_eq!(ChatKind::Bbs.icon(), "💻");
        let parsed: ChatKind = serde_json::from_str("\"irc\"").expect("parse kind");
        assert_eq!(parsed, ChatKind::Other);
        assert_eq!(parsed.icon(), "💬");
    }

    #[test]
    fn messages_from_the_player_are_outgoing() {
        let mut chat = ChatInterface::new();
        let view = chat.open(
            ConversationConfig::new("eva", ChatKind::Signal, "E")
                .message(ChatMessage::new("E", "Check the frequency."))
                .message(ChatMessage::new("Ryan", "On it.").at("22:17")),
            "Ryan",
        );
        assert_eq!(view.icon, "🔒");
        assert!(!view.messages[0].outgoing);
        assert!(view.messages[1].outgoing);
        assert_eq!(view.messages[1].timestamp.as_deref(), Some("22:17"));
        assert_eq!(chat.conversation("eva").map(Conversation::unread), Some(0));
    }

    #[test]
    fn messages_for_closed_conversations_are_stored_unread() {
        let mut chat = ChatInterface::new();
        chat.open(ConversationConfig::new("eva", ChatKind::Signal, "E"), "Ryan");
        assert!(chat.close().is_some());

        assert_eq!(
            chat.add_message("eva", ChatMessage::new("E", "Still there?"), true, "Ryan"),
            Delivery::Stored
        );
        assert_eq!(chat.conversation("eva").map(Conversation::unread), Some(1));
        assert_eq!(
            chat.add_message("nobody", ChatMessage::new("x", "y"), true, "Ryan"),
            Delivery::UnknownConversation
        );
    }

    #[test]
    fn typing_indicator_only_for_open_conversation() {
        let mut chat = ChatInterface::new();
        chat.open(ConversationConfig::new("mesh", ChatKind::Meshtastic, "Node"), "Ryan");
        assert!(!chat.set_typing("other", true));
        assert!(chat.set_typing("mesh", true));
        assert!(!chat.set_typing("mesh", true));
        assert!(chat.is_typing());
        chat.close();
        assert!(!chat.is_typing());
    }
}
