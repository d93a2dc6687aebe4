//! Outbound message model: text, rendering mode and an optional keyboard.

use super::callback::CallbackAction;

/// How the transport should render `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Sent verbatim; safe for raw user input.
    Plain,
    /// MarkdownV2; every dynamic substring must already be escaped.
    MarkdownV2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineButton {
    pub text: String,
    pub action: CallbackAction,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            text: text.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    /// Buttons attached to the message; presses arrive as callbacks.
    Inline(Vec<Vec<InlineButton>>),
    /// Persistent reply keyboard; presses arrive as plain text.
    Reply(Vec<Vec<String>>),
    /// Hides a previously shown reply keyboard.
    Remove,
}

impl Keyboard {
    /// One inline button per row.
    pub fn inline_column(buttons: Vec<InlineButton>) -> Self {
        Keyboard::Inline(buttons.into_iter().map(|b| vec![b]).collect())
    }

    /// Every callback action reachable from this keyboard.
    pub fn actions(&self) -> Vec<&CallbackAction> {
        match self {
            Keyboard::Inline(rows) => rows.iter().flatten().map(|b| &b.action).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub text: String,
    pub format: TextFormat,
    pub keyboard: Option<Keyboard>,
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
            keyboard: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::MarkdownV2,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}
