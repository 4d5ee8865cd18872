//! Application state and the conversation orchestrator.
//!
//! The conversation is an append-only sequence of messages owned by the
//! single `App` value for the life of the session. Exactly one completion
//! request may be outstanding; submits while a request is in flight are
//! rejected here, not just by the disabled send hint in the UI.

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::claude::{ChatClient, Message, Reply, Role};
use crate::markdown::{self, Block};

/// Ticks a transient status line stays visible (at the 300ms tick rate).
const STATUS_TICKS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation state
    pub messages: Vec<Message>,
    pub loading: bool,
    pub pending: Option<JoinHandle<Result<Reply>>>,

    // Input buffer
    pub input: String,
    pub cursor: usize, // char index into input

    // Chat viewport (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub total_chat_lines: u16,

    // Copy targets: bodies of every code block in the conversation
    pub code_blocks: Vec<String>,
    pub selected_code: Option<usize>,

    // Transient status line ("Copied to clipboard")
    pub status: Option<String>,
    status_ticks: u8,

    // Animation state (0-2 for the thinking ellipsis)
    pub animation_frame: u8,

    // Completion backend
    pub client: ChatClient,
    pub model: String,
    pub max_tokens: u32,
}

impl App {
    pub fn new(client: ChatClient, model: String, max_tokens: u32) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            messages: Vec::new(),
            loading: false,
            pending: None,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            total_chat_lines: 0,

            code_blocks: Vec::new(),
            selected_code: None,

            status: None,
            status_ticks: 0,

            animation_frame: 0,

            client,
            model,
            max_tokens,
        }
    }

    /// Accept the current input as a user message and return the history
    /// snapshot to send. Whitespace-only input and submits while a reply
    /// is outstanding are rejected and change nothing.
    pub fn begin_submit(&mut self) -> Option<Vec<Message>> {
        if self.loading || self.pending.is_some() {
            return None;
        }
        if self.input.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.messages.push(Message::user(text));
        self.loading = true;
        self.rebuild_code_blocks();
        self.scroll_chat_to_bottom();
        Some(self.messages.clone())
    }

    /// Fold the outcome of a completion request back into the
    /// conversation. Failures are logged and leave no trace in the
    /// message sequence; the send control simply re-enables.
    pub fn complete_reply(&mut self, result: Result<Reply>) {
        self.loading = false;
        match result {
            Ok(reply) => {
                tracing::debug!(
                    input_tokens = reply.usage.input_tokens,
                    output_tokens = reply.usage.output_tokens,
                    "completion usage"
                );
                self.messages.push(Message {
                    role: Role::Assistant,
                    content: reply.content,
                });
                self.rebuild_code_blocks();
                self.scroll_chat_to_bottom();
            }
            Err(err) => {
                tracing::error!(error = %err, "completion request failed");
            }
        }
    }

    fn rebuild_code_blocks(&mut self) {
        self.code_blocks = self
            .messages
            .iter()
            .flat_map(|msg| markdown::render(&msg.text()))
            .filter_map(|block| match block {
                Block::Code { body, .. } => Some(body),
                _ => None,
            })
            .collect();

        if self.code_blocks.is_empty() {
            self.selected_code = None;
        } else {
            // Keep an existing selection in range, else land on the newest.
            let last = self.code_blocks.len() - 1;
            self.selected_code = Some(self.selected_code.map_or(last, |i| i.min(last)));
        }
    }

    pub fn select_next_code(&mut self) {
        if self.code_blocks.is_empty() {
            return;
        }
        let last = self.code_blocks.len() - 1;
        self.selected_code = Some(self.selected_code.map_or(last, |i| (i + 1).min(last)));
    }

    pub fn select_prev_code(&mut self) {
        if self.code_blocks.is_empty() {
            return;
        }
        self.selected_code = Some(self.selected_code.map_or(0, |i| i.saturating_sub(1)));
    }

    pub fn selected_code_body(&self) -> Option<&str> {
        self.selected_code
            .and_then(|i| self.code_blocks.get(i))
            .map(|s| s.as_str())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.status_ticks = STATUS_TICKS;
    }

    /// Advance animation and expire the status line (called on Tick).
    pub fn tick(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.status_ticks > 0 {
            self.status_ticks -= 1;
            if self.status_ticks == 0 {
                self.status = None;
            }
        }
    }

    /// Pin the viewport to the newest message; the render pass clamps
    /// this to the actual line count.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = u16::MAX;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }
}
