//! Append-only chat transcript and its scroll position.

use crate::ui::transcript_paragraph;

/// Answer shown whenever a request fails.
pub const FALLBACK_ANSWER: &str = "Sorry, I am unable to process your request at the moment.";

// Used until the first frame reports the real viewport size.
const DEFAULT_WRAP_WIDTH: u16 = 50;
const DEFAULT_VIEWPORT_HEIGHT: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    You,
    Ai,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::You => "You",
            ChatRole::Ai => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn you(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::You,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Ai,
            text: text.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::ai(FALLBACK_ANSWER)
    }

    /// The entry as displayed, e.g. `You: hello`.
    pub fn entry(&self) -> String {
        format!("{}: {}", self.role.label(), self.text)
    }
}

#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    scroll: u16,
    // Set by scroll_to_bottom, kept across viewport changes until the user scrolls
    follow_bottom: bool,
    viewport_width: u16,
    viewport_height: u16,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn entries(&self) -> Vec<String> {
        self.messages.iter().map(ChatMessage::entry).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Record the inner size of the area the transcript is drawn into.
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport_width = width;
        self.viewport_height = height;
        if self.follow_bottom {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    fn wrap_width(&self) -> u16 {
        if self.viewport_width > 0 {
            self.viewport_width
        } else {
            DEFAULT_WRAP_WIDTH
        }
    }

    fn visible_height(&self) -> u16 {
        if self.viewport_height > 0 {
            self.viewport_height
        } else {
            DEFAULT_VIEWPORT_HEIGHT
        }
    }

    /// Rows the transcript occupies once word-wrapped at the viewport width.
    pub fn total_lines(&self) -> u16 {
        if self.messages.is_empty() {
            return 0;
        }
        let rows = transcript_paragraph(&self.messages).line_count(self.wrap_width());
        u16::try_from(rows).unwrap_or(u16::MAX)
    }

    pub fn max_scroll(&self) -> u16 {
        self.total_lines().saturating_sub(self.visible_height())
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
        self.follow_bottom = true;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max);
        self.follow_bottom = self.scroll == max;
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.visible_height().max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.visible_height().max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.visible_height() / 2).max(1));
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.visible_height() / 2).max(1));
    }
}
