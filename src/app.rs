use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::chat::{AskReply, ChatFormHandler};
use crate::client::AskClient;
use crate::form::ChatForm;
use crate::transcript::Transcript;
use crate::tui::AppEvent;

pub struct App {
    pub should_quit: bool,

    // The three handles the chat is wired to, alive for the whole session
    pub form: ChatForm,
    pub transcript: Transcript,
    pub chat: ChatFormHandler,

    /// Shown in the header
    pub server_label: String,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transcript area for mouse hit-testing (updated during render)
    pub transcript_area: Option<Rect>,
}

impl App {
    pub fn new(client: AskClient, events: UnboundedSender<AppEvent>, drop_stale: bool) -> Self {
        let server_label = client.endpoint().to_string();
        Self {
            should_quit: false,
            form: ChatForm::new(),
            transcript: Transcript::new(),
            chat: ChatFormHandler::new(client, events, drop_stale),
            server_label,
            animation_frame: 0,
            transcript_area: None,
        }
    }

    pub fn submit(&mut self) {
        self.chat.on_submit(&mut self.form, &mut self.transcript);
    }

    pub fn apply_reply(&mut self, reply: AskReply) {
        self.chat.on_reply(reply, &mut self.transcript);
    }

    pub fn is_waiting(&self) -> bool {
        self.chat.in_flight() > 0
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else {
            self.animation_frame = 0;
        }
    }
}
