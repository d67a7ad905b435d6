use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::debug;

use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(w, h) => debug!(width = w, height = h, "terminal resized"),
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Answer(reply) => app.apply_reply(reply),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Quit
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Esc => app.should_quit = true,

        // Submit; the key never reaches the input
        KeyCode::Enter => app.submit(),

        // Half-page scroll
        KeyCode::Char('d') if ctrl => app.transcript.half_page_down(),
        KeyCode::Char('u') if ctrl => app.transcript.half_page_up(),

        // Transcript scrolling
        KeyCode::Up => app.transcript.scroll_up(1),
        KeyCode::Down => app.transcript.scroll_down(1),
        KeyCode::PageUp => app.transcript.page_up(),
        KeyCode::PageDown => app.transcript.page_down(),

        // Input editing
        KeyCode::Backspace => app.form.backspace(),
        KeyCode::Delete => app.form.delete(),
        KeyCode::Left => app.form.move_left(),
        KeyCode::Right => app.form.move_right(),
        KeyCode::Home => app.form.move_home(),
        KeyCode::End => app.form.move_end(),
        KeyCode::Char(c) if !ctrl => app.form.insert(c),

        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_transcript = app
        .transcript_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_transcript {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.transcript.scroll_down(WHEEL_LINES),
        MouseEventKind::ScrollUp => app.transcript.scroll_up(WHEEL_LINES),
        _ => {}
    }
}
