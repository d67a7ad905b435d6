use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::App;
use crate::transcript::{ChatMessage, ChatRole};

// Footer hints in priority order; the lowest priority is dropped first
const FOOTER_HINTS: [(&str, &str); 3] = [
    (" Enter ", " send "),
    (" Esc ", " quit "),
    (" ↑/↓ PgUp/PgDn ", " scroll "),
];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, transcript_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, transcript_area);
    render_input(app, frame, input_area);
    render_footer(frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" ask-chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.server_label.clone(), Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::You => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ChatRole::Ai => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

/// One display line per text line; the role label leads the first.
fn message_lines(msg: &ChatMessage) -> Vec<Line<'static>> {
    msg.text
        .split('\n')
        .enumerate()
        .map(|(i, text)| {
            if i == 0 {
                Line::from(vec![
                    Span::styled(format!("{}: ", msg.role.label()), role_style(msg.role)),
                    Span::raw(text.to_string()),
                ])
            } else {
                Line::from(text.to_string())
            }
        })
        .collect()
}

/// The transcript as drawn, minus the surrounding block. Row counts for
/// scrolling are measured on this same paragraph.
pub fn transcript_paragraph(messages: &[ChatMessage]) -> Paragraph<'static> {
    let lines: Vec<Line<'static>> = messages.iter().flat_map(message_lines).collect();
    Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false })
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.transcript_area = Some(area);
    app.transcript
        .set_viewport(area.width.saturating_sub(2), area.height.saturating_sub(2));

    let title = if app.is_waiting() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        format!(" Chat · AI is thinking{} ", dots)
    } else {
        " Chat ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let chat = if app.transcript.is_empty() {
        Paragraph::new(Span::styled(
            "Ask a question...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        transcript_paragraph(app.transcript.messages())
    };
    let chat = chat.block(block).scroll((app.transcript.scroll(), 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Ask ");

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.form.cursor();
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .form
        .value()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = Vec::new();
    let mut used = 0usize;
    for (key, label) in FOOTER_HINTS {
        let key = Span::styled(key, key_style);
        let label = Span::styled(label, label_style);
        let width = key.width() + label.width();
        if used + width > area.width as usize {
            break;
        }
        used += width;
        spans.push(key);
        spans.push(label);
    }
    let hints = Line::from(spans);

    let footer = Paragraph::new(hints).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AskClient;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let client = AskClient::new("http://localhost:5003", "/ask", None).unwrap();
        App::new(client, tx, false)
    }

    fn screen(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    #[test]
    fn test_renders_transcript_entries() {
        let mut app = app();
        app.transcript.push(ChatMessage::you("hello"));
        app.transcript.push(ChatMessage::ai("42"));

        let rows = screen(&mut app, 60, 12);

        assert!(rows.iter().any(|r| r.contains("You: hello")));
        assert!(rows.iter().any(|r| r.contains("AI: 42")));
        assert!(rows[0].contains("http://localhost:5003/ask"));
    }

    #[test]
    fn test_render_records_viewport() {
        let mut app = app();
        screen(&mut app, 60, 12);

        // 12 rows minus header, input and footer; borders excluded
        assert_eq!(app.transcript_area, Some(Rect::new(0, 1, 60, 7)));
        for i in 0..10 {
            app.transcript.push(ChatMessage::ai(format!("answer {i}")));
        }
        app.transcript.scroll_to_bottom();
        assert_eq!(app.transcript.scroll(), 5);
    }

    #[test]
    fn test_long_answer_fully_visible_after_scroll_to_bottom() {
        let mut app = app();
        let mut answer: Vec<String> = (0..30).map(|i| format!("word{i}")).collect();
        answer.push("LASTWORD".to_string());
        app.transcript.push(ChatMessage::you("tell me everything"));
        app.transcript.push(ChatMessage::ai(answer.join(" ")));

        app.transcript.scroll_to_bottom();
        let rows = screen(&mut app, 22, 10);

        assert!(app.transcript.max_scroll() > 0);
        assert_eq!(app.transcript.scroll(), app.transcript.max_scroll());
        // Transcript inner rows are 2..=4
        assert!(rows[2..5].iter().any(|r| r.contains("LASTWORD")), "{rows:#?}");
    }

    #[test]
    fn test_long_answer_visible_after_first_frame() {
        let mut app = app();
        screen(&mut app, 22, 10);

        let answer: Vec<String> = (0..40).map(|i| format!("w{i}")).collect();
        app.transcript.push(ChatMessage::ai(format!("{} LASTWORD", answer.join(" "))));
        app.transcript.scroll_to_bottom();
        let rows = screen(&mut app, 22, 10);

        assert!(rows[2..5].iter().any(|r| r.contains("LASTWORD")), "{rows:#?}");
    }

    #[test]
    fn test_narrow_footer_drops_scroll_hint() {
        let mut app = app();
        let rows = screen(&mut app, 30, 12);
        let footer = rows.last().unwrap();

        assert!(footer.contains("send"));
        assert!(footer.contains("quit"));
        assert!(!footer.contains("PgUp"));

        let rows = screen(&mut app, 60, 12);
        assert!(rows.last().unwrap().contains("PgUp/PgDn  scroll"));
    }

    #[test]
    fn test_renders_input_and_placeholder() {
        let mut app = app();
        app.form.set_value("typed question");

        let rows = screen(&mut app, 60, 12);

        assert!(rows.iter().any(|r| r.contains("Ask a question...")));
        assert!(rows.iter().any(|r| r.contains("typed question")));
    }
}
