use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};

use crate::app::{App, InputMode};
use crate::claude::Role;
use crate::markdown::{self, Inline};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" charla ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(&app.model[..], Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_focused = app.input_mode == InputMode::Normal;
    let border_color = if chat_focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let inner = block.inner(area);
    app.chat_height = inner.height;

    if app.messages.is_empty() && !app.loading {
        let placeholder = Paragraph::new("Say something...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let lines = chat_lines(app);
    app.total_chat_lines = estimated_line_count(&lines, inner.width);

    let max_scroll = app.total_chat_lines.saturating_sub(inner.height);
    if app.chat_scroll > max_scroll {
        app.chat_scroll = max_scroll;
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    if app.total_chat_lines > inner.height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.total_chat_lines as usize)
            .position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut code_idx = 0usize;

    for msg in &app.messages {
        let label = match msg.role {
            Role::User => Span::styled(
                "You:",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Role::Assistant => Span::styled(
                "Claude:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        };
        lines.push(Line::from(label));

        for block in markdown::render(&msg.text()) {
            match block {
                markdown::Block::Code { language, body } => {
                    let selected = app.selected_code == Some(code_idx);
                    push_code_lines(&mut lines, &language, &body, selected);
                    code_idx += 1;
                }
                markdown::Block::Bold(text) => {
                    push_styled_lines(
                        &mut lines,
                        &text,
                        Style::default().add_modifier(Modifier::BOLD),
                    );
                }
                markdown::Block::Italic(text) => {
                    push_styled_lines(
                        &mut lines,
                        &text,
                        Style::default().add_modifier(Modifier::ITALIC),
                    );
                }
                markdown::Block::Paragraph(spans) => {
                    push_paragraph_lines(&mut lines, &spans);
                }
            }
        }
        lines.push(Line::default());
    }

    if app.loading {
        lines.push(Line::from(Span::styled(
            "Claude:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn push_code_lines(lines: &mut Vec<Line<'static>>, language: &str, body: &str, selected: bool) {
    let frame_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let tag = if language.is_empty() { "code" } else { language };
    let header = if selected {
        format!("┌─ {} ── c: copy", tag)
    } else {
        format!("┌─ {}", tag)
    };

    lines.push(Line::from(Span::styled(header, frame_style)));
    for body_line in body.lines() {
        lines.push(Line::from(vec![
            Span::styled("│ ", frame_style),
            Span::styled(body_line.to_string(), Style::default().fg(Color::Green)),
        ]));
    }
    lines.push(Line::from(Span::styled("└─".to_string(), frame_style)));
}

fn push_styled_lines(lines: &mut Vec<Line<'static>>, text: &str, style: Style) {
    for part in text.split('\n') {
        lines.push(Line::from(Span::styled(part.to_string(), style)));
    }
}

fn push_paragraph_lines(lines: &mut Vec<Line<'static>>, spans: &[Inline]) {
    let link_style = Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED);
    let mut current: Vec<Span<'static>> = Vec::new();

    for inline in spans {
        match inline {
            Inline::Text(text) => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next() {
                    if !first.is_empty() {
                        current.push(Span::raw(first.to_string()));
                    }
                }
                for part in parts {
                    lines.push(Line::from(std::mem::take(&mut current)));
                    if !part.is_empty() {
                        current.push(Span::raw(part.to_string()));
                    }
                }
            }
            Inline::Link(url) => current.push(Span::styled(url.clone(), link_style)),
        }
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }
}

/// Visual line estimate after wrapping, for scroll clamping. Uses
/// character counts so UTF-8 content doesn't overshoot.
fn estimated_line_count(lines: &[Line], width: u16) -> u16 {
    let wrap_width = width.max(1) as usize;
    let mut total: u16 = 0;
    for line in lines {
        let char_count: usize = line
            .spans
            .iter()
            .map(|span| span.content.chars().count())
            .sum();
        total = total.saturating_add(((char_count / wrap_width) + 1) as u16);
    }
    total
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.loading {
        " Message (waiting for reply) "
    } else {
        " Message (Enter to send) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor visible in long input.
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    if let Some(status) = &app.status {
        let line = Line::from(Span::styled(
            format!(" {} ", status),
            Style::default().bg(Color::Green).fg(Color::Black),
        ));
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(Color::Black)),
            area,
        );
        return;
    }

    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " INSERT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ];
            if !app.code_blocks.is_empty() {
                hints.extend(vec![
                    Span::styled(" n/p ", key_style),
                    Span::styled(" code block ", label_style),
                    Span::styled(" c ", key_style),
                    Span::styled(" copy ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
        InputMode::Editing => {
            let mut hints = vec![Span::styled(" Enter ", key_style)];
            hints.push(Span::styled(
                if app.loading { " waiting " } else { " send " },
                label_style,
            ));
            hints.extend(vec![
                Span::styled(" Esc ", key_style),
                Span::styled(" chat ", label_style),
            ]);
            hints
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
