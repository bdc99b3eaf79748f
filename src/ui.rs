use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, APP_EYEBROW, APP_TITLE, HIGHLIGHT_QUOTES, INPUT_PLACEHOLDER, INTRO_TEXT};
use crate::chat_log::{wrap_line, Bubble, ChatLog};
use crate::state::ChatRole;
use crate::status::{ConnectionStatus, StatusState};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        match after_open.find("**") {
            Some(end) if end > 0 => {
                if start > 0 {
                    spans.push(Span::raw(rest[..start].to_string()));
                }
                spans.push(Span::styled(
                    after_open[..end].to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                rest = &after_open[end + 2..];
            }
            // No closing **, treat as literal
            _ => break,
        }
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn role_label(bubble: &Bubble) -> Span<'static> {
    let (label, color) = match bubble.role {
        ChatRole::User => ("나:", Color::Cyan),
        ChatRole::Assistant => ("챗봇:", Color::Yellow),
        ChatRole::System => ("알림:", Color::Red),
    };
    Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

/// Pre-wrapped rows for the whole log, so the row count matches
/// `ChatLog::total_lines` exactly. The typing bubble gets animated dots.
fn log_lines(log: &ChatLog, width: usize, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for bubble in log.bubbles() {
        lines.push(Line::from(role_label(bubble)));

        for line in &bubble.lines {
            let mut rows = wrap_line(line, width);
            if bubble.typing {
                // Same row count as the stored text; only the dots change
                if let Some(last) = rows.last_mut() {
                    let base = last.trim_end_matches('.').to_string();
                    *last = format!("{}{}", base, ".".repeat((animation_frame as usize) + 1));
                }
                lines.extend(rows.into_iter().map(|row| {
                    Line::from(Span::styled(
                        row,
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    ))
                }));
                continue;
            }

            for row in rows.drain(..) {
                match bubble.role {
                    ChatRole::Assistant => lines.push(parse_markdown_line(&row)),
                    ChatRole::System => {
                        lines.push(Line::from(Span::styled(row, Style::default().fg(Color::Red))))
                    }
                    ChatRole::User => lines.push(Line::from(row)),
                }
            }
        }
        lines.push(Line::default());
    }

    lines
}

fn status_color(status: &ConnectionStatus) -> Color {
    match status.state {
        StatusState::Pending => Color::Yellow,
        StatusState::Success => Color::Green,
        StatusState::Error => Color::Red,
    }
}

/// Title and status on one row when they fit, otherwise the status
/// wraps onto right-aligned rows below the title.
fn header_lines(status: &ConnectionStatus, width: usize) -> Vec<Line<'static>> {
    let eyebrow = format!(" {} ", APP_EYEBROW);
    let version = format!(" v{}", env!("CARGO_PKG_VERSION"));
    let title_w = eyebrow.width() + APP_TITLE.width() + version.width();

    let title_spans = vec![
        Span::styled(eyebrow, Style::default().fg(Color::Gray)),
        Span::styled(APP_TITLE, Style::default().fg(Color::Cyan).bold()),
        Span::styled(version, Style::default().fg(Color::DarkGray)),
    ];
    let dot = Span::styled("● ", Style::default().fg(status_color(status)));

    let status_text = format!("● {}", status.message);
    let status_w = status_text.width() + 1;

    if title_w + status_w <= width {
        let mut spans = title_spans;
        spans.push(Span::raw(" ".repeat(width - title_w - status_w)));
        spans.push(dot);
        spans.push(Span::raw(format!("{} ", status.message)));
        return vec![Line::from(spans)];
    }

    let mut lines = vec![Line::from(title_spans)];
    for (i, row) in wrap_line(&status_text, width.saturating_sub(1)).into_iter().enumerate() {
        let line = match row.strip_prefix("● ") {
            Some(rest) if i == 0 => Line::from(vec![dot.clone(), Span::raw(format!("{} ", rest))]),
            _ => Line::from(format!("{} ", row)),
        };
        lines.push(line.alignment(Alignment::Right));
    }
    lines
}

fn intro_lines(width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = wrap_line(INTRO_TEXT, width)
        .into_iter()
        .map(|row| Line::from(Span::styled(row, Style::default().fg(Color::Gray))))
        .collect();

    for quote in HIGHLIGHT_QUOTES.iter() {
        let mut rows = wrap_line(&format!("“{}”", quote.text), width);
        let author = format!("  {}", quote.author);
        let last = rows.pop().unwrap_or_default();
        let author_fits = last.width() + author.width() <= width;

        lines.extend(
            rows.into_iter()
                .map(|row| Line::from(Span::styled(row, Style::default().italic()))),
        );
        let author_span = Span::styled(author, Style::default().fg(Color::DarkGray));
        if author_fits {
            lines.push(Line::from(vec![Span::styled(last, Style::default().italic()), author_span]));
        } else {
            lines.push(Line::from(Span::styled(last, Style::default().italic())));
            lines.push(Line::from(author_span));
        }
    }
    lines
}

/// Visible slice of the input and the cursor column, both in cells.
/// One cell is kept free for the cursor itself.
fn input_view(input: &str, cursor: usize, width: usize) -> (String, u16) {
    if width == 0 {
        return (String::new(), 0);
    }
    let widths: Vec<usize> = input
        .chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
        .collect();
    let cursor = cursor.min(widths.len());

    let mut start = 0;
    let mut before: usize = widths[..cursor].iter().sum();
    while start < cursor && before + 1 > width {
        before -= widths[start];
        start += 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for (ch, w) in input.chars().zip(widths.iter()).skip(start) {
        if used + w > width {
            break;
        }
        visible.push(ch);
        used += w;
    }
    (visible, before as u16)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let width = area.width as usize;

    let header = header_lines(&app.session.status, width);
    let intro = intro_lines(width.saturating_sub(2));

    let [header_area, intro_area, log_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(header.len() as u16),
        Constraint::Length(intro.len() as u16 + 2),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(Text::from(header)).style(Style::default().bg(Color::DarkGray)),
        header_area,
    );
    render_intro(intro, frame, intro_area);
    render_log(app, frame, log_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_intro(lines: Vec<Line<'static>>, frame: &mut Frame, area: Rect) {
    let intro = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(intro, area);
}

fn render_log(app: &mut App, frame: &mut Frame, area: Rect) {
    app.log_area = Some(area);
    let title = format!(" {} ", app.session.settings().model);
    let animation_frame = app.animation_frame;

    let log = &mut app.session.log;
    log.set_viewport(area.width.saturating_sub(2), area.height.saturating_sub(2));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);

    let chat = Paragraph::new(Text::from(log_lines(log, log.wrap_width(), animation_frame)))
        .block(block)
        .scroll((log.scroll, 0));
    frame.render_widget(chat, area);

    let total = log.total_lines() as usize;
    if total > log.view_height as usize {
        let mut state = ScrollbarState::new(total.saturating_sub(log.view_height as usize))
            .position(log.scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let session = &app.session;
    let enabled = session.input_enabled();

    let border_color = if !enabled {
        Color::DarkGray
    } else if session.submit_enabled() {
        Color::Yellow
    } else {
        Color::Blue
    };
    let title = if !enabled {
        " 입력 비활성 "
    } else if session.submit_enabled() {
        " 보내기 (Enter) "
    } else {
        " 보내는 중... "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_view(&session.input, session.cursor, inner_width);

    let input = if session.input.is_empty() {
        Paragraph::new(INPUT_PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), area);

    if enabled {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let mut hints = Vec::new();
    if app.session.input_enabled() {
        hints.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
