use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{block::Title, Block, BorderType, Borders, Clear, Paragraph, Wrap},
};
use askpanel_core::view::{build_view, grow::wrap_rows, render::{ERROR_TITLE, THINKING_TEXT}, Align, Segment, ViewItem};
use askpanel_core::Sender;
use unicode_width::UnicodeWidthChar;
use crate::app::App;

const PANEL_TITLE: &str = " Made with Nestlé Assistant ";
const PLACEHOLDER: &str = "Ask a question...";
const EMPTY_HINT: &str = "Ask a question to get started.";

// Panel geometry, anchored to the bottom-right corner of the body
const PANEL_WIDTH: u16 = 48;
const PANEL_HEIGHT: u16 = 24;
const LAUNCHER_WIDTH: u16 = 9;
const LAUNCHER_HEIGHT: u16 = 3;
const MARGIN_X: u16 = 2;
const MARGIN_Y: u16 = 1;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_footer(app, frame, footer_area);

    if app.state().panel_open {
        app.launcher_area = None;
        render_panel(app, frame, body_area);
    } else {
        app.close_area = None;
        app.log_area = None;
        render_launcher(app, frame, body_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" askpanel ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::DarkGray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let state = app.state();
    let (mode_text, mode_style) = if !state.panel_open {
        (" CLOSED ", Style::default().bg(Color::DarkGray).fg(Color::White))
    } else if state.pending {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let hints = if state.panel_open {
        " Enter send · Alt+Enter newline · Ctrl+L open link · PgUp/PgDn scroll · Esc close · Ctrl+C quit"
    } else {
        " Enter/Ctrl+O open assistant · q quit"
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

/// Rect of `width` x `height` in the bottom-right corner of `area`
fn anchored(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(MARGIN_X));
    let height = height.min(area.height.saturating_sub(MARGIN_Y));
    Rect::new(
        area.right().saturating_sub(width + MARGIN_X),
        area.bottom().saturating_sub(height + MARGIN_Y),
        width,
        height,
    )
}

fn render_launcher(app: &mut App, frame: &mut Frame, area: Rect) {
    let launcher = anchored(area, LAUNCHER_WIDTH, LAUNCHER_HEIGHT);
    app.launcher_area = Some(launcher);

    frame.render_widget(Clear, launcher);
    let badge = Paragraph::new(Line::from("Ask ?".bold()))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(badge, launcher);
}

fn render_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let panel = anchored(area, PANEL_WIDTH, PANEL_HEIGHT);
    frame.render_widget(Clear, panel);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(PANEL_TITLE, Style::default().add_modifier(Modifier::BOLD)))
        .title(Title::from(" × ").alignment(Alignment::Right));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);
    app.close_area = Some(Rect::new(panel.right().saturating_sub(4), panel.y, 3, 1));

    // Input sizing follows the draft; it may take at most half the panel
    let input_inner_width = inner.width.saturating_sub(2);
    app.grow.resize(input_inner_width, &app.store.state().draft);
    let input_height = app.grow.height().min(inner.height / 2).max(3);

    let [log_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_height),
    ])
    .areas(inner);

    render_log(app, frame, log_area);
    render_input(app, frame, input_area);
}

fn render_log(app: &mut App, frame: &mut Frame, area: Rect) {
    // One column of padding on each side
    let area = Rect::new(
        area.x + 1,
        area.y,
        area.width.saturating_sub(2),
        area.height,
    );
    app.log_area = Some(area);

    let state = app.state();
    if state.log.is_empty() && !state.pending && !state.has_error() {
        let hint = Paragraph::new(Span::styled(EMPTY_HINT, Style::default().fg(Color::DarkGray)));
        frame.render_widget(hint, area);
        return;
    }

    let lines = log_lines(app);
    let log = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });

    let content_height = u16::try_from(log.line_count(area.width)).unwrap_or(u16::MAX);
    app.scroll.layout(content_height, area.height);

    frame.render_widget(log.scroll((app.scroll.offset(), 0)), area);
}

/// Lines for the message area, in view order
fn log_lines(app: &App) -> Vec<Line<'static>> {
    let link_style = Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::UNDERLINED);
    let mut lines: Vec<Line<'static>> = Vec::new();

    for item in build_view(app.state()) {
        match item {
            ViewItem::Message { sender, align, segments } => {
                let text_style = match sender {
                    Sender::User => Style::default().fg(Color::Cyan),
                    Sender::Bot => Style::default(),
                };
                let alignment = match align {
                    Align::Left => Alignment::Left,
                    Align::Right => Alignment::Right,
                };
                push_segments(&mut lines, &segments, text_style, link_style, alignment);
                lines.push(Line::default());
            }
            ViewItem::Thinking => {
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                lines.push(Line::from(Span::styled(
                    format!("{THINKING_TEXT}{dots}"),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
            ViewItem::ErrorBanner(error) => {
                let style = Style::default().fg(Color::Red);
                lines.push(Line::from(Span::styled(ERROR_TITLE, style.add_modifier(Modifier::BOLD))));
                lines.push(Line::from(Span::styled(error, style)));
            }
        }
    }

    lines
}

/// Turn message segments into lines, breaking on embedded newlines
fn push_segments(
    lines: &mut Vec<Line<'static>>,
    segments: &[Segment],
    text_style: Style,
    link_style: Style,
    alignment: Alignment,
) {
    let mut current: Vec<Span<'static>> = Vec::new();

    for segment in segments {
        let style = if segment.is_link() { link_style } else { text_style };
        let mut parts = segment.as_str().split('\n');

        if let Some(first) = parts.next() {
            if !first.is_empty() {
                current.push(Span::styled(first.to_string(), style));
            }
        }
        for part in parts {
            lines.push(Line::from(std::mem::take(&mut current)).alignment(alignment));
            if !part.is_empty() {
                current.push(Span::styled(part.to_string(), style));
            }
        }
    }

    lines.push(Line::from(current).alignment(alignment));
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let state = app.state();
    let editable = !state.pending;

    let border_color = if editable { Color::Yellow } else { Color::DarkGray };
    let send_style = if state.can_submit() {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(if editable { " Ask " } else { " Waiting for answer " })
        .title_bottom(Line::from(Span::styled(" Send ⏎ ", send_style)).alignment(Alignment::Right));

    let inner_width = usize::from(area.width.saturating_sub(2));
    let visible_rows = usize::from(area.height.saturating_sub(2));

    if state.draft.is_empty() {
        let placeholder = Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(placeholder, area);
        if editable {
            frame.set_cursor_position((area.x + 1, area.y + 1));
        }
        return;
    }

    let rows = wrap_rows(&state.draft, area.width.saturating_sub(2));
    let (cursor_row, cursor_col) = cursor_row_col(&state.draft, app.cursor, inner_width);

    // Keep the cursor row visible
    let skip = (cursor_row + 1).saturating_sub(visible_rows.max(1));

    let text: Vec<Line> = rows.into_iter().map(Line::from).collect();
    let style = if editable {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(text)
        .style(style)
        .block(block)
        .scroll((u16::try_from(skip).unwrap_or(0), 0));
    frame.render_widget(input, area);

    if editable {
        let x = area.x + 1 + u16::try_from(cursor_col).unwrap_or(0);
        let y = area.y + 1 + u16::try_from(cursor_row - skip).unwrap_or(0);
        frame.set_cursor_position((x, y));
    }
}

/// Screen row and column of the char cursor inside the wrapped draft.
/// Follows the row breaks of [`wrap_rows`].
pub fn cursor_row_col(text: &str, cursor: usize, width: usize) -> (usize, usize) {
    let mut row = 0;
    let mut col = 0;
    for c in text.chars().take(cursor) {
        if c == '\n' {
            row += 1;
            col = 0;
            continue;
        }
        let w = c.width().unwrap_or(0);
        if width > 0 && col > 0 && col + w > width {
            row += 1;
            col = 0;
        }
        col += w;
    }
    if width > 0 && col >= width {
        col = width - 1;
    }
    (row, col)
}
