use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(f.area());

    draw_title(f, chunks[0], app);
    draw_notifications(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);

    if app.state == AppState::Input {
        draw_input_popup(f, app);
    } else if app.show_help {
        draw_help_popup(f);
    }
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let unread = app.store.unread_count();
    let total = app.notifications().len();
    let header = format!("inboxr | {} unread | {} total", unread, total);

    let color = if unread > 0 { Color::Yellow } else { Color::Cyan };
    let title = Paragraph::new(header)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn draw_notifications(f: &mut Frame, app: &App, area: Rect) {
    let list = app.notifications();
    let window_height = area.height.saturating_sub(2) as usize;
    let start = app.selected_index.saturating_sub(window_height / 2);
    let end = usize::min(start + window_height, list.len());
    let start = start.min(end);

    let items: Vec<ListItem> = list[start..end]
        .iter()
        .enumerate()
        .map(|(offset, n)| {
            let i = start + offset;
            let mut style = if n.is_read() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            if i == app.selected_index {
                style = style.fg(Color::Yellow);
            }
            let marker = if n.is_read() { " " } else { "●" };
            ListItem::new(format!("{} {}", marker, n.message())).style(style)
        })
        .collect();

    if items.is_empty() {
        let empty = Paragraph::new("No notifications yet")
            .block(Block::default().title("Notifications").borders(Borders::ALL));
        f.render_widget(empty, area);
    } else {
        let list = List::new(items)
            .block(Block::default().title("Notifications").borders(Borders::ALL));
        f.render_widget(list, area);
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let help_text = match app.state {
        AppState::Normal => "q: Quit | ↑↓/jk: Navigate | n: New | r: Mark all read | ?: Help",
        AppState::Input => "Enter: Submit | Esc: Cancel | Type your message",
    };

    let status = Paragraph::new(vec![
        Line::from(app.status_message.as_str()),
        Line::from(help_text),
    ])
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(status, area);
}

fn draw_input_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, f.area());
    let input_text = format!("{}{}", app.input_prompt, app.input_buffer);
    let input = Paragraph::new(input_text)
        .block(
            Block::default()
                .title("New notification")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(input, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 50, f.area());
    let help = "inboxr Help\n\nKeys:\n  q / Ctrl-C: Quit\n  j/k or ↑/↓: Navigate\n  Home/End: Jump\n  n: New notification\n  r: Mark all read\n  ?: Toggle this help";

    let paragraph = Paragraph::new(help)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(paragraph, area);
}
