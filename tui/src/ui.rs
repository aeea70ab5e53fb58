//! Rendering. Everything drawn here is derived from [`App`]; no widget keeps
//! state of its own.

use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use todo_core::Todo;

use crate::app::{App, Focus};

const MODAL_HEIGHT: u16 = 10;

pub fn draw(frame: &mut Frame, app: &App) {
    let banner_height = if app.state.error_message().is_some() { 3 } else { 0 };
    let [header, banner, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(banner_height),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " Todo Application",
            Style::new().fg(Color::Indexed(62)).add_modifier(Modifier::BOLD),
        ))),
        header,
    );

    if let Some(message) = app.state.error_message() {
        frame.render_widget(error_banner(message), banner);
    }

    draw_list(frame, app, body);
    frame.render_widget(Paragraph::new(help_line(app)), footer);

    if app.state.is_modal_open() {
        draw_modal(frame, app);
    }
}

fn error_banner(message: &str) -> Paragraph<'_> {
    Paragraph::new(message)
        .style(Style::new().fg(Color::Red))
        .block(Block::bordered().border_style(Style::new().fg(Color::Red)))
        .wrap(Wrap { trim: true })
}

fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let todos = app.state.items();
    let block = Block::bordered().title(format!(" Todos ({}) ", todos.len()));

    if todos.is_empty() {
        let hint = Paragraph::new("No todos yet. Press 'a' to add one.")
            .style(Style::new().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = todos
        .iter()
        .map(|todo| todo_row(todo, app.state.is_pending(todo.id)))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut list_state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn todo_row(todo: &Todo, pending: bool) -> ListItem<'_> {
    let (marker, title_style) = if todo.completed {
        (
            "[x] ",
            Style::new()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        ("[ ] ", Style::new().add_modifier(Modifier::BOLD))
    };

    let mut title = vec![Span::raw(marker), Span::styled(todo.title.as_str(), title_style)];
    if pending {
        title.push(Span::styled(" …", Style::new().fg(Color::Yellow)));
    }

    ListItem::new(Text::from(vec![
        Line::from(title),
        Line::from(Span::styled(
            format!("    {}", todo.description),
            Style::new().fg(Color::Gray),
        )),
    ]))
}

fn help_line(app: &App) -> Line<'static> {
    let keys = if app.state.is_modal_open() {
        " Enter save · Tab switch field · Esc cancel"
    } else {
        " ↑/↓ move · Space done/undo · d delete · a add · r reload · q quit"
    };
    Line::from(Span::styled(keys, Style::new().fg(Color::DarkGray)))
}

fn draw_modal(frame: &mut Frame, app: &App) {
    let area = centered(frame.area(), 60, MODAL_HEIGHT);
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Add Todo ")
        .border_style(Style::new().fg(Color::Indexed(62)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [error, title, description, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(inner);

    if let Some(message) = app.state.error_message() {
        frame.render_widget(
            Paragraph::new(message).style(Style::new().fg(Color::Red)),
            error,
        );
    }

    let draft = app.state.draft();
    draw_input(frame, "Title", &draft.title, app.focus == Focus::Title, title);
    draw_input(
        frame,
        "Description",
        &draft.description,
        app.focus == Focus::Description,
        description,
    );

    let status_line = if app.state.is_submitting() {
        Span::styled("Saving...", Style::new().fg(Color::Yellow))
    } else {
        Span::styled("Save with Enter", Style::new().fg(Color::DarkGray))
    };
    frame.render_widget(Paragraph::new(Line::from(status_line)), status);
}

fn draw_input(frame: &mut Frame, label: &str, value: &str, focused: bool, area: Rect) {
    let border = if focused {
        Style::new().fg(Color::Indexed(62))
    } else {
        Style::new().fg(Color::DarkGray)
    };
    let input = Paragraph::new(value).block(Block::bordered().title(label).border_style(border));
    frame.render_widget(input, area);

    if focused {
        let width = u16::try_from(value.chars().count()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(width)
            .min(area.right().saturating_sub(2));
        frame.set_cursor_position(Position::new(x, area.y + 1));
    }
}

/// A box `width_percent` wide and `height` rows tall in the middle of `area`.
fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let [_, row, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, cell, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Percentage(width_percent),
        Constraint::Fill(1),
    ])
    .areas(row);
    cell
}
