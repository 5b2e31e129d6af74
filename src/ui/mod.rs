//! User interface rendering module
//!
//! All TUI rendering with ratatui, redrawn in full after every
//! processed event. The layer is read-only over [`AppState`]: it
//! derives widgets from the current state and returns nothing the core
//! depends on.
//!
//! Layout: a header line with connection and consumption info, a left
//! column with the topic and consumer-group panes, the message stream
//! on the right, an optional error panel, and a shortcut status bar.

mod message_view;
mod status;
mod topic_view;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::AppState;
use crate::rebalance::GroupState;
use message_view::render_message_stream;
use status::{render_error_panel, render_status_bar};
use topic_view::{render_group_list, render_topic_list};

/// Main UI rendering function
///
/// Orchestrates the rendering of all panes from the current
/// application state.
///
/// # Arguments
/// - `f` - The Frame to render into
/// - `app` - The application state
pub fn ui(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Status bar
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    // Split main area if showing errors
    let main_area = if app.show_errors && !app.error_log.is_empty() {
        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(chunks[1]);

        render_error_panel(f, app, main_chunks[1]);
        main_chunks[0]
    } else {
        chunks[1]
    };

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(panes[0]);

    render_topic_list(f, app, left[0]);
    render_group_list(f, app, left[1]);
    render_message_stream(f, app, panes[1]);

    render_status_bar(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &AppState, area: ratatui::layout::Rect) {
    let group_color = match app.group_state.state {
        GroupState::Stable => Color::Green,
        GroupState::Assigning | GroupState::Revoking => Color::Yellow,
        GroupState::Error => Color::Red,
        GroupState::Unknown => Color::DarkGray,
    };

    let header = Line::from(vec![
        Span::raw(format!(
            "Topic: {} | Group: {} | Broker: {} | Consumed: {} ({:.1} KB) | State: ",
            app.topic_name,
            app.group_id,
            app.broker_address,
            app.stats.messages_consumed,
            app.stats.bytes_consumed as f64 / 1024.0,
        )),
        Span::styled(
            app.group_state.state.as_str(),
            Style::default().fg(group_color).add_modifier(Modifier::BOLD),
        ),
    ]);

    let title = Paragraph::new(header)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}
