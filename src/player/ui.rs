use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use tracklane::playback::PlaybackHandle;

use super::app::{App, Mode};
use super::browser::draw_browser;

/// Terminal rows of envelope per lane (two pixels each)
pub const LANE_ROWS: u16 = 4;
/// Smallest lane body still worth drawing
const MIN_LANE_ROWS: u16 = 1;

pub struct ScreenLayout {
    pub title: Rect,
    pub lanes: Rect,
    pub status: Rect,
    pub controls: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSlot {
    /// Name and volume row
    pub header: Rect,
    /// Envelope area
    pub body: Rect,
}

pub fn screen_layout(area: Rect) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Min(2),    // Lanes
            Constraint::Length(1), // Status
            Constraint::Length(3), // Controls
        ])
        .split(area);

    ScreenLayout {
        title: chunks[0],
        lanes: chunks[1],
        status: chunks[2],
        controls: chunks[3],
    }
}

/// Stack `count` lanes top to bottom, shrinking them to fit `area`.
///
/// Lanes that do not fit at all get zero-height rects.
pub fn lane_slots(area: Rect, count: usize) -> Vec<LaneSlot> {
    if count == 0 {
        return Vec::new();
    }
    let per_lane = (area.height / count as u16).clamp(1 + MIN_LANE_ROWS, 1 + LANE_ROWS);

    (0..count)
        .map(|i| {
            let top = area.y.saturating_add(i as u16 * per_lane);
            let bottom = area.y + area.height;
            if top.saturating_add(per_lane) > bottom {
                let empty = Rect::new(area.x, bottom, area.width, 0);
                return LaneSlot {
                    header: empty,
                    body: empty,
                };
            }
            LaneSlot {
                header: Rect::new(area.x, top, area.width, 1),
                body: Rect::new(area.x, top + 1, area.width, per_lane - 1),
            }
        })
        .collect()
}

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();
    let screen = screen_layout(size);

    let title = Paragraph::new("🎵 tracklane")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, screen.title);

    draw_lanes(f, screen.lanes, app);
    draw_status(f, screen.status, app);
    draw_controls(f, screen.controls, app);

    if app.browser.is_active {
        draw_browser(f, size, &app.browser);
    }
}

fn draw_lanes(f: &mut Frame, area: Rect, app: &App) {
    let tracks = app.coordinator.tracks();
    if tracks.is_empty() {
        let hint = Paragraph::new("No tracks loaded - press [a] to add one")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint, area);
        return;
    }

    for (index, (track, slot)) in tracks
        .iter()
        .zip(lane_slots(area, tracks.len()))
        .enumerate()
    {
        if slot.body.height == 0 {
            continue;
        }
        let selected = index == app.selected;

        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(24)])
            .split(slot.header);

        let name = match &app.mode {
            Mode::Rename { id, buffer } if *id == track.id() => Line::from(vec![
                Span::styled("✎ ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{buffer}█"),
                    Style::default().add_modifier(Modifier::UNDERLINED),
                ),
            ]),
            _ => Line::from(vec![
                Span::styled(
                    if selected { "▶ " } else { "  " },
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    track.name.as_str(),
                    if selected {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    },
                ),
                Span::styled(
                    format!("  {}", format_time(track.handle.current_time())),
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
        };
        f.render_widget(Paragraph::new(name), header[0]);

        let volume = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .ratio(track.volume().clamp(0.0, 1.0) as f64)
            .label(format!("vol {:>3.0}%", track.volume() * 100.0));
        f.render_widget(volume, header[1]);

        f.render_widget(track.surface.view(), slot.body);
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let count = app.coordinator.tracks().len();
    let mut spans = vec![Span::styled(
        format!(
            "{count} track{} loaded",
            if count == 1 { "" } else { "s" }
        ),
        Style::default().fg(Color::White),
    )];
    if app.pending_loads() > 0 {
        spans.push(Span::styled(
            format!("  ({} loading)", app.pending_loads()),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let control_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let controls_row1 = vec![
        if app.is_playing() {
            Span::styled("[space]", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("[space]", Style::default().fg(Color::Green))
        },
        Span::raw(if app.is_playing() {
            " pause  "
        } else {
            " play  "
        }),
        Span::styled("[←→]", Style::default().fg(Color::Magenta)),
        Span::raw(" seek  "),
        Span::styled("[↑↓]", Style::default().fg(Color::Magenta)),
        Span::raw(" select  "),
        Span::styled("[a]", Style::default().fg(Color::Blue)),
        Span::raw(" add  "),
        Span::styled("[q]", Style::default().fg(Color::Red)),
        Span::raw(" quit"),
    ];

    let controls_row2 = vec![
        Span::styled("[+/-]", Style::default().fg(Color::Green)),
        Span::raw(" volume  "),
        Span::styled("[r]", Style::default().fg(Color::Cyan)),
        Span::raw(" rename  "),
        Span::styled("[x]", Style::default().fg(Color::Yellow)),
        Span::raw(" remove  "),
        Span::styled("[d]", Style::default().fg(Color::Cyan)),
        Span::raw(" theme  "),
        Span::styled("[click]", Style::default().fg(Color::Magenta)),
        Span::raw(" seek all"),
    ];

    let border_widget = Block::default().borders(Borders::TOP);
    f.render_widget(border_widget, control_chunks[0]);

    f.render_widget(
        Paragraph::new(Line::from(controls_row1)).alignment(Alignment::Center),
        control_chunks[1],
    );
    f.render_widget(
        Paragraph::new(Line::from(controls_row2)).alignment(Alignment::Center),
        control_chunks[2],
    );
}

fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0) as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
