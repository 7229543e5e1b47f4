use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};
use thor_globe::braille::BrailleCanvas;
use thor_globe::data::Allegiance;
use thor_globe::map::{MapLayers, Stroke};
use thor_globe::tooltip::TerminalTooltip;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let (cols, rows) = app.map_cells();
    let map_area = Rect {
        width: (cols + 2).min(chunks[0].width),
        height: (rows + 2).min(chunks[0].height),
        ..chunks[0]
    };

    render_map(frame, app, map_area);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Thor Globe ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.globe.engine().rasterize(inner.width as usize, inner.height as usize);
    frame.render_widget(MapWidget { layers }, inner);

    if let Some(tooltip) = app.globe.tooltip().filter(|t| t.visible && !t.lines.is_empty()) {
        render_tooltip(frame, tooltip, inner);
    }
}

/// Braille canvases composited back to front
struct MapWidget {
    layers: MapLayers,
}

fn stroke_color(stroke: Stroke) -> Color {
    match stroke {
        Stroke::Sphere => Color::DarkGray,
        Stroke::Graticule => Color::Indexed(238),
        Stroke::Country(Allegiance::Allied) => Color::Blue,
        Stroke::Country(Allegiance::Axis) => Color::Red,
        Stroke::Country(Allegiance::Neutral) => Color::Gray,
        Stroke::Path => Color::Yellow,
        Stroke::Takeoff => Color::Green,
        Stroke::Target => Color::LightRed,
        Stroke::Highlight => Color::White,
    }
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                // Blank cells let lower layers show through
                if let Some(ch) = canvas.glyph(col as usize, row as usize) {
                    buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (stroke, canvas) in &self.layers.layers {
            Self::render_layer(canvas, stroke_color(*stroke), area, buf);
        }
    }
}

/// Bordered popup next to the pointer, kept inside the map area.
fn render_tooltip(frame: &mut Frame, tooltip: &TerminalTooltip, map: Rect) {
    let text_width = tooltip.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let width = (text_width + 2).min(map.width);
    let height = (tooltip.lines.len() as u16 + 2).min(map.height);
    if width < 3 || height < 3 {
        return;
    }

    // Surface dots to cells, offset one cell right and down from the pointer
    let (x, y) = tooltip.position;
    let col = (x / 2.0) as u16 + 1;
    let row = (y / 4.0) as u16 + 1;
    let col = col.min(map.width - width);
    let row = row.min(map.height - height);
    let popup = Rect {
        x: map.x + col,
        y: map.y + row,
        width,
        height,
    };

    let lines: Vec<Line> = tooltip
        .lines
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let style = if i == 0 {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(text.as_str(), style))
        })
        .collect();

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray)),
        ),
        popup,
    );
}

fn toggle_span(on: bool, on_text: &'static str, off_text: &'static str) -> Span<'static> {
    Span::styled(
        if on { on_text } else { off_text },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let toggles = app.globe.toggles();

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        toggle_span(toggles.show_paths, "[P]aths ", "[p]aths "),
        toggle_span(toggles.show_takeoffs, "[O]takeoffs ", "[o]takeoffs "),
        toggle_span(toggles.show_targets, "[T]argets ", "[t]argets "),
        toggle_span(toggles.show_graticule, "[G]rid ", "[g]rid "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.counts(), Style::default().fg(Color::Magenta)),
    ];

    if app.is_loading() {
        spans.push(Span::styled(" | loading…", Style::default().fg(Color::Yellow)));
    } else if let Some(error) = &app.load_error {
        spans.push(Span::styled(format!(" | {error}"), Style::default().fg(Color::Red)));
    } else {
        spans.push(Span::styled(
            " | hjkl:rotate +/-:zoom r:reload c:clear q:quit",
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
