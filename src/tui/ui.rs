//! Rendering for the viewer TUI.
//!
//! The scene is drawn as two orthographic projections in a local
//! east/north/up frame anchored at the first path point (or the bit when
//! there is no path): a plan view looking down and a vertical section with
//! horizontal displacement against height.

use crate::geo::{EnuFrame, Position};
use crate::health::format_uptime;
use crate::scene::Color as SceneColor;
use crate::tui::app::App;
use crate::viewer::{Viewer, BIT_ENTITY_NAME, STATUS_CONNECTED};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points},
        Block, Borders, Paragraph,
    },
    Frame,
};

const HEADER_TEXT: &str = "drillview";

/// Footer text showing available keybindings.
const FOOTER_TEXT: &str =
    "[c] Connect  [f] Fly to bit  [x] Clear  [+/-] Diameter  [p] Colour  [q] Quit";

const VERSION_TEXT: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Smallest half-extent of a view, in metres.
const MIN_HALF_SPAN: f64 = 10.0;

/// Path and bit projected into the local frame.
#[derive(Debug, Default, PartialEq)]
pub struct Projection {
    /// `(east, north)` per path point.
    pub plan: Vec<(f64, f64)>,
    /// `(horizontal displacement, up)` per path point.
    pub section: Vec<(f64, f64)>,
    pub bit_plan: Option<(f64, f64)>,
    pub bit_section: Option<(f64, f64)>,
}

impl Projection {
    pub fn of(viewer: &Viewer) -> Self {
        let bit = viewer.bit_position();
        let Some(origin) = viewer.path().first().copied().or(bit) else {
            return Self::default();
        };
        let frame = EnuFrame::at(Position::new(origin.lon, origin.lat, 0.0));
        let project = |p: &Position| {
            let [e, n, u] = frame.project(p.to_cartesian());
            ((e, n), (e.hypot(n), u))
        };

        let (plan, section): (Vec<_>, Vec<_>) = viewer.path().iter().map(project).unzip();
        let bit = bit.as_ref().map(project);
        Self {
            plan,
            section,
            bit_plan: bit.map(|b| b.0),
            bit_section: bit.map(|b| b.1),
        }
    }
}

/// Square-ish bounds around `points`, padded by 10%.
pub fn bounds(points: impl IntoIterator<Item = (f64, f64)>) -> ([f64; 2], [f64; 2]) {
    let mut iter = points.into_iter();
    let Some((x0, y0)) = iter.next() else {
        return ([-MIN_HALF_SPAN, MIN_HALF_SPAN], [-MIN_HALF_SPAN, MIN_HALF_SPAN]);
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (x0, x0, y0, y0);
    for (x, y) in iter {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let half = ((max_x - min_x).max(max_y - min_y) / 2.0 * 1.1).max(MIN_HALF_SPAN);
    let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    ([cx - half, cx + half], [cy - half, cy + half])
}

fn to_tui_color(color: SceneColor) -> Color {
    let [r, g, b, _] = color.to_bytes();
    Color::Rgb(r, g, b)
}

fn pipe_color(viewer: &Viewer) -> Color {
    viewer
        .pipe_entity()
        .and_then(|e| e.polyline_volume.as_ref())
        .map(|v| to_tui_color(v.material))
        .unwrap_or(Color::Green)
}

/// Renders the whole screen: header, plan and section views, info panel and
/// footer.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(38),
            Constraint::Percentage(32),
            Constraint::Min(30),
        ])
        .split(chunks[1]);

    let projection = Projection::of(&app.viewer);
    let color = pipe_color(&app.viewer);
    render_view(
        frame,
        body[0],
        " Plan (E/N) ",
        &projection.plan,
        projection.bit_plan,
        color,
    );
    render_view(
        frame,
        body[1],
        " Section (H/Up) ",
        &projection.section,
        projection.bit_section,
        color,
    );
    render_info(frame, app, body[2]);
    render_footer(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.viewer.status();
    let status_style = if status == STATUS_CONNECTED {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let line = Line::from(vec![
        Span::styled(
            HEADER_TEXT,
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {}  ", VERSION_TEXT)),
        Span::styled(status.to_string(), status_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_view(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    path: &[(f64, f64)],
    bit: Option<(f64, f64)>,
    color: Color,
) {
    let (x_bounds, y_bounds) = bounds(path.iter().copied().chain(bit));
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            for w in path.windows(2) {
                ctx.draw(&CanvasLine {
                    x1: w[0].0,
                    y1: w[0].1,
                    x2: w[1].0,
                    y2: w[1].1,
                    color,
                });
            }
            if let Some((x, y)) = bit {
                ctx.draw(&Points {
                    coords: &[(x, y)],
                    color: Color::Yellow,
                });
                ctx.print(x, y, Span::styled(BIT_ENTITY_NAME, Style::default().fg(Color::Yellow)));
            }
        });
    frame.render_widget(canvas, area);
}

fn format_position(p: Position) -> String {
    format!("{:.5}, {:.5}, {:.1} m", p.lon, p.lat, p.height)
}

/// Lines of the info panel.
pub fn info_lines(app: &App) -> Vec<String> {
    let viewer = &app.viewer;
    let settings = viewer.settings();
    let mut lines = vec![
        format!("Server: {}", app.server),
        format!("Status: {}", viewer.status()),
        String::new(),
        match viewer.bit_position() {
            Some(p) => format!("Bit: {}", format_position(p)),
            None => "Bit: -".to_string(),
        },
        match viewer.md() {
            Some(md) => format!("MD: {:.1} m", md),
            None => "MD: -".to_string(),
        },
        format!("Path: {} points", viewer.path().len()),
        format!(
            "Pipe: {:.2} m {}",
            settings.effective_diameter(),
            settings.color
        ),
    ];

    if let Some(mesh) = viewer
        .pipe_entity()
        .and_then(|e| e.polyline_volume.as_ref())
        .and_then(|v| v.mesh.as_ref())
    {
        lines.push(format!(
            "Mesh: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        ));
    }

    let view = viewer.camera().view();
    lines.push(String::new());
    lines.push(format!("Camera: {}", format_position(view.position)));
    lines.push(format!(
        "  heading {:.0}, pitch {:.0}{}",
        view.heading,
        view.pitch,
        if viewer.camera().is_flying() { " (flying)" } else { "" }
    ));

    if let Some(at) = viewer.last_update() {
        let age = (chrono::Local::now() - at).num_seconds().max(0) as u64;
        lines.push(format!(
            "Last update: {} ({} ago)",
            at.format("%H:%M:%S"),
            format_uptime(age)
        ));
    }
    lines
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
    let text: Vec<Line> = info_lines(app).into_iter().map(Line::from).collect();
    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Info "));
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status_message {
        Some((msg, _)) => Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(Color::Cyan),
        )),
        None => Line::from(Span::styled(
            FOOTER_TEXT,
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}
