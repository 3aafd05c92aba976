//! Rotating 3D globe with exchange and cloud-region latency arcs

use super::coastline::Coastline;
use super::VizState;
use crate::ai::flows::{Flow, FlowContext, FlowOutput};
use crate::ai::job::AnalysisJob;
use crate::ai::TextGenerator;
use crate::colors::{bucket_color, provider_color, scheme_color, StatusColor};
use crate::config::{GlobeConfig, LinkMode};
use crate::error::Result;
use crate::help::{render_panel, render_tooltip, PanelLine};
use crate::latency::feed::SnapshotFeed;
use crate::latency::realtime::topology_links;
use crate::latency::LatencySnapshot;
use crate::scene::camera::{Camera, Viewport};
use crate::scene::geo::{lat_lon_to_vec3, Vec3};
use crate::scene::{LatencyBucket, MarkerShape, Scene, SceneDiff, GLOBE_RADIUS};
use crate::terminal::{Input, Terminal};
use crate::topology::{default_topology, Provider};
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use crossterm::style::Color;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;

/// Approximate pixel size of a terminal cell, for converting mouse drags.
const CELL_PX_W: f32 = 8.0;
const CELL_PX_H: f32 = 16.0;
/// Wheel delta reported per scroll notch.
const WHEEL_NOTCH: f32 = 100.0;
/// Radians per arrow key press.
const KEY_ROTATE_STEP: f32 = 0.1;
/// Samples along each arc before line filling.
const ARC_SAMPLES: usize = 48;

const PRIORITY_GRATICULE: u8 = 1;
const PRIORITY_COAST: u8 = 2;
const PRIORITY_ARC: u8 = 3;
const PRIORITY_PULSE: u8 = 5;
const PRIORITY_MARKER: u8 = 6;

/// Help text for the globe view
const HELP: &str = "\
GLOBE
─────────────────────────
drag    Rotate globe
wheel   Zoom
←↑↓→    Rotate
+/-     Zoom in/out
0       Reset camera
r       Toggle auto-rotate
t       Live / topology links
l       Toggle links
g       Toggle regions
a       Analyze latency
s       Suggest pairings
d       Adapt routing
x/Enter Close result
c       Cycle colors
1-9     Frame delay
space   Pause
q/Esc   Quit";

#[derive(Clone, Copy)]
struct Dot {
    color: Color,
    bold: bool,
    priority: u8,
}

/// Braille dot grid: 2x4 dots per terminal cell.
struct DotCanvas {
    width: usize,
    height: usize,
    dots: Vec<Option<Dot>>,
}

impl DotCanvas {
    fn new(cols: u16, rows: u16) -> Self {
        let width = cols as usize * 2;
        let height = rows as usize * 4;
        Self { width, height, dots: vec![None; width * height] }
    }

    fn clear(&mut self) {
        self.dots.iter_mut().for_each(|d| *d = None);
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }

    fn plot(&mut self, x: i32, y: i32, dot: Dot) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let slot = &mut self.dots[y as usize * self.width + x as usize];
        if slot.map_or(true, |d| d.priority <= dot.priority) {
            *slot = Some(dot);
        }
    }

    fn line(&mut self, (x0, y0): (i32, i32), (x1, y1): (i32, i32), dot: Dot) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.plot(x, y, dot);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn blob(&mut self, x: i32, y: i32, radius: i32, dot: Dot, square: bool) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if square || dx.abs() + dy.abs() <= radius {
                    self.plot(x + dx, y + dy, dot);
                }
            }
        }
    }

    /// Render dots into terminal cells; each cell takes its top-priority dot's color.
    fn blit(&self, term: &mut Terminal) {
        const DOT_BITS: [(usize, usize, u8); 8] = [
            (0, 0, 0x01), (0, 1, 0x02), (0, 2, 0x04), (1, 0, 0x08),
            (1, 1, 0x10), (1, 2, 0x20), (0, 3, 0x40), (1, 3, 0x80),
        ];
        for cy in 0..self.height / 4 {
            for cx in 0..self.width / 2 {
                let mut bits: u8 = 0;
                let mut top: Option<Dot> = None;
                for (dx, dy, bit) in DOT_BITS {
                    if let Some(dot) = self.dots[(cy * 4 + dy) * self.width + cx * 2 + dx] {
                        bits |= bit;
                        if top.map_or(true, |t| dot.priority > t.priority) {
                            top = Some(dot);
                        }
                    }
                }
                if let Some(dot) = top {
                    let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                    term.set(cx as i32, cy as i32, ch, Some(dot.color), dot.bold);
                }
            }
        }
    }
}

/// Latitude circles every 30 degrees and meridians every 30 degrees.
fn graticule() -> Vec<Vec<Vec3>> {
    let mut runs = Vec::new();
    for lat in (-60..=60).step_by(30) {
        runs.push((0..=360).map(|lon| lat_lon_to_vec3(lat as f32, lon as f32 - 180.0, GLOBE_RADIUS)).collect());
    }
    for lon in (-180..180).step_by(30) {
        runs.push((-90..=90).map(|lat| lat_lon_to_vec3(lat as f32, lon as f32, GLOBE_RADIUS)).collect());
    }
    runs
}

/// Result or error shown over the globe until dismissed.
struct ResultPanel {
    lines: Vec<PanelLine>,
    border: Color,
}

impl ResultPanel {
    fn from_result(flow: Flow, result: Result<FlowOutput>) -> Self {
        let mut lines = vec![PanelLine::new(flow.title(), Color::White), PanelLine::new("", Color::Grey)];
        let border = match result {
            Ok(output) => {
                for (severity, text) in output.lines() {
                    let color = severity.map_or(Color::Grey, |s| StatusColor::for_severity(s).color());
                    lines.push(PanelLine::new(text, color));
                }
                Color::White
            }
            Err(e) => {
                lines.push(PanelLine::new(e.to_string(), StatusColor::Critical.color()));
                StatusColor::Critical.color()
            }
        };
        lines.push(PanelLine::new("", Color::Grey));
        lines.push(PanelLine::new("x / Enter to close", StatusColor::Muted.color()));
        Self { lines, border }
    }
}

/// Run the globe view until the user quits.
pub fn run(term: &mut Terminal, config: GlobeConfig, generator: Arc<dyn TextGenerator>) -> Result<()> {
    let topology = default_topology();
    let mut state = VizState::new(config.time_step, HELP);
    let mut camera = Camera::new(config.camera_distance);
    let mut auto_rotate = config.auto_rotate;
    let mut mode = config.mode;
    let mut filters = config.filters.clone();

    let graticule = graticule();
    let coast = Coastline::resolve(config.coastline.as_deref());
    if coast.is_empty() {
        debug!("no coastline outline; drawing graticule only");
    }
    let coastline = coast.surface_points(GLOBE_RADIUS);

    let mut feed = SnapshotFeed::spawn(topology, config.ranges.clone(), config.refresh, config.seed);
    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut snapshot: Arc<LatencySnapshot> = feed.current();
    let mut scene = Scene::default();
    let mut dirty = true;

    let mut job: Option<AnalysisJob> = None;
    let mut panel: Option<ResultPanel> = None;
    let mut hover: Option<(u16, u16)> = None;

    let (init_w, init_h) = term.size();
    let mut prev_w = init_w;
    let mut prev_h = init_h;
    let mut canvas = DotCanvas::new(init_w, init_h);

    let mut anim_time: f32 = 0.0;
    let mut last_frame = Instant::now();

    info!("globe view started in {} mode", mode.label());

    'frames: loop {
        let (width, height) = crossterm::terminal::size().unwrap_or(term.size());
        if width != prev_w || height != prev_h {
            term.resize(width, height);
            term.clear_screen()?;
            canvas = DotCanvas::new(width, height);
            prev_w = width;
            prev_h = height;
        }

        for input in term.poll_inputs()? {
            match input {
                Input::Key(code, mods) => {
                    if panel.is_some() && matches!(code, KeyCode::Char('x') | KeyCode::Enter) {
                        panel = None;
                        continue;
                    }
                    if state.handle_key(code, mods) {
                        break 'frames;
                    }
                    match code {
                        KeyCode::Left => camera.rotation_y -= KEY_ROTATE_STEP,
                        KeyCode::Right => camera.rotation_y += KEY_ROTATE_STEP,
                        KeyCode::Up => camera.rotation_x -= KEY_ROTATE_STEP,
                        KeyCode::Down => camera.rotation_x += KEY_ROTATE_STEP,
                        KeyCode::Char('+') | KeyCode::Char('=') => camera.zoom(-WHEEL_NOTCH),
                        KeyCode::Char('-') | KeyCode::Char('_') => camera.zoom(WHEEL_NOTCH),
                        KeyCode::Char('0') => camera = Camera::new(config.camera_distance),
                        KeyCode::Char('r') => auto_rotate = !auto_rotate,
                        KeyCode::Char('t') => {
                            mode = mode.toggled();
                            info!("link mode: {}", mode.label());
                            dirty = true;
                        }
                        KeyCode::Char('l') => {
                            filters.show_connections = !filters.show_connections;
                            dirty = true;
                        }
                        KeyCode::Char('g') => {
                            filters.show_regions = !filters.show_regions;
                            dirty = true;
                        }
                        KeyCode::Char(c @ ('a' | 's' | 'd')) => {
                            let flow = match c {
                                'a' => Flow::Analyze,
                                's' => Flow::Suggest,
                                _ => Flow::Adapt,
                            };
                            if job.is_some() {
                                debug!("analysis already running; ignoring {:?}", flow);
                            } else {
                                match FlowContext::gather(topology, &snapshot, config.analysis_window_hours) {
                                    Ok(ctx) => {
                                        info!("starting {:?}", flow);
                                        panel = None;
                                        job = Some(AnalysisJob::spawn(Arc::clone(&generator), flow, ctx));
                                    }
                                    Err(e) => {
                                        warn!("could not prepare {:?}: {e}", flow);
                                        panel = Some(ResultPanel::from_result(flow, Err(e)));
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Input::Mouse(event) => handle_mouse(&mut camera, &mut hover, event),
                Input::Resize(..) => {}
            }
        }

        let (latest, changed) = feed.latest();
        if changed {
            snapshot = latest;
            dirty |= mode == LinkMode::Live;
        }
        if dirty {
            let links = match mode {
                LinkMode::Live => snapshot.links.clone(),
                LinkMode::Topology => topology_links(topology),
            };
            let next = Scene::build(topology, &links, &filters, &mut rng);
            let diff = SceneDiff::between(&scene, &next);
            if !diff.is_empty() {
                debug!("scene rebuilt: {diff}");
            }
            scene = next;
            dirty = false;
        }

        let now = Instant::now();
        if !state.paused {
            anim_time += now.duration_since(last_frame).as_secs_f32();
            camera.auto_rotate(config.rotate_step, !auto_rotate);
        }
        last_frame = now;

        if let Some(result) = job.as_ref().and_then(|j| j.try_result().map(|r| (j.flow(), r))) {
            panel = Some(ResultPanel::from_result(result.0, result.1));
            job = None;
        }

        // Draw
        canvas.clear();
        let viewport = canvas.viewport();
        let project = |p: Vec3| -> Option<(i32, i32)> {
            if !camera.is_visible(p, GLOBE_RADIUS) {
                return None;
            }
            camera.project(p, viewport).map(|(x, y, _)| (x as i32, y as i32))
        };

        let (grid_color, _) = scheme_color(state.color_scheme(), 0, false);
        let grid_dot = Dot { color: grid_color, bold: false, priority: PRIORITY_GRATICULE };
        for run in &graticule {
            for p in run {
                if let Some((x, y)) = project(*p) {
                    canvas.plot(x, y, grid_dot);
                }
            }
        }

        let (coast_color, coast_bold) = scheme_color(state.color_scheme(), 2, false);
        let coast_dot = Dot { color: coast_color, bold: coast_bold, priority: PRIORITY_COAST };
        for run in &coastline {
            for p in run {
                if let Some((x, y)) = project(*p) {
                    canvas.plot(x, y, coast_dot);
                }
            }
        }

        for conn in &scene.connections {
            let dot = Dot { color: bucket_color(conn.bucket), bold: false, priority: PRIORITY_ARC };
            let mut prev: Option<(i32, i32)> = None;
            for p in conn.curve.points(ARC_SAMPLES) {
                let here = project(p);
                if let (Some(a), Some(b)) = (prev, here) {
                    canvas.line(a, b, dot);
                }
                prev = here;
            }
            if let Some((x, y)) = project(conn.pulse_position(anim_time)) {
                let pulse = Dot { color: bucket_color(conn.bucket), bold: true, priority: PRIORITY_PULSE };
                canvas.blob(x, y, 1, pulse, false);
            }
        }

        for marker in &scene.markers {
            if let Some((x, y)) = project(marker.position) {
                let dot = Dot { color: provider_color(marker.provider), bold: true, priority: PRIORITY_MARKER };
                match marker.shape {
                    MarkerShape::Dot => canvas.blob(x, y, 1, dot, false),
                    MarkerShape::Square => canvas.blob(x, y, 1, dot, true),
                }
            }
        }

        term.clear();
        canvas.blit(term);
        draw_status(term, width, &snapshot, &scene, mode, auto_rotate, state.paused);
        draw_legend(term, height);
        if let Some(j) = &job {
            let msg = format!(" {:?} running… {:.0}s ", j.flow(), j.elapsed().as_secs_f32());
            term.set_str(width as i32 - msg.chars().count() as i32, height as i32 - 1, &msg, Some(Color::Cyan), false);
        }

        if let Some((hx, hy)) = hover {
            let sx = hx as f32 * 2.0 + 1.0;
            let sy = hy as f32 * 4.0 + 2.0;
            if let Some(marker) = scene.pick(&camera, sx, sy, viewport) {
                let mut lines: Vec<PanelLine> = marker
                    .label_lines()
                    .into_iter()
                    .map(|l| PanelLine::new(l, Color::Grey))
                    .collect();
                lines[0].color = provider_color(marker.provider);
                render_tooltip(term, hx as i32, hy as i32, &lines);
            }
        }

        if let Some(p) = &panel {
            render_panel(term, width, height, &p.lines, p.border);
        }
        state.render_help(term, width, height);
        term.present()?;
        term.sleep(state.speed);
    }

    info!("globe view closed");
    Ok(())
}

fn handle_mouse(camera: &mut Camera, hover: &mut Option<(u16, u16)>, event: MouseEvent) {
    let px = event.column as f32 * CELL_PX_W;
    let py = event.row as f32 * CELL_PX_H;
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => camera.begin_drag(px, py),
        MouseEventKind::Drag(MouseButton::Left) => {
            camera.drag_to(px, py);
            *hover = None;
        }
        MouseEventKind::Up(MouseButton::Left) => camera.end_drag(),
        MouseEventKind::ScrollUp => camera.zoom(-WHEEL_NOTCH),
        MouseEventKind::ScrollDown => camera.zoom(WHEEL_NOTCH),
        MouseEventKind::Moved => *hover = Some((event.column, event.row)),
        _ => {}
    }
}

fn draw_status(
    term: &mut Terminal,
    width: u16,
    snapshot: &LatencySnapshot,
    scene: &Scene,
    mode: LinkMode,
    auto_rotate: bool,
    paused: bool,
) {
    let avg = snapshot.average_latency();
    let mut x = 0;
    let mut put = |term: &mut Terminal, text: &str, color: Color, bold: bool| {
        term.set_str(x, 0, text, Some(color), bold);
        x += text.chars().count() as i32;
    };
    put(term, " GeoQuantica ", Color::White, true);
    put(term, &format!("│ {} ", mode.label()), Color::Grey, false);
    put(term, &format!("│ {} links ", scene.connections.len()), Color::Grey, false);
    put(term, "│ avg ", Color::Grey, false);
    put(term, &format!("{avg:.1} ms "), StatusColor::for_latency(avg).color(), true);
    put(term, &format!("│ {} ", snapshot.generated_at.format("%H:%M:%S UTC")), StatusColor::Muted.color(), false);
    if paused {
        put(term, "│ paused ", StatusColor::Warning.color(), false);
    } else if !auto_rotate {
        put(term, "│ spin off ", StatusColor::Muted.color(), false);
    }
    let hint = "? help ";
    term.set_str(width as i32 - hint.len() as i32, 0, hint, Some(StatusColor::Muted.color()), false);
}

fn draw_legend(term: &mut Terminal, height: u16) {
    let y = height as i32 - 1;
    let mut x = 1;
    let mut put = |term: &mut Terminal, text: &str, color: Color| {
        term.set_str(x, y, text, Some(color), false);
        x += text.chars().count() as i32 + 1;
    };
    for provider in [Provider::Aws, Provider::Gcp, Provider::Azure] {
        put(term, &format!("■ {provider}"), provider_color(provider));
    }
    put(term, "│", Color::DarkGrey);
    for (bucket, label) in [
        (LatencyBucket::Low, "<50"),
        (LatencyBucket::Medium, "<150"),
        (LatencyBucket::High, "150+"),
        (LatencyBucket::Logical, "logical"),
    ] {
        put(term, &format!("━ {label}"), bucket_color(bucket));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::flows::{LatencyAlert, LatencyAnalysis, Severity};
    use crate::error::Error;

    fn dot(priority: u8) -> Dot {
        Dot { color: Color::Green, bold: false, priority }
    }

    #[test]
    fn canvas_keeps_highest_priority() {
        let mut canvas = DotCanvas::new(4, 2);
        canvas.plot(1, 1, dot(3));
        canvas.plot(1, 1, dot(1));
        assert_eq!(canvas.dots[canvas.width + 1].map(|d| d.priority), Some(3));
        canvas.plot(-1, 0, dot(9));
        canvas.plot(8, 0, dot(9));
        assert_eq!(canvas.dots.iter().flatten().count(), 1);
    }

    #[test]
    fn line_connects_endpoints() {
        let mut canvas = DotCanvas::new(10, 5);
        canvas.line((0, 0), (9, 4), dot(1));
        assert!(canvas.dots[0].is_some());
        assert!(canvas.dots[4 * canvas.width + 9].is_some());
        assert_eq!(canvas.dots.iter().flatten().count(), 10);
    }

    #[test]
    fn graticule_lies_on_globe() {
        let runs = graticule();
        assert_eq!(runs.len(), 5 + 12);
        assert!(runs.iter().flatten().all(|p| (p.length() - GLOBE_RADIUS).abs() < 1e-3));
    }

    #[test]
    fn result_panel_colors_by_severity() {
        let output = FlowOutput::Analysis(LatencyAnalysis {
            alerts: vec![LatencyAlert {
                severity: Severity::High,
                message: "spike".into(),
                suggested_action: "reroute".into(),
            }],
            optimal_server_pairings: "okx-aws-ap-northeast-1".into(),
        });
        let panel = ResultPanel::from_result(Flow::Analyze, Ok(output));
        assert_eq!(panel.lines[2].text, "[HIGH] spike");
        assert_eq!(panel.lines[2].color, Color::Red);

        let failed = ResultPanel::from_result(Flow::Suggest, Err(Error::EmptyResponse.in_flow("suggest optimal server pairings")));
        assert_eq!(failed.border, Color::Red);
        assert!(failed.lines[2].text.starts_with("failed to suggest optimal server pairings"));
    }
}
