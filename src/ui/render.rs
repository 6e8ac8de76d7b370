use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::canvas::{Canvas, Circle, Context, Line, Rectangle},
    Frame,
};

use super::app::App;
use crate::render::{DrawCommand, DrawList, Rgb};

/// Render the TUI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.size();
    let (width, height) = app.size();
    paint(frame, area, app.canvas(), width, height);
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Paint recorded commands onto a braille canvas covering `area`
/// The canvas y axis grows upward, so logical y is flipped
fn paint(frame: &mut Frame, area: Rect, list: &DrawList, width: f64, height: f64) {
    let background = list.background().map(color).unwrap_or(Color::Reset);
    // One braille row is a quarter of a terminal row
    let dot_step = height / (area.height.max(1) as f64 * 4.0);

    let canvas = Canvas::default()
        .background_color(background)
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for command in list.commands() {
                paint_command(ctx, command, width, height, dot_step);
            }
        });

    frame.render_widget(canvas, area);
}

/// Clip a segment to `[0, width] x [0, height]` (Liang-Barsky)
/// Canvas lines with an endpoint outside the bounds are not drawn at all
fn clip_line(
    from: (f64, f64),
    to: (f64, f64),
    width: f64,
    height: f64,
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, from.0),
        (dx, width - from.0),
        (-dy, from.1),
        (dy, height - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let point = |t: f64| {
        (
            (from.0 + t * dx).clamp(0.0, width),
            (from.1 + t * dy).clamp(0.0, height),
        )
    };
    Some((point(t0), point(t1)))
}

fn paint_command(
    ctx: &mut Context,
    command: &DrawCommand,
    width: f64,
    height: f64,
    dot_step: f64,
) {
    match command {
        DrawCommand::Clear(_) => {}
        DrawCommand::FillRect {
            x,
            y,
            width: rect_width,
            height: rect_height,
            color: rgb,
        } => {
            let left = x.max(0.0);
            let right = (x + rect_width).min(width);
            let upper = y.max(0.0);
            let lower = (y + rect_height).min(height);
            if left > right || upper > lower {
                return;
            }

            // Braille rectangles are outlines only; fill with one line per dot row
            let top = height - upper;
            let bottom = height - lower;
            let mut row = bottom;
            while row <= top {
                ctx.draw(&Line {
                    x1: left,
                    y1: row,
                    x2: right,
                    y2: row,
                    color: color(*rgb),
                });
                row += dot_step;
            }
            ctx.draw(&Rectangle {
                x: left,
                y: bottom,
                width: right - left,
                height: top - bottom,
                color: color(*rgb),
            });
        }
        DrawCommand::Line { from, to, color: rgb } => {
            let Some((from, to)) = clip_line(*from, *to, width, height) else {
                return;
            };
            ctx.draw(&Line {
                x1: from.0,
                y1: height - from.1,
                x2: to.0,
                y2: height - to.1,
                color: color(*rgb),
            });
        }
        DrawCommand::Circle {
            x,
            y,
            radius,
            color: rgb,
        } => {
            ctx.draw(&Circle {
                x: *x,
                y: height - y,
                radius: *radius,
                color: color(*rgb),
            });
        }
        DrawCommand::Text {
            x,
            y,
            text,
            color: rgb,
        } => {
            ctx.print(
                *x,
                height - y,
                Span::styled(text.clone(), Style::default().fg(color(*rgb))),
            );
        }
    }
}
