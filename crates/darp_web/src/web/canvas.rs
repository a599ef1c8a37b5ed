use std::f64::consts::{PI, TAU};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use darp::demos::{DivergenceFrame, ExplorerFrame, MultimodalFrame};
use darp::Vec2;

use crate::ui_model::device_scale;

type Ctx = web_sys::CanvasRenderingContext2d;

const BACKGROUND: &str = "#fafafa";
const ARROW_LENGTH: f64 = 30.0;
const POINT_RADIUS: f64 = 3.0;
const NEIGHBOR: &str = "#dc2626";
const OFFSET: &str = "#16a34a";
const QUERY: &str = "#2563eb";
const STREAM: &str = "rgba(59, 130, 246, 0.6)";
const NAIVE: &str = "#dc2626";
const CORRECTED: &str = "#16a34a";
const MODE_QUERY: &str = "#8b5cf6";
const LABEL_FONT: &str = "600 12px Inter, sans-serif";

fn context(canvas: &web_sys::HtmlCanvasElement) -> Result<Ctx, String> {
    canvas
        .get_context("2d")
        .map_err(|_| "canvas: get_context threw".to_string())?
        .ok_or("canvas: missing 2d context".to_string())?
        .dyn_into::<Ctx>()
        .map_err(|_| "canvas: context is not 2d".to_string())
}

/// Size the backing store to the element's box at device resolution.
///
/// Returns the CSS size, which is the coordinate space the demos draw in.
pub(super) fn fit_to_element(canvas: &web_sys::HtmlCanvasElement) -> (f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    let dpr = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
    canvas.set_width((rect.width() * dpr).round().max(1.0) as u32);
    canvas.set_height((rect.height() * dpr).round().max(1.0) as u32);
    (rect.width() as f32, rect.height() as f32)
}

/// Draw in CSS pixels (`logical_w × logical_h`) at device resolution and clear.
#[allow(deprecated)]
fn begin(canvas: &web_sys::HtmlCanvasElement, logical_w: f32, logical_h: f32) -> Result<Ctx, String> {
    let ctx = context(canvas)?;
    let scale = device_scale((canvas.width(), canvas.height()), (logical_w, logical_h));
    ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0)
        .map_err(|_| "canvas: set_transform failed".to_string())?;
    ctx.set_global_alpha(1.0);
    ctx.set_fill_style(&JsValue::from_str(BACKGROUND));
    ctx.fill_rect(0.0, 0.0, logical_w as f64, logical_h as f64);
    Ok(ctx)
}

fn set_dash(ctx: &Ctx, on: f64, off: f64) {
    let pattern = js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off));
    let _ = ctx.set_line_dash(&pattern);
}

fn clear_dash(ctx: &Ctx) {
    let _ = ctx.set_line_dash(&js_sys::Array::new());
}

#[allow(deprecated)]
fn dot(ctx: &Ctx, p: Vec2, radius: f64, color: &str) {
    ctx.set_fill_style(&JsValue::from_str(color));
    ctx.begin_path();
    let _ = ctx.arc(p.x as f64, p.y as f64, radius, 0.0, TAU);
    ctx.fill();
}

fn glow_dot(ctx: &Ctx, p: Vec2, radius: f64, color: &str, shadow: &str, blur: f64) {
    ctx.set_shadow_blur(blur);
    ctx.set_shadow_color(shadow);
    dot(ctx, p, radius, color);
    ctx.set_shadow_blur(0.0);
}

#[allow(deprecated)]
fn label(ctx: &Ctx, text: &str, x: f32, y: f32, color: &str) {
    ctx.set_font(LABEL_FONT);
    ctx.set_fill_style(&JsValue::from_str(color));
    let _ = ctx.fill_text(text, x as f64, y as f64);
}

/// Line with a filled head; the shaft stops short so the head stays sharp.
#[allow(deprecated)]
fn arrow(ctx: &Ctx, from: Vec2, to: Vec2, color: &str, width: f64, dashed: bool) {
    let head = 8.0;
    let (fx, fy, tx, ty) = (from.x as f64, from.y as f64, to.x as f64, to.y as f64);
    let angle = (ty - fy).atan2(tx - fx);
    let shaft_x = tx - head * 0.7 * angle.cos();
    let shaft_y = ty - head * 0.7 * angle.sin();

    ctx.save();
    if dashed {
        set_dash(ctx, 5.0, 3.0);
    }
    ctx.set_stroke_style(&JsValue::from_str(color));
    ctx.set_line_width(width);
    ctx.begin_path();
    ctx.move_to(fx, fy);
    ctx.line_to(shaft_x, shaft_y);
    ctx.stroke();
    ctx.restore();

    ctx.set_fill_style(&JsValue::from_str(color));
    ctx.begin_path();
    ctx.move_to(tx, ty);
    ctx.line_to(tx - head * (angle - PI / 6.0).cos(), ty - head * (angle - PI / 6.0).sin());
    ctx.line_to(tx - head * (angle + PI / 6.0).cos(), ty - head * (angle + PI / 6.0).sin());
    ctx.close_path();
    ctx.fill();
}

#[allow(deprecated)]
fn polyline(ctx: &Ctx, points: &[Vec2], color: &str) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    if rest.is_empty() {
        return;
    }
    ctx.set_stroke_style(&JsValue::from_str(color));
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(first.x as f64, first.y as f64);
    for p in rest {
        ctx.line_to(p.x as f64, p.y as f64);
    }
    ctx.stroke();
}

pub(super) fn draw_explorer(canvas: &web_sys::HtmlCanvasElement, frame: &ExplorerFrame) -> Result<(), String> {
    let ctx = begin(canvas, frame.width, frame.height)?;
    let hover_only = frame.query.map(|q| !q.locked).unwrap_or(false);

    for (i, r) in frame.records.iter().enumerate() {
        let is_neighbor = frame.neighbors.iter().any(|n| n.index == i);
        let (point, shaft, size, width) = if is_neighbor {
            (NEIGHBOR, NEIGHBOR, 5.0, 2.5)
        } else {
            ("#9ca3af", "#cbd5e0", POINT_RADIUS, 1.5)
        };
        let alpha = match (is_neighbor, hover_only) {
            (true, true) => 0.6,
            (true, false) => 1.0,
            (false, _) => 0.8,
        };
        ctx.set_global_alpha(alpha);
        let tip = r.position + r.action * ARROW_LENGTH as f32;
        arrow(&ctx, r.position, tip, shaft, width, false);
        dot(&ctx, r.position, size, point);
    }
    ctx.set_global_alpha(1.0);

    let Some(query) = frame.query else {
        return Ok(());
    };

    ctx.set_global_alpha(if query.locked { 1.0 } else { 0.5 });
    for n in &frame.neighbors {
        arrow(&ctx, query.position, n.record.position, OFFSET, 1.5, true);
    }

    if !query.locked {
        dot(&ctx, query.position, 6.0, QUERY);
        ctx.set_global_alpha(1.0);
        return Ok(());
    }

    if let Some(mean) = frame.aggregate.mean() {
        arrow(&ctx, query.position, query.position + mean * ARROW_LENGTH as f32, QUERY, 4.0, false);
    }
    glow_dot(&ctx, query.position, 7.0, QUERY, "rgba(37, 99, 235, 0.5)", 10.0);
    Ok(())
}

#[allow(deprecated)]
pub(super) fn draw_divergence(
    canvas: &web_sys::HtmlCanvasElement,
    frame: &DivergenceFrame,
    logical_w: f32,
    logical_h: f32,
) -> Result<(), String> {
    let ctx = begin(canvas, logical_w, logical_h)?;

    for p in &frame.stream {
        dot(&ctx, *p, 3.0, STREAM);
    }

    polyline(&ctx, &frame.naive.trail, "rgba(220, 38, 38, 0.3)");
    polyline(&ctx, &frame.corrected.trail, "rgba(22, 163, 74, 0.3)");

    // Offsets from the corrected agent's neighbors toward the agent.
    let agent = frame.corrected.position;
    ctx.set_stroke_style(&JsValue::from_str("rgba(212, 148, 10, 0.4)"));
    ctx.set_line_width(1.5);
    set_dash(&ctx, 5.0, 5.0);
    for n in &frame.neighbors {
        let from = n.record.position;
        let angle = ((agent.y - from.y) as f64).atan2((agent.x - from.x) as f64);
        let (ax, ay) = (agent.x as f64, agent.y as f64);
        let head = 6.0;
        ctx.begin_path();
        ctx.move_to(from.x as f64, from.y as f64);
        ctx.line_to(ax, ay);
        ctx.move_to(ax, ay);
        ctx.line_to(ax - head * (angle - PI / 6.0).cos(), ay - head * (angle - PI / 6.0).sin());
        ctx.move_to(ax, ay);
        ctx.line_to(ax - head * (angle + PI / 6.0).cos(), ay - head * (angle + PI / 6.0).sin());
        ctx.stroke();
    }
    clear_dash(&ctx);

    let naive = frame.naive.position;
    glow_dot(&ctx, naive, 6.0, NAIVE, "rgba(220, 38, 38, 0.4)", 8.0);
    glow_dot(&ctx, agent, 6.0, CORRECTED, "rgba(22, 163, 74, 0.4)", 8.0);
    label(&ctx, "BC", naive.x - 10.0, naive.y - 12.0, NAIVE);
    label(&ctx, "DARP", agent.x - 18.0, agent.y - 12.0, CORRECTED);
    Ok(())
}

#[allow(deprecated)]
pub(super) fn draw_multimodal(
    canvas: &web_sys::HtmlCanvasElement,
    frame: &MultimodalFrame,
    logical_w: f32,
    logical_h: f32,
) -> Result<(), String> {
    let ctx = begin(canvas, logical_w, logical_h)?;

    for (i, p) in frame.points.iter().enumerate() {
        if frame.neighbors.iter().any(|n| n.index == i) {
            dot(&ctx, p.position, 8.0, "rgba(251, 191, 36, 0.3)");
        }
        dot(&ctx, p.position, 4.0, STREAM);
    }

    if !frame.neighbors.is_empty() {
        ctx.set_stroke_style(&JsValue::from_str("rgba(251, 191, 36, 0.3)"));
        ctx.set_line_width(1.5);
        set_dash(&ctx, 5.0, 5.0);
        for n in &frame.neighbors {
            ctx.begin_path();
            ctx.move_to(frame.query.x as f64, frame.query.y as f64);
            ctx.line_to(n.record.position.x as f64, n.record.position.y as f64);
            ctx.stroke();
        }
        clear_dash(&ctx);
    }

    let q = frame.query;
    glow_dot(&ctx, q, 8.0, MODE_QUERY, "rgba(139, 92, 246, 0.5)", 10.0);
    label(&ctx, "Query State", q.x - 35.0, q.y - 15.0, MODE_QUERY);

    let overlay = frame.overlay;
    if let (true, Some(mean)) = (overlay.mean_alpha > 0.0, frame.mean.mean()) {
        ctx.set_global_alpha(overlay.mean_alpha as f64);
        let (x, y, s) = (mean.x as f64, mean.y as f64, 10.0);
        ctx.set_stroke_style(&JsValue::from_str(NEIGHBOR));
        ctx.set_line_width(3.0);
        ctx.begin_path();
        ctx.move_to(x - s, y - s);
        ctx.line_to(x + s, y + s);
        ctx.move_to(x + s, y - s);
        ctx.line_to(x - s, y + s);
        ctx.stroke();
        label(&ctx, "Averaged", mean.x - 45.0, mean.y + 25.0, NEIGHBOR);
        ctx.set_global_alpha(1.0);
    }

    let modes = frame.modes.modes();
    if overlay.modes_alpha > 0.0 && !modes.is_empty() {
        ctx.set_global_alpha(overlay.modes_alpha as f64);
        for m in modes {
            glow_dot(&ctx, m.value, 7.0, CORRECTED, "rgba(22, 163, 74, 0.4)", 8.0);
        }
        let first = modes[0].value;
        label(&ctx, "Set-based", first.x - 50.0, first.y - 20.0, CORRECTED);
        ctx.set_global_alpha(1.0);
    }
    Ok(())
}
