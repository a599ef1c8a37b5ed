use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use darp::config::DarpConfig;
use darp::demos::{Demo, Divergence, Explorer, Frame, Multimodal, RenderSink};
use darp::scheduler::{Animate, PlayState, Transport};
use darp::Vec2;

use crate::ui_model::{
    aggregation_html, neighbor_cards_html, percent_label, play_button_html, stage_size, MetricBar,
    DIVERGENCE_MOUNT, EXPLORER_MOUNT, MULTIMODAL_MOUNT,
};

mod canvas;
mod ticker;

use ticker::AnimationFrameTicks;

/// Mount every demo whose canvas is on the page; the rest are skipped.
pub fn start() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let cfg = DarpConfig {
        seed: (js_sys::Math::random() * u32::MAX as f64) as u64,
        ..DarpConfig::default()
    };

    let mounted = [
        ("explorer", mount_explorer(&document, &cfg)),
        ("divergence", mount_divergence(&document, &cfg)),
        ("multimodal", mount_multimodal(&document, &cfg)),
    ];
    for (name, result) in mounted {
        match result {
            Ok(true) => tracing::debug!(demo = name, "mounted"),
            Ok(false) => tracing::debug!(demo = name, "mount point absent, skipped"),
            Err(e) => tracing::warn!(demo = name, error = %e, "mount failed"),
        }
    }
}

fn by_id<T: JsCast>(document: &web_sys::Document, id: &str) -> Option<T> {
    document.get_element_by_id(id)?.dyn_into::<T>().ok()
}

fn listen(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), String> {
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
    target
        .add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())
        .map_err(|_| format!("{event}: add_event_listener failed"))?;
    cb.forget();
    Ok(())
}

fn on_window_resize(handler: impl FnMut(web_sys::Event) + 'static) -> Result<(), String> {
    let window = web_sys::window().ok_or("no window".to_string())?;
    listen(&window, "resize", handler)
}

fn pointer(ev: &web_sys::Event) -> Option<Vec2> {
    let me = ev.dyn_ref::<web_sys::MouseEvent>()?;
    Some(Vec2::new(me.offset_x() as f32, me.offset_y() as f32))
}

// Explorer

#[derive(Clone)]
struct ExplorerView {
    canvas: web_sys::HtmlCanvasElement,
    cards: Option<web_sys::Element>,
    panel: Option<web_sys::Element>,
}

impl RenderSink for ExplorerView {
    fn emit(&mut self, frame: &Frame) {
        let Frame::Explorer(f) = frame else {
            return;
        };
        if let Err(e) = canvas::draw_explorer(&self.canvas, f) {
            tracing::warn!(error = %e, "explorer draw failed");
        }
        if let Some(cards) = &self.cards {
            cards.set_inner_html(&neighbor_cards_html(&f.neighbors));
        }
        if let Some(panel) = &self.panel {
            panel.set_inner_html(&aggregation_html(&f.neighbors, &f.aggregate));
        }
    }
}

fn mount_explorer(document: &web_sys::Document, cfg: &DarpConfig) -> Result<bool, String> {
    let m = EXPLORER_MOUNT;
    let Some(canvas) = by_id::<web_sys::HtmlCanvasElement>(document, m.canvas) else {
        return Ok(false);
    };
    let view = ExplorerView {
        canvas: canvas.clone(),
        cards: document.get_element_by_id(m.cards),
        panel: document.get_element_by_id(m.panel),
    };

    let mut explorer = Explorer::from_config(cfg);
    let (w, h) = canvas::fit_to_element(&canvas);
    explorer.resize(w, h);
    explorer.render(&mut view.clone());
    let state = Rc::new(RefCell::new(explorer));

    listen(&canvas, "mousemove", {
        let (state, mut view) = (Rc::clone(&state), view.clone());
        move |ev| {
            let Some(p) = pointer(&ev) else {
                return;
            };
            let mut e = state.borrow_mut();
            e.pointer_move(p);
            e.render(&mut view);
        }
    })?;

    listen(&canvas, "mouseleave", {
        let (state, mut view) = (Rc::clone(&state), view.clone());
        move |_| {
            let mut e = state.borrow_mut();
            e.pointer_leave();
            e.render(&mut view);
        }
    })?;

    listen(&canvas, "click", {
        let (state, mut view) = (Rc::clone(&state), view.clone());
        move |ev| {
            let Some(p) = pointer(&ev) else {
                return;
            };
            let mut e = state.borrow_mut();
            e.click(p);
            e.render(&mut view);
        }
    })?;

    on_window_resize({
        let mut view = view;
        move |_| {
            let (w, h) = canvas::fit_to_element(&view.canvas);
            let mut e = state.borrow_mut();
            e.resize(w, h);
            e.render(&mut view);
        }
    })?;

    Ok(true)
}

// Animated demos

struct CanvasSink {
    canvas: web_sys::HtmlCanvasElement,
    logical: (f32, f32),
    /// Naive state, corrected state, corrected delta.
    bars: Vec<(MetricBar, Option<web_sys::HtmlElement>, Option<web_sys::Element>)>,
}

impl CanvasSink {
    /// Fits the canvas to its box; `fallback` is the stage while it is collapsed.
    fn new(canvas: web_sys::HtmlCanvasElement, fallback: (f32, f32)) -> Self {
        let logical = stage_size(canvas::fit_to_element(&canvas), fallback);
        Self {
            canvas,
            logical,
            bars: Vec::new(),
        }
    }

    /// Re-acquire the drawing size after a window resize.
    fn refit(&mut self) -> (f32, f32) {
        self.logical = stage_size(canvas::fit_to_element(&self.canvas), self.logical);
        self.logical
    }

    fn with_bars(mut self, document: &web_sys::Document, bars: &[MetricBar]) -> Self {
        self.bars = bars
            .iter()
            .map(|b| (*b, by_id(document, b.bar), document.get_element_by_id(b.value)))
            .collect();
        self
    }

    fn set_bar(&self, i: usize, likelihood: f32) {
        let Some((_, bar, value)) = self.bars.get(i) else {
            return;
        };
        let pct = percent_label(likelihood);
        if let Some(bar) = bar {
            let _ = bar.style().set_property("width", &pct);
        }
        if let Some(value) = value {
            value.set_text_content(Some(&pct));
        }
    }
}

impl RenderSink for CanvasSink {
    fn emit(&mut self, frame: &Frame) {
        let (w, h) = self.logical;
        let drawn = match frame {
            Frame::Divergence(f) => {
                self.set_bar(0, f.naive.state_likelihood);
                self.set_bar(1, f.corrected.state_likelihood);
                self.set_bar(2, f.corrected.delta_likelihood.unwrap_or(0.0));
                canvas::draw_divergence(&self.canvas, f, w, h)
            }
            Frame::Multimodal(f) => canvas::draw_multimodal(&self.canvas, f, w, h),
            Frame::Explorer(_) => Ok(()),
        };
        if let Err(e) = drawn {
            tracing::warn!(kind = frame.kind().label(), error = %e, "draw failed");
        }
    }
}

/// Wire a frame-driven demo to its canvas, its buttons and the display clock.
/// `on_resize` receives the new drawing size in CSS pixels.
fn mount_animated<D, R>(
    document: &web_sys::Document,
    demo: D,
    sink: CanvasSink,
    restart_id: &str,
    toggle_id: &str,
    mut on_resize: R,
) -> Result<(), String>
where
    D: Animate + Demo + 'static,
    R: FnMut(&mut D, f32, f32) + 'static,
{
    let demo = Rc::new(RefCell::new(demo));
    let sink = Rc::new(RefCell::new(sink));
    demo.borrow().render(&mut *sink.borrow_mut());

    let ticks = Rc::new(RefCell::new(AnimationFrameTicks::new({
        let (demo, sink) = (Rc::clone(&demo), Rc::clone(&sink));
        move || {
            let mut d = demo.borrow_mut();
            let dt = d.time_step();
            d.advance(dt);
            d.render(&mut *sink.borrow_mut());
        }
    })));
    let transport = Rc::new(RefCell::new(Transport::new()));
    let toggle = by_id::<web_sys::Element>(document, toggle_id);

    if let Some(button) = &toggle {
        button.set_inner_html(&play_button_html(PlayState::Paused));
        listen(button, "click", {
            let (ticks, transport, button) = (Rc::clone(&ticks), Rc::clone(&transport), button.clone());
            move |_| {
                let state = transport.borrow_mut().toggle(&mut *ticks.borrow_mut());
                button.set_inner_html(&play_button_html(state));
            }
        })?;
    }

    if let Some(restart) = by_id::<web_sys::Element>(document, restart_id) {
        listen(&restart, "click", {
            let (demo, sink) = (Rc::clone(&demo), Rc::clone(&sink));
            move |_| {
                let mut d = demo.borrow_mut();
                transport.borrow_mut().restart(&mut *d, &mut *ticks.borrow_mut());
                if let Some(button) = &toggle {
                    button.set_inner_html(&play_button_html(PlayState::Paused));
                }
                d.render(&mut *sink.borrow_mut());
            }
        })?;
    }

    on_window_resize(move |_| {
        let mut s = sink.borrow_mut();
        let (w, h) = s.refit();
        let mut d = demo.borrow_mut();
        on_resize(&mut *d, w, h);
        d.render(&mut *s);
    })
}

fn mount_divergence(document: &web_sys::Document, cfg: &DarpConfig) -> Result<bool, String> {
    let m = DIVERGENCE_MOUNT;
    let Some(canvas) = by_id::<web_sys::HtmlCanvasElement>(document, m.canvas) else {
        return Ok(false);
    };
    let c = &cfg.divergence;
    let sink = CanvasSink::new(canvas, (c.width, c.height)).with_bars(
        document,
        &[m.naive_state, m.corrected_state, m.corrected_delta],
    );
    let (width, height) = sink.logical;
    let mut cfg = cfg.clone();
    cfg.divergence.width = width;
    cfg.divergence.height = height;
    mount_animated(
        document,
        Divergence::from_config(&cfg),
        sink,
        m.restart,
        m.play,
        |d: &mut Divergence, w, h| d.resize(w, h),
    )?;
    Ok(true)
}

fn mount_multimodal(document: &web_sys::Document, cfg: &DarpConfig) -> Result<bool, String> {
    let m = MULTIMODAL_MOUNT;
    let Some(canvas) = by_id::<web_sys::HtmlCanvasElement>(document, m.canvas) else {
        return Ok(false);
    };
    // Cluster centers are absolute; only the cleared area follows the canvas.
    let sink = CanvasSink::new(canvas, (cfg.divergence.width, cfg.divergence.height));
    mount_animated(
        document,
        Multimodal::from_config(cfg),
        sink,
        m.restart,
        m.toggle,
        |_: &mut Multimodal, _, _| {},
    )?;
    Ok(true)
}
