//! UI models and markup that should be available on both wasm and native.
//!
//! Keeping these out of the wasm-only `web` module allows us to unit-test the
//! page wiring (element ids, number formatting, generated panels) on the host.

use darp::aggregate::AggregateResult;
use darp::demos::DemoKind;
use darp::scheduler::PlayState;
use darp::synth::NeighborResult;
use darp::Vec2;

/// A horizontal likelihood bar and the text label next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricBar {
    pub bar: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerMount {
    pub canvas: &'static str,
    pub cards: &'static str,
    pub panel: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivergenceMount {
    pub canvas: &'static str,
    pub restart: &'static str,
    pub play: &'static str,
    pub naive_state: MetricBar,
    pub corrected_state: MetricBar,
    pub corrected_delta: MetricBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultimodalMount {
    pub canvas: &'static str,
    pub restart: &'static str,
    pub toggle: &'static str,
}

pub const EXPLORER_MOUNT: ExplorerMount = ExplorerMount {
    canvas: "architectureCanvas",
    cards: "neighborCards",
    panel: "aggregationPanel",
};

pub const DIVERGENCE_MOUNT: DivergenceMount = DivergenceMount {
    canvas: "divergenceCanvas",
    restart: "divergenceRestart",
    play: "divergencePlay",
    naive_state: MetricBar {
        bar: "bcStateLikelihood",
        value: "bcStateValue",
    },
    corrected_state: MetricBar {
        bar: "darpStateLikelihood",
        value: "darpStateValue",
    },
    corrected_delta: MetricBar {
        bar: "darpDeltaLikelihood",
        value: "darpDeltaValue",
    },
};

pub const MULTIMODAL_MOUNT: MultimodalMount = MultimodalMount {
    canvas: "multimodalCanvas",
    restart: "multimodalRestart",
    toggle: "multimodalToggle",
};

/// The canvas whose presence decides whether a demo is mounted at all.
pub fn canvas_id(kind: DemoKind) -> &'static str {
    match kind {
        DemoKind::Explorer => EXPLORER_MOUNT.canvas,
        DemoKind::Divergence => DIVERGENCE_MOUNT.canvas,
        DemoKind::Multimodal => MULTIMODAL_MOUNT.canvas,
    }
}

/// Drawing-space size for a canvas box; `fallback` while the box is collapsed.
pub fn stage_size(css: (f32, f32), fallback: (f32, f32)) -> (f32, f32) {
    let (w, h) = css;
    if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 {
        (w, h)
    } else {
        fallback
    }
}

/// One scale for both axes from CSS pixels to backing-store pixels.
pub fn device_scale(backing: (u32, u32), css: (f32, f32)) -> f64 {
    let (w, h) = css;
    if !(w > 0.0 && h > 0.0) {
        return 1.0;
    }
    let sx = backing.0 as f64 / w as f64;
    let sy = backing.1 as f64 / h as f64;
    sx.min(sy).max(f64::EPSILON)
}

/// Likelihood in [0,1] as a whole percentage, rounded half up.
pub fn percent(likelihood: f32) -> u32 {
    if !likelihood.is_finite() {
        return 0;
    }
    (likelihood.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// `"42%"`, usable both as bar width and as label text.
pub fn percent_label(likelihood: f32) -> String {
    format!("{}%", percent(likelihood))
}

pub fn format_state(v: Vec2) -> String {
    format!("({:.1}, {:.1})", v.x, v.y)
}

pub fn format_action(v: Vec2) -> String {
    format!("({:.3}, {:.3})", v.x, v.y)
}

/// Inner markup of the play/pause button for the given transport state.
pub fn play_button_html(state: PlayState) -> String {
    let icon = match state {
        PlayState::Paused => r#"<polygon points="5 3 19 12 5 21 5 3"></polygon>"#,
        PlayState::Playing => {
            r#"<rect x="6" y="4" width="4" height="16"></rect><rect x="14" y="4" width="4" height="16"></rect>"#
        }
    };
    format!(
        r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="currentColor">{icon}</svg> {}"#,
        state.button_label()
    )
}

fn empty_state(message: &str) -> String {
    format!(r#"<div class="empty-state"><p>{message}</p></div>"#)
}

/// One card per neighbor: stored state, stored action, offset and prediction.
pub fn neighbor_cards_html(neighbors: &[NeighborResult]) -> String {
    if neighbors.is_empty() {
        return empty_state("Hover or click to begin");
    }
    let mut html = String::new();
    for (i, n) in neighbors.iter().enumerate() {
        let rank = i + 1;
        html.push_str(&format!(
            concat!(
                r#"<div class="neighbor-card">"#,
                r#"<div class="neighbor-header"><span class="neighbor-index">{rank}</span><span>Neighbor {rank}</span></div>"#,
                r#"<div class="neighbor-data">"#,
                r#"<div class="data-row"><span class="data-label">s*:</span><span class="data-value">{state}</span></div>"#,
                r#"<div class="data-row"><span class="data-label">a*:</span><span class="data-value">{action}</span></div>"#,
                r#"<div class="data-row"><span class="data-label">Δ:</span><span class="data-value">{offset}</span></div>"#,
                r#"</div>"#,
                r#"<div class="prediction-output"><span class="prediction-label">a'<sub>{rank}</sub></span><span class="data-value">{prediction}</span></div>"#,
                r#"</div>"#,
            ),
            rank = rank,
            state = format_state(n.record.position),
            action = format_action(n.record.action),
            offset = format_state(n.offset),
            prediction = format_action(n.prediction),
        ));
    }
    html
}

/// The aggregation panel: each prediction, then the combined estimate.
pub fn aggregation_html(neighbors: &[NeighborResult], estimate: &AggregateResult) -> String {
    if neighbors.is_empty() || !estimate.is_available() {
        return empty_state("Awaiting neighbor predictions");
    }
    let items: String = neighbors
        .iter()
        .enumerate()
        .map(|(i, n)| {
            format!(
                r#"<div class="prediction-item"><span class="prediction-item-label">a'<sub>{}</sub></span><span class="data-value">{}</span></div>"#,
                i + 1,
                format_action(n.prediction)
            )
        })
        .collect();
    let output: String = estimate
        .values()
        .into_iter()
        .map(|v| format!(r#"<span class="data-value">{}</span>"#, format_action(v)))
        .collect();
    format!(
        concat!(
            r#"<div class="aggregation-active">"#,
            r#"<div class="aggregation-formula"><div class="formula-label">Aggregation Function g<sub>ψ</sub></div>"#,
            r#"<div class="formula-content">â<sub>q</sub> = <sup>1</sup>/<sub>k</sub> ∑<sub>i=1</sub><sup>k</sup> a'<sub>i</sub></div></div>"#,
            r#"<div class="prediction-list">{items}</div>"#,
            r#"<div class="final-output"><span class="output-label">â<sub>q</sub></span>{output}</div>"#,
            r#"</div>"#,
        ),
        items = items,
        output = output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use darp::aggregate::{aggregate, AggregatePolicy};
    use darp::query::nearest;
    use darp::store::DemoRecord;
    use darp::synth::{synthesize, PredictionModel};

    fn sample() -> Vec<NeighborResult> {
        let records = vec![
            DemoRecord::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)),
            DemoRecord::new(Vec2::new(10.0, 0.0), Vec2::new(0.0, 1.0)),
            DemoRecord::new(Vec2::new(0.0, 10.0), Vec2::new(-1.0, 0.0)),
        ];
        let q = Vec2::new(1.0, 1.0);
        synthesize(PredictionModel::default(), q, &nearest(&records, q, 2))
    }

    #[test]
    fn stage_follows_the_canvas_box() {
        assert_eq!(stage_size((600.0, 400.0), (800.0, 400.0)), (600.0, 400.0));
        assert_eq!(stage_size((0.0, 400.0), (800.0, 400.0)), (800.0, 400.0));
        assert_eq!(stage_size((f32::NAN, 1.0), (800.0, 400.0)), (800.0, 400.0));
    }

    #[test]
    fn device_scale_is_uniform() {
        // A 600×400 box at dpr 1 keeps circles round.
        assert_eq!(device_scale((600, 400), (600.0, 400.0)), 1.0);
        assert_eq!(device_scale((1200, 800), (600.0, 400.0)), 2.0);
        // Rounded backing sizes pick the smaller axis.
        assert_eq!(device_scale((1201, 800), (600.0, 400.0)), 2.0);
        assert_eq!(device_scale((10, 10), (0.0, 0.0)), 1.0);
    }

    #[test]
    fn mount_ids_are_distinct() {
        let d = DIVERGENCE_MOUNT;
        let mut ids = vec![
            EXPLORER_MOUNT.canvas,
            EXPLORER_MOUNT.cards,
            EXPLORER_MOUNT.panel,
            d.canvas,
            d.restart,
            d.play,
            d.naive_state.bar,
            d.naive_state.value,
            d.corrected_state.bar,
            d.corrected_state.value,
            d.corrected_delta.bar,
            d.corrected_delta.value,
            MULTIMODAL_MOUNT.canvas,
            MULTIMODAL_MOUNT.restart,
            MULTIMODAL_MOUNT.toggle,
        ];
        let n = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), n);

        for k in DemoKind::all() {
            assert!(canvas_id(*k).ends_with("Canvas"));
        }
    }

    #[test]
    fn percent_rounds_and_clamps() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.845), 85);
        assert_eq!(percent(0.004), 0);
        assert_eq!(percent(1.7), 100);
        assert_eq!(percent(-0.2), 0);
        assert_eq!(percent(f32::NAN), 0);
        assert_eq!(percent_label(0.9), "90%");
    }

    #[test]
    fn vectors_format_like_the_page() {
        assert_eq!(format_state(Vec2::new(12.345, -3.0)), "(12.3, -3.0)");
        assert_eq!(format_action(Vec2::new(0.98512, 0.0)), "(0.985, 0.000)");
    }

    #[test]
    fn play_button_shows_the_next_action() {
        assert!(play_button_html(PlayState::Paused).ends_with("Play"));
        assert!(play_button_html(PlayState::Playing).ends_with("Pause"));
    }

    #[test]
    fn panels_fall_back_to_empty_state() {
        let none = aggregate(AggregatePolicy::Mean, &[]);
        assert!(neighbor_cards_html(&[]).contains("empty-state"));
        assert!(aggregation_html(&[], &none).contains("Awaiting neighbor predictions"));
    }

    #[test]
    fn panels_list_every_neighbor() {
        let neighbors = sample();
        let estimate = aggregate(AggregatePolicy::Mean, &neighbors);

        let cards = neighbor_cards_html(&neighbors);
        assert_eq!(cards.matches(r#"class="neighbor-card""#).count(), 2);
        assert!(cards.contains("(0.0, 0.0)"));
        assert!(cards.contains("(0.985, -0.015)"));

        let panel = aggregation_html(&neighbors, &estimate);
        assert_eq!(panel.matches(r#"class="prediction-item""#).count(), 2);
        assert!(panel.contains("final-output"));
    }
}
