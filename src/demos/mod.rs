//! Demo instances.
//!
//! Each demo owns its records, its random stream and its query/animation state.
//! Nothing is shared between instances, so several can live on one page (or in
//! one test) without cross-talk. The only thing a demo hands outward is a
//! [`Frame`]; drawing it is the renderer's job.

pub mod divergence;
pub mod explorer;
pub mod multimodal;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::prng::Prng;

pub use divergence::{AgentView, Divergence, DivergenceFrame};
pub use explorer::{Explorer, ExplorerFrame, QueryView};
pub use multimodal::{Multimodal, MultimodalFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DemoKind {
    Explorer,
    Divergence,
    Multimodal,
}

impl DemoKind {
    pub fn label(self) -> &'static str {
        match self {
            DemoKind::Explorer => "explorer",
            DemoKind::Divergence => "divergence",
            DemoKind::Multimodal => "multimodal",
        }
    }

    pub fn parse(s: &str) -> Option<DemoKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explorer" | "architecture" => Some(DemoKind::Explorer),
            "divergence" | "drift" => Some(DemoKind::Divergence),
            "multimodal" | "modes" => Some(DemoKind::Multimodal),
            _ => None,
        }
    }

    /// Whether the demo runs off the frame clock (vs. pointer events only).
    pub fn is_animated(self) -> bool {
        !matches!(self, DemoKind::Explorer)
    }

    /// Independent random stream per demo from one root seed.
    pub fn rng(self, root_seed: u64) -> Prng {
        let salt: u64 = match self {
            DemoKind::Explorer => 0xA5A5_0001,
            DemoKind::Divergence => 0xA5A5_0002,
            DemoKind::Multimodal => 0xA5A5_0003,
        };
        Prng::new(root_seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    pub fn all() -> &'static [DemoKind] {
        &[DemoKind::Explorer, DemoKind::Divergence, DemoKind::Multimodal]
    }
}

/// Everything a renderer needs for one redraw.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "demo", rename_all = "snake_case"))]
pub enum Frame {
    Explorer(ExplorerFrame),
    Divergence(DivergenceFrame),
    Multimodal(MultimodalFrame),
}

impl Frame {
    pub fn kind(&self) -> DemoKind {
        match self {
            Frame::Explorer(_) => DemoKind::Explorer,
            Frame::Divergence(_) => DemoKind::Divergence,
            Frame::Multimodal(_) => DemoKind::Multimodal,
        }
    }
}

/// The Render/View collaborator.
pub trait RenderSink {
    fn emit(&mut self, frame: &Frame);
}

impl<F: FnMut(&Frame)> RenderSink for F {
    fn emit(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// Common surface of the three demos.
pub trait Demo {
    fn kind(&self) -> DemoKind;

    fn frame(&self) -> Frame;

    /// Regenerate records and return to the initial state.
    fn reset(&mut self);

    fn render<S: RenderSink>(&self, sink: &mut S)
    where
        Self: Sized,
    {
        sink.emit(&self.frame());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_parse_back() {
        for k in DemoKind::all() {
            assert_eq!(DemoKind::parse(k.label()), Some(*k));
        }
        assert_eq!(DemoKind::parse(" Architecture "), Some(DemoKind::Explorer));
        assert_eq!(DemoKind::parse("carousel"), None);
    }

    #[test]
    fn demo_streams_are_independent() {
        let mut a = DemoKind::Divergence.rng(1);
        let mut b = DemoKind::Multimodal.rng(1);
        let xs: Vec<u32> = (0..4).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..4).map(|_| b.next_u32()).collect();
        assert_ne!(xs, ys);
    }
}
