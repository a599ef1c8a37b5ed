//! Scripted phase timeline for the mode-comparison animation.
//!
//! Phase assignment is a pure function of `time mod cycle`. Within a phase,
//! overlay opacities are clamped linear ramps over the local progress.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    /// Not yet advanced since construction or reset.
    Idle,
    SelectNeighbors,
    ShowMean,
    ShowModes,
    Hold,
}

/// Phase durations in simulated seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhaseSchedule {
    pub select: f32,
    pub mean: f32,
    pub modes: f32,
    pub hold: f32,
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        Self {
            select: 1.0,
            mean: 1.5,
            modes: 2.5,
            hold: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasePosition {
    pub phase: Phase,
    /// `(t - phase_start) / phase_duration`, clamped to [0,1].
    pub progress: f32,
    /// `time mod cycle`.
    pub cycle_time: f32,
}

/// Opacity of the two prediction overlays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Overlay {
    pub mean_alpha: f32,
    pub modes_alpha: f32,
}

impl PhaseSchedule {
    pub fn cycle(&self) -> f32 {
        self.select + self.mean + self.modes + self.hold
    }

    fn spans(&self) -> [(Phase, f32); 4] {
        [
            (Phase::SelectNeighbors, self.select),
            (Phase::ShowMean, self.mean),
            (Phase::ShowModes, self.modes),
            (Phase::Hold, self.hold),
        ]
    }

    pub fn locate(&self, time: f32) -> PhasePosition {
        let cycle = self.cycle();
        let cycle_time = if cycle > 0.0 { time.rem_euclid(cycle) } else { 0.0 };

        let mut start = 0.0f32;
        for (phase, duration) in self.spans() {
            let end = start + duration;
            if cycle_time < end {
                return PhasePosition {
                    phase,
                    progress: progress(cycle_time, start, duration),
                    cycle_time,
                };
            }
            start = end;
        }

        // rem_euclid can land exactly on `cycle` through rounding.
        PhasePosition {
            phase: Phase::Hold,
            progress: 1.0,
            cycle_time,
        }
    }
}

pub fn progress(time: f32, start: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    ((time - start) / duration).clamp(0.0, 1.0)
}

impl Overlay {
    pub fn at(pos: PhasePosition) -> Overlay {
        let p = pos.progress;
        match pos.phase {
            Phase::Idle | Phase::SelectNeighbors => Overlay::default(),
            Phase::ShowMean => Overlay {
                mean_alpha: (p * 2.0).min(1.0),
                modes_alpha: 0.0,
            },
            Phase::ShowModes => Overlay {
                mean_alpha: (1.0 - p * 1.5).max(0.0),
                modes_alpha: (p * 2.0).min(1.0),
            },
            Phase::Hold => Overlay {
                mean_alpha: 0.0,
                modes_alpha: 1.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cycle_is_eight_seconds() {
        assert_eq!(PhaseSchedule::default().cycle(), 8.0);
    }

    #[test]
    fn phase_boundaries() {
        let s = PhaseSchedule::default();
        assert_eq!(s.locate(0.0).phase, Phase::SelectNeighbors);
        assert_eq!(s.locate(0.99).phase, Phase::SelectNeighbors);
        assert_eq!(s.locate(1.0).phase, Phase::ShowMean);
        assert_eq!(s.locate(2.49).phase, Phase::ShowMean);
        assert_eq!(s.locate(2.5).phase, Phase::ShowModes);
        assert_eq!(s.locate(4.99).phase, Phase::ShowModes);
        assert_eq!(s.locate(5.0).phase, Phase::Hold);
        assert_eq!(s.locate(7.99).phase, Phase::Hold);
        assert_eq!(s.locate(8.0).phase, Phase::SelectNeighbors);
    }

    #[test]
    fn phase_is_function_of_time_mod_cycle() {
        let s = PhaseSchedule::default();
        for i in 0..80 {
            let t = i as f32 * 0.1 + 0.05;
            let a = s.locate(t);
            let b = s.locate(t + 8.0 * 3.0);
            assert_eq!(a.phase, b.phase, "t={t}");
            assert!((a.progress - b.progress).abs() < 1e-3);
        }
    }

    #[test]
    fn progress_is_local_and_clamped() {
        let s = PhaseSchedule::default();
        let pos = s.locate(1.75);
        assert_eq!(pos.phase, Phase::ShowMean);
        assert!((pos.progress - 0.5).abs() < 1e-6);
        assert_eq!(progress(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(progress(9.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn overlay_ramps() {
        let s = PhaseSchedule::default();
        let o = Overlay::at(s.locate(0.5));
        assert_eq!(o, Overlay::default());

        // Mean fades in over the first half of its phase.
        let o = Overlay::at(s.locate(1.375));
        assert!((o.mean_alpha - 0.5).abs() < 1e-5);
        assert_eq!(o.modes_alpha, 0.0);
        assert_eq!(Overlay::at(s.locate(2.4)).mean_alpha, 1.0);

        // Modes fade in while the mean fades out.
        let o = Overlay::at(s.locate(2.5 + 2.5 * 0.4));
        assert!((o.modes_alpha - 0.8).abs() < 1e-5);
        assert!((o.mean_alpha - 0.4).abs() < 1e-5);

        let o = Overlay::at(s.locate(6.0));
        assert_eq!(o.mean_alpha, 0.0);
        assert_eq!(o.modes_alpha, 1.0);
    }
}
