use std::{fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{
    library::{ActionKind, ActionSpec},
    skeleton::{Joint, Pose, JOINT_COUNT, LIMB_CHAINS},
    PldError, Result,
};

const MIN_FRAMES: usize = 4;

/// Largest deviation of one limb's segment lengths from the skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimbDrift {
    pub limb: String,
    pub max_drift: f32,
}

/// Quality summary of one sampled cycle (or one full duration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionReport {
    pub action: String,
    pub frames: usize,
    pub duration_seconds: f32,
    /// Pose jump across the loop boundary; absent for one-shot actions.
    pub seam_error: Option<f32>,
    pub limb_drift: Vec<LimbDrift>,
    /// Vertical extent travelled by each joint, in joint order.
    pub vertical_range: Vec<f32>,
    /// Strongest non-DC frequency of the torso's vertical motion.
    pub dominant_frequency_hz: Option<f32>,
}

impl MotionReport {
    pub fn max_drift(&self) -> f32 {
        self.limb_drift
            .iter()
            .map(|drift| drift.max_drift)
            .fold(0.0, f32::max)
    }
}

/// One-shot [`MotionAnalyzer::analyse`] with a fresh planner.
pub fn analyse(spec: &ActionSpec, frames: usize) -> Result<MotionReport> {
    MotionAnalyzer::new().analyse(spec, frames)
}

/// Samples action specs and measures rigidity, seams and tempo.
pub struct MotionAnalyzer {
    planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
}

impl Default for MotionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    /// Evaluates `frames` evenly spaced phases of `spec` and reports on them.
    pub fn analyse(&mut self, spec: &ActionSpec, frames: usize) -> Result<MotionReport> {
        if frames < MIN_FRAMES {
            return Err(PldError::options(format!(
                "analysis needs at least {MIN_FRAMES} frames, got {frames}"
            )));
        }

        let looping = spec.kind() == ActionKind::Periodic || spec.cyclic;
        // Looping actions sample one period without repeating its end point.
        let divisor = if looping { frames } else { frames - 1 };
        let poses: Vec<Pose> = (0..frames)
            .map(|index| spec.evaluate(index as f32 / divisor as f32))
            .collect();

        let seam_error = looping.then(|| spec.evaluate(0.0).max_deviation(&spec.evaluate(1.0)));
        let limb_drift = measure_drift(spec, &poses);
        let vertical_range = (0..JOINT_COUNT)
            .map(|id| {
                let (low, high) = poses.iter().fold(
                    (f32::INFINITY, f32::NEG_INFINITY),
                    |(low, high), pose| {
                        let y = pose.points()[id].y;
                        (low.min(y), high.max(y))
                    },
                );
                high - low
            })
            .collect();

        let torso: Vec<f32> = poses.iter().map(|pose| pose.get(Joint::Torso).y).collect();
        let sample_rate = divisor as f32 / spec.timing;
        let dominant_frequency_hz = self.dominant_frequency(&torso, sample_rate)?;

        Ok(MotionReport {
            action: spec.action.to_string(),
            frames,
            duration_seconds: spec.timing,
            seam_error,
            limb_drift,
            vertical_range,
            dominant_frequency_hz,
        })
    }

    /// Frequency of the strongest spectral peak above DC, or `None` for a
    /// flat signal. No window is applied: callers sample whole periods.
    pub fn dominant_frequency(&mut self, samples: &[f32], sample_rate: f32) -> Result<Option<f32>> {
        if samples.len() < MIN_FRAMES {
            return Err(PldError::options(
                "frequency estimation requires at least four samples",
            ));
        }

        let len = samples.len();
        let mean = samples.iter().sum::<f32>() / len as f32;
        let fft = self.prepare_fft(len);
        for (slot, value) in fft.input.iter_mut().zip(samples) {
            *slot = value - mean;
        }
        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let peak = fft
            .spectrum
            .iter()
            .enumerate()
            .skip(1)
            .map(|(bin, value)| (bin, value.norm()))
            .fold(None, |best: Option<(usize, f32)>, (bin, magnitude)| match best {
                Some((_, top)) if top >= magnitude => best,
                _ => Some((bin, magnitude)),
            });

        Ok(peak
            .filter(|(_, magnitude)| *magnitude > 1e-6 * len as f32)
            .map(|(bin, _)| bin as f32 * sample_rate / len as f32))
    }

    fn prepare_fft(&mut self, size: usize) -> &mut FftResources {
        if self.fft.as_ref().map_or(true, |fft| fft.size != size) {
            self.fft = None;
        }
        let planner = &mut self.planner;
        self.fft
            .get_or_insert_with(|| FftResources::new(planner, size))
    }
}

fn measure_drift(spec: &ActionSpec, poses: &[Pose]) -> Vec<LimbDrift> {
    let dims = spec.skeleton.dimensions();
    LIMB_CHAINS
        .iter()
        .map(|(name, chain)| {
            let (upper, lower) = if name.ends_with("arm") {
                (dims.upper_arm, dims.forearm)
            } else {
                (dims.thigh, dims.shin)
            };
            let max_drift = poses
                .iter()
                .map(|pose| {
                    let (a, b) = pose.segment_lengths(*chain);
                    (a - upper).abs().max((b - lower).abs())
                })
                .fold(0.0, f32::max);
            LimbDrift {
                limb: name.to_string(),
                max_drift,
            }
        })
        .collect()
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn new(planner: &mut RealFftPlanner<f32>, size: usize) -> Self {
        let plan = planner.plan_fft_forward(size);
        Self {
            size,
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    }
}

impl fmt::Debug for MotionAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionAnalyzer")
            .field("fft", &self.fft)
            .finish()
    }
}

impl fmt::Debug for FftResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftResources")
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use super::*;
    use crate::{
        library::{Action, ActionLibrary},
        modulation::{self, BodyProfile, Emotion, Gender, Weight},
    };

    #[test]
    fn finds_the_frequency_of_a_sinusoid() {
        let mut analyzer = MotionAnalyzer::new();
        let samples: Vec<f32> = (0..64)
            .map(|i| 0.5 + (TAU * 3.0 * i as f32 / 64.0).sin())
            .collect();

        let frequency = analyzer.dominant_frequency(&samples, 32.0).unwrap().unwrap();
        assert!((frequency - 1.5).abs() < 1e-4);
    }

    #[test]
    fn flat_signal_has_no_dominant_frequency() {
        let mut analyzer = MotionAnalyzer::new();
        assert_eq!(analyzer.dominant_frequency(&[2.0; 16], 60.0).unwrap(), None);
        assert!(analyzer.dominant_frequency(&[1.0, 2.0], 60.0).is_err());
    }

    #[test]
    fn built_in_actions_are_rigid_and_seamless() {
        let library = ActionLibrary::new();
        let mut analyzer = MotionAnalyzer::new();
        for action in Action::ALL {
            let report = analyzer.analyse(&library.spec(action).unwrap(), 120).unwrap();
            assert_eq!(report.limb_drift.len(), 4);
            assert!(report.max_drift() < 1e-3, "{action}");
            assert_eq!(report.vertical_range.len(), JOINT_COUNT);
            match action.kind() {
                ActionKind::Periodic => assert!(report.seam_error.unwrap() < 1e-3),
                ActionKind::Transitional => assert!(report.seam_error.is_none()),
            }
        }
    }

    #[test]
    fn torso_frequency_locks_to_the_cycle() {
        let base = ActionLibrary::new().spec(Action::Walking).unwrap();
        let mut analyzer = MotionAnalyzer::new();
        for weight in [Weight::Light, Weight::Heavy] {
            let spec =
                modulation::apply(&base, &BodyProfile::new(Gender::Man, weight, Emotion::Sad))
                    .unwrap();
            let report = analyzer.analyse(&spec, 128).unwrap();
            let harmonic = report.dominant_frequency_hz.unwrap() * spec.timing;
            assert!(harmonic >= 1.0);
            assert!((harmonic - harmonic.round()).abs() < 1e-3);
        }
    }

    #[test]
    fn rejects_too_few_frames() {
        let spec = ActionLibrary::new().spec(Action::Bowing).unwrap();
        assert!(matches!(
            analyse(&spec, 2),
            Err(PldError::InvalidOptions(_))
        ));
    }
}
