use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    library::{ActionSpec, Motion, Posture},
    skeleton::{Articulation, Limb},
    PldError, Result,
};

/// Amplitude products are kept inside this band so modulated limbs stay
/// within a bounded multiple of their rest excursion.
const MIN_SCALE: f32 = 0.5;
const MAX_SCALE: f32 = 1.5;
const MAX_STRIDE: f32 = 1.0;
const MAX_ARM_SWING: f32 = 1.2;
/// Largest vertical excursion, as a fraction of leg length.
const MAX_VERTICAL: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Man,
    Woman,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    Light,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happy,
    Sad,
}

macro_rules! profile_attribute {
    ($ty:ident, $label:literal, $($variant:ident => $name:literal),+) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = PldError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(PldError::profile(format!(
                        concat!("unsupported ", $label, " `{}`"),
                        s
                    ))),
                }
            }
        }
    };
}

profile_attribute!(Gender, "gender", Man => "man", Woman => "woman");
profile_attribute!(Weight, "weight", Light => "light", Heavy => "heavy");
profile_attribute!(Emotion, "emotion", Happy => "happy", Sad => "sad");

/// Secondary attributes conveyed by the figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyProfile {
    pub gender: Gender,
    pub weight: Weight,
    pub emotion: Emotion,
}

impl Default for BodyProfile {
    fn default() -> Self {
        Self {
            gender: Gender::Man,
            weight: Weight::Light,
            emotion: Emotion::Happy,
        }
    }
}

impl BodyProfile {
    pub fn new(gender: Gender, weight: Weight, emotion: Emotion) -> Self {
        Self {
            gender,
            weight,
            emotion,
        }
    }

    /// Builds a profile from its textual attributes.
    pub fn parse(gender: &str, weight: &str, emotion: &str) -> Result<Self> {
        Ok(Self::new(gender.parse()?, weight.parse()?, emotion.parse()?))
    }

    /// Every supported combination.
    pub fn all() -> impl Iterator<Item = BodyProfile> {
        Gender::ALL.iter().flat_map(|gender| {
            Weight::ALL.iter().flat_map(move |weight| {
                Emotion::ALL
                    .iter()
                    .map(move |emotion| BodyProfile::new(*gender, *weight, *emotion))
            })
        })
    }
}

/// Multipliers and biases derived from a [`BodyProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Factors {
    /// Cycle frequency multiplier; cycle lengths are divided by it.
    pub tempo: f32,
    pub amplitude: f32,
    pub arm_swing: f32,
    pub vertical: f32,
    pub posture: Posture,
    pub shoulder_width: f32,
    pub hip_width: f32,
}

impl Factors {
    pub fn for_profile(profile: &BodyProfile) -> Self {
        let (shoulder_width, hip_width) = match profile.gender {
            Gender::Man => (1.10, 0.92),
            Gender::Woman => (0.92, 1.10),
        };
        let (weight_tempo, vertical, arm_swing) = match profile.weight {
            Weight::Heavy => (0.85, 1.40, 0.80),
            Weight::Light => (1.10, 0.80, 1.10),
        };
        let (emotion_tempo, amplitude, posture) = match profile.emotion {
            Emotion::Sad => (
                0.85,
                0.75,
                Posture {
                    trunk: 0.12,
                    head: 0.30,
                },
            ),
            Emotion::Happy => (
                1.05,
                1.15,
                Posture {
                    trunk: 0.0,
                    head: -0.10,
                },
            ),
        };

        Self {
            tempo: weight_tempo * emotion_tempo,
            amplitude,
            arm_swing,
            vertical,
            posture,
            shoulder_width,
            hip_width,
        }
    }
}

/// Derives the effective spec for `profile`. Pure: `spec` is left untouched
/// and the result is meant to be computed once per animation.
pub fn apply(spec: &ActionSpec, profile: &BodyProfile) -> Result<ActionSpec> {
    let factors = Factors::for_profile(profile);
    let mut effective = spec.clone();

    let mut dims = *spec.skeleton.dimensions();
    dims.shoulder_width *= factors.shoulder_width;
    dims.hip_width *= factors.hip_width;
    effective.skeleton = spec.skeleton.with_dimensions(dims)?;

    effective.timing = spec.timing / factors.tempo;
    effective.posture = Posture {
        trunk: spec.posture.trunk + factors.posture.trunk,
        head: spec.posture.head + factors.posture.head,
    };

    let amplitude = factors.amplitude.clamp(MIN_SCALE, MAX_SCALE);
    let swing = (factors.amplitude * factors.arm_swing).clamp(MIN_SCALE, MAX_SCALE);
    let vertical = factors.vertical.clamp(MIN_SCALE, MAX_SCALE);
    let max_lift = MAX_VERTICAL * dims.leg_length();

    effective.motion = match &spec.motion {
        Motion::Walking(gait) | Motion::Running(gait) => {
            let mut gait = *gait;
            gait.stride = (gait.stride * amplitude).min(MAX_STRIDE);
            gait.knee_flex *= amplitude;
            gait.arm_swing = (gait.arm_swing * swing).min(MAX_ARM_SWING);
            gait.elbow_swing *= swing;
            gait.bounce = (gait.bounce * vertical).min(max_lift);
            if matches!(spec.motion, Motion::Walking(_)) {
                Motion::Walking(gait)
            } else {
                Motion::Running(gait)
            }
        }
        Motion::JumpingUp(jump) | Motion::JumpingForward(jump) => {
            let mut jump = *jump;
            jump.height = (jump.height * amplitude).min(max_lift);
            // Heavier bodies sink deeper into take-off and landing.
            jump.crouch = (jump.crouch * vertical).min(MAX_SCALE);
            jump.arm_swing = (jump.arm_swing * swing).min(MAX_ARM_SWING);
            jump.tuck *= amplitude;
            if matches!(spec.motion, Motion::JumpingUp(_)) {
                Motion::JumpingUp(jump)
            } else {
                Motion::JumpingForward(jump)
            }
        }
        Motion::WavingHand(wave) => {
            let mut wave = *wave;
            wave.reach *= swing;
            Motion::WavingHand(wave)
        }
        Motion::TurningAround(turn) => {
            let mut turn = *turn;
            turn.arm_swing = (turn.arm_swing * swing).min(MAX_ARM_SWING);
            turn.bounce = (turn.bounce * vertical).min(max_lift);
            Motion::TurningAround(turn)
        }
        Motion::Keyframed(keyframes) => {
            let base = *keyframes.first();
            Motion::Keyframed(keyframes.map(|frame| exaggerate(&base, frame, amplitude)))
        }
    };
    effective.travel_per_cycle = spec.travel_per_cycle * amplitude;
    effective.prepare();

    tracing::debug!(
        action = %spec.action,
        gender = %profile.gender,
        weight = %profile.weight,
        emotion = %profile.emotion,
        timing = effective.timing,
        "modulated action spec"
    );
    Ok(effective)
}

/// Scales the joint-angle excursion of `frame` away from `base`. Whole-body
/// rotation and root offsets are left alone so rolls still complete.
fn exaggerate(base: &Articulation, frame: &Articulation, scale: f32) -> Articulation {
    let angle = |from: f32, to: f32| from + (to - from) * scale;
    let limb = |from: Limb, to: Limb| Limb::new(angle(from.upper, to.upper), angle(from.lower, to.lower));

    Articulation {
        trunk: angle(base.trunk, frame.trunk),
        neck: angle(base.neck, frame.neck),
        right_arm: limb(base.right_arm, frame.right_arm),
        left_arm: limb(base.left_arm, frame.left_arm),
        right_leg: limb(base.right_leg, frame.right_leg),
        left_leg: limb(base.left_leg, frame.left_leg),
        ..*frame
    }
}
