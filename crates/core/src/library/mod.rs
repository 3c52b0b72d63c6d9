//! Action library: how each supported action maps phase to pose.
//!
//! Periodic actions are closed-form angle generators, transitional actions
//! are keyframed joint angles. Both go through [`Skeleton::solve`] so every
//! limb keeps its segment lengths.

use std::{
    f32::consts::{PI, TAU},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    interpolate::{Easing, Keyframes},
    skeleton::{Articulation, BodyDimensions, Joint, Limb, Pose, Skeleton, View, JOINT_COUNT},
    PldError, Result,
};

/// Upper bound of the waving abduction search; the wrist reach grows
/// monotonically with abduction below it.
const MAX_WAVE_ABDUCTION: f32 = 0.8;
const WAVE_SOLVER_STEPS: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Walking,
    Running,
    JumpingUp,
    JumpingForward,
    WavingHand,
    Bowing,
    SittingDown,
    LyingDown,
    TurningAround,
    ForwardRolling,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::Walking,
        Action::Running,
        Action::JumpingUp,
        Action::JumpingForward,
        Action::WavingHand,
        Action::Bowing,
        Action::SittingDown,
        Action::LyingDown,
        Action::TurningAround,
        Action::ForwardRolling,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::Walking => "walking",
            Action::Running => "running",
            Action::JumpingUp => "jumping_up",
            Action::JumpingForward => "jumping_forward",
            Action::WavingHand => "waving_hand",
            Action::Bowing => "bowing",
            Action::SittingDown => "sitting_down",
            Action::LyingDown => "lying_down",
            Action::TurningAround => "turning_around",
            Action::ForwardRolling => "forward_rolling",
        }
    }

    pub fn kind(self) -> ActionKind {
        match self {
            Action::Walking
            | Action::Running
            | Action::JumpingUp
            | Action::JumpingForward
            | Action::WavingHand
            | Action::TurningAround => ActionKind::Periodic,
            Action::Bowing | Action::SittingDown | Action::LyingDown | Action::ForwardRolling => {
                ActionKind::Transitional
            }
        }
    }

    /// Viewing plane, which also fixes the joint labels for the action.
    pub fn view(self) -> View {
        match self {
            Action::WavingHand | Action::TurningAround => View::Frontal,
            _ => View::Sagittal,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = PldError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Action::ALL
            .into_iter()
            .find(|action| action.name() == wanted)
            .ok_or_else(|| PldError::UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Loops forever; phase wraps every cycle.
    Periodic,
    /// Bounded action played once (or looped when cyclic).
    Transitional,
}

/// Static offsets added to the spine and head of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Posture {
    pub trunk: f32,
    pub head: f32,
}

/// Walking and running parameters. Angles in radians, lengths in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gait {
    pub stride: f32,
    pub knee_flex: f32,
    pub stance_flex: f32,
    pub arm_swing: f32,
    pub elbow_flex: f32,
    pub elbow_swing: f32,
    pub lean: f32,
    /// Vertical excursion: settling at heel strike for walking, flight
    /// height for running.
    pub bounce: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jump {
    pub height: f32,
    pub crouch: f32,
    /// Scale on the back-swing and overhead reach of the arms.
    pub arm_swing: f32,
    /// Hip and knee tuck during flight.
    pub tuck: f32,
    pub lean: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Lateral wrist displacement from rest at the top of the wave.
    pub reach: f32,
    pub waves: u32,
    /// Forearm oscillation amplitude.
    pub wiggle: f32,
    /// Peak upper-arm abduction that produces `reach`; derived.
    pub abduction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub arm_swing: f32,
    pub bounce: f32,
    pub steps: u32,
}

/// Motion generator, one variant per action family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Motion {
    Walking(Gait),
    Running(Gait),
    JumpingUp(Jump),
    JumpingForward(Jump),
    WavingHand(Wave),
    TurningAround(Turn),
    Keyframed(Keyframes<Articulation>),
}

/// Everything needed to evaluate one action for one body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    pub action: Action,
    /// Cycle length of periodic actions, duration of transitional ones, in
    /// seconds.
    pub timing: f32,
    pub skeleton: Skeleton,
    pub posture: Posture,
    pub motion: Motion,
    /// Transitional actions wrap instead of holding the last keyframe.
    pub cyclic: bool,
    /// Forward distance covered per cycle, reported to presentation layers.
    /// Derived from the keyframes for keyframed motions.
    pub travel_per_cycle: f32,
}

impl ActionSpec {
    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn cycle_length(&self) -> f32 {
        self.timing
    }

    pub fn joint_names(&self) -> [&'static str; JOINT_COUNT] {
        self.skeleton.joint_names()
    }

    pub fn rest_pose(&self) -> Pose {
        self.skeleton.rest_pose()
    }

    /// Pose at `phase`. Defined for every input: periodic actions wrap
    /// phases outside `[0, 1]`, transitional ones clamp (or wrap when
    /// cyclic), and non-finite phases read as 0.
    ///
    /// Poses stay in place: forward travel is reported by
    /// [`ActionSpec::advance`] instead.
    pub fn evaluate(&self, phase: f32) -> Pose {
        let mut articulation = self.articulation(phase);
        articulation.trunk += self.posture.trunk;
        articulation.neck += self.posture.head;
        articulation.advance = 0.0;
        self.skeleton.solve(&articulation)
    }

    /// Forward distance covered between the start of a cycle and `phase`.
    pub fn advance(&self, phase: f32) -> f32 {
        let phase = if phase.is_finite() { phase } else { 0.0 };
        match &self.motion {
            Motion::Keyframed(keyframes) => {
                keyframes.sample(phase, self.cyclic).advance - keyframes.first().advance
            }
            _ => self.travel_per_cycle * phase.clamp(0.0, 1.0),
        }
    }

    fn articulation(&self, phase: f32) -> Articulation {
        let phase = if phase.is_finite() { phase } else { 0.0 };
        let cycle_phase = if (0.0..=1.0).contains(&phase) {
            phase
        } else {
            phase.rem_euclid(1.0)
        };
        let rest = self.skeleton.rest_articulation();

        match &self.motion {
            Motion::Walking(gait) => walk(rest, gait, cycle_phase),
            Motion::Running(gait) => run(rest, gait, cycle_phase),
            Motion::JumpingUp(jump) | Motion::JumpingForward(jump) => {
                leap(rest, jump, cycle_phase)
            }
            Motion::WavingHand(wave) => wave_arm(rest, wave, wave.abduction, cycle_phase),
            Motion::TurningAround(turn) => turn_around(rest, turn, cycle_phase),
            Motion::Keyframed(keyframes) => keyframes.sample(phase, self.cyclic),
        }
    }

    /// Recomputes values derived from other parameters. Must run after any
    /// change to the skeleton, posture or motion parameters.
    pub(crate) fn prepare(&mut self) {
        let skeleton = self.skeleton;
        let posture = self.posture;
        match &mut self.motion {
            Motion::WavingHand(wave) => calibrate_wave(&skeleton, posture, wave),
            Motion::Keyframed(keyframes) => {
                self.travel_per_cycle = keyframes.last().advance - keyframes.first().advance;
            }
            _ => {}
        }
    }
}

/// Builds base (unmodulated) action specs for a given body.
#[derive(Debug, Clone, Default)]
pub struct ActionLibrary {
    dims: BodyDimensions,
}

impl ActionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimensions(dims: BodyDimensions) -> Result<Self> {
        dims.validate()?;
        Ok(Self { dims })
    }

    pub fn dimensions(&self) -> &BodyDimensions {
        &self.dims
    }

    /// Unmodulated spec of `action`, played once.
    pub fn spec(&self, action: Action) -> Result<ActionSpec> {
        let skeleton = Skeleton::new(self.dims, action.view())?;
        let rest = skeleton.rest_articulation();

        let (timing, motion, travel_per_cycle) = match action {
            Action::Walking => (1.1, Motion::Walking(WALK), 1.4),
            Action::Running => (0.7, Motion::Running(RUN), 2.6),
            Action::JumpingUp => (1.2, Motion::JumpingUp(JUMP_UP), 0.0),
            Action::JumpingForward => (1.3, Motion::JumpingForward(JUMP_FORWARD), 0.9),
            Action::WavingHand => (2.0, Motion::WavingHand(WAVE), 0.0),
            Action::TurningAround => (2.5, Motion::TurningAround(TURN), 0.0),
            Action::Bowing => (3.0, Motion::Keyframed(bowing(rest)?), 0.0),
            Action::SittingDown => (2.5, Motion::Keyframed(sitting_down(rest)?), 0.0),
            Action::LyingDown => (4.0, Motion::Keyframed(lying_down(rest)?), 0.0),
            Action::ForwardRolling => (2.4, Motion::Keyframed(forward_rolling(rest)?), 0.0),
        };

        let mut spec = ActionSpec {
            action,
            timing,
            skeleton,
            posture: Posture::default(),
            motion,
            cyclic: false,
            travel_per_cycle,
        };
        spec.prepare();
        Ok(spec)
    }

    /// Evaluates the unmodulated action `name` at `phase`.
    pub fn evaluate(&self, name: &str, phase: f32) -> Result<Pose> {
        let action: Action = name.parse()?;
        Ok(self.spec(action)?.evaluate(phase))
    }
}

const WALK: Gait = Gait {
    stride: 0.42,
    knee_flex: 0.95,
    stance_flex: 0.08,
    arm_swing: 0.38,
    elbow_flex: 0.25,
    elbow_swing: 0.25,
    lean: 0.05,
    bounce: 0.025,
};

const RUN: Gait = Gait {
    stride: 0.68,
    knee_flex: 1.75,
    stance_flex: 0.22,
    arm_swing: 0.75,
    elbow_flex: 1.45,
    elbow_swing: 0.2,
    lean: 0.18,
    bounce: 0.06,
};

const JUMP_UP: Jump = Jump {
    height: 0.35,
    crouch: 1.0,
    arm_swing: 1.0,
    tuck: 0.15,
    lean: 0.0,
};

const JUMP_FORWARD: Jump = Jump {
    height: 0.3,
    crouch: 1.0,
    arm_swing: 1.0,
    tuck: 0.7,
    lean: 0.25,
};

const WAVE: Wave = Wave {
    reach: 0.25,
    waves: 3,
    wiggle: 0.35,
    abduction: 0.0,
};

const TURN: Turn = Turn {
    arm_swing: 0.12,
    bounce: 0.02,
    steps: 4,
};

/// Raised-cosine bump of half-width `width` centred on `center`.
fn bump(p: f32, center: f32, width: f32) -> f32 {
    let offset = (p - center) / width;
    if offset.abs() < 1.0 {
        (1.0 + (offset * PI).cos()) * 0.5
    } else {
        0.0
    }
}

/// Swing-phase knee profile: peaks when the thigh passes under the hip.
fn swing(cos: f32) -> f32 {
    let s = (1.0 + cos) * 0.5;
    s * s
}

fn stride_limbs(rest: &mut Articulation, gait: &Gait, omega: f32) {
    let (sin, cos) = omega.sin_cos();
    rest.right_leg = Limb::new(
        gait.stride * sin,
        -(gait.stance_flex + gait.knee_flex * swing(cos)),
    );
    rest.left_leg = Limb::new(
        -gait.stride * sin,
        -(gait.stance_flex + gait.knee_flex * swing(-cos)),
    );
    // Arms counter-swing against the leg on the same side.
    rest.right_arm = Limb::new(
        -gait.arm_swing * sin,
        gait.elbow_flex + gait.elbow_swing * (1.0 - sin) * 0.5,
    );
    rest.left_arm = Limb::new(
        gait.arm_swing * sin,
        gait.elbow_flex + gait.elbow_swing * (1.0 + sin) * 0.5,
    );
    rest.trunk = gait.lean;
}

fn walk(mut rest: Articulation, gait: &Gait, phase: f32) -> Articulation {
    let omega = TAU * phase;
    stride_limbs(&mut rest, gait, omega);
    // Heel strikes at a quarter and three quarters of the cycle.
    let settle = (1.0 + (2.0 * omega - PI).cos()) * 0.5;
    rest.lift = -gait.bounce * settle;
    rest
}

fn run(mut rest: Articulation, gait: &Gait, phase: f32) -> Articulation {
    let omega = TAU * phase;
    stride_limbs(&mut rest, gait, omega);
    rest.lift = gait.bounce * (1.0 + (2.0 * omega).cos()) * 0.5;
    rest
}

fn leap(mut rest: Articulation, jump: &Jump, phase: f32) -> Articulation {
    let crouch = jump.crouch * (bump(phase, 0.2, 0.15) + bump(phase, 0.8, 0.15));
    let flight = if phase > 0.35 && phase < 0.65 {
        (PI * (phase - 0.35) / 0.3).sin()
    } else {
        0.0
    };

    // Thigh and shin fold symmetrically so the ankle stays under the hip.
    let hip = 0.9 * crouch + jump.tuck * flight;
    let knee = -1.8 * crouch - 1.5 * jump.tuck * flight;
    let leg = Limb::new(hip, knee);
    rest.right_leg = leg;
    rest.left_leg = leg;

    let arm = Limb::new(
        jump.arm_swing * (-0.8 * crouch + 2.6 * flight),
        0.2 * crouch + 0.3 * flight,
    );
    rest.right_arm = arm;
    rest.left_arm = arm;

    rest.trunk = 0.5 * crouch + jump.lean * (crouch + flight);
    rest.neck = -0.15 * flight;
    rest.lift = jump.height * flight;
    rest
}

fn wave_arm(mut rest: Articulation, wave: &Wave, abduction: f32, phase: f32) -> Articulation {
    let omega = TAU * phase;
    let envelope = (1.0 - omega.cos()) * 0.5;
    let raise = abduction * envelope;
    let wiggle = wave.wiggle * (wave.waves as f32 * omega).sin() * envelope;

    // The right arm abducts toward -x in the frontal view.
    rest.right_arm.upper -= raise;
    rest.right_arm.lower -= raise + wiggle;
    rest
}

fn turn_around(mut rest: Articulation, turn: &Turn, phase: f32) -> Articulation {
    let omega = TAU * phase;
    let lateral = omega.cos();
    let sway = turn.arm_swing * (2.0 * omega).sin();

    rest.lateral = lateral;
    rest.right_arm.upper = (rest.right_arm.upper - sway) * lateral;
    rest.left_arm.upper = (rest.left_arm.upper - sway) * lateral;
    rest.lift = -turn.bounce * (1.0 - (turn.steps as f32 * omega).cos()) * 0.5;
    rest
}

/// Finds the abduction whose wave peak displaces the wrist by `wave.reach`.
/// Reaches beyond what the arm can produce are clamped.
fn calibrate_wave(skeleton: &Skeleton, posture: Posture, wave: &mut Wave) {
    let mut base = skeleton.rest_articulation();
    base.trunk += posture.trunk;
    base.neck += posture.head;

    let shape = *wave;
    let wrist_x = |abduction: f32| {
        let articulation = wave_arm(base, &shape, abduction, 0.5);
        skeleton.solve(&articulation).get(Joint::RightWrist).x
    };
    let rest_x = wrist_x(0.0);
    let reach_at = |abduction: f32| (wrist_x(abduction) - rest_x).abs();

    let target = shape.reach.clamp(0.0, reach_at(MAX_WAVE_ABDUCTION));
    let (mut low, mut high) = (0.0_f32, MAX_WAVE_ABDUCTION);
    for _ in 0..WAVE_SOLVER_STEPS {
        let mid = 0.5 * (low + high);
        if reach_at(mid) < target {
            low = mid;
        } else {
            high = mid;
        }
    }
    wave.reach = target;
    wave.abduction = 0.5 * (low + high);
}

fn keyed(rest: Articulation, edit: impl FnOnce(&mut Articulation)) -> Articulation {
    let mut articulation = rest;
    edit(&mut articulation);
    articulation
}

fn arms(a: &mut Articulation, limb: Limb) {
    a.right_arm = limb;
    a.left_arm = limb;
}

fn legs(a: &mut Articulation, limb: Limb) {
    a.right_leg = limb;
    a.left_leg = limb;
}

fn bowing(rest: Articulation) -> Result<Keyframes<Articulation>> {
    let bow = keyed(rest, |a| {
        a.trunk = 1.05;
        a.neck = 0.35;
        arms(a, Limb::new(0.0, 0.1));
    });
    Keyframes::new(
        vec![(0.0, rest), (0.4, bow), (0.6, bow), (1.0, rest)],
        Easing::Cosine,
    )
}

fn sitting_down(rest: Articulation) -> Result<Keyframes<Articulation>> {
    let lowering = keyed(rest, |a| {
        a.trunk = 0.55;
        a.neck = 0.1;
        arms(a, Limb::new(0.6, 0.3));
        legs(a, Limb::new(0.8, -1.1));
    });
    let seated = keyed(rest, |a| {
        a.trunk = 0.15;
        arms(a, Limb::new(0.35, 1.0));
        legs(a, Limb::new(1.5, -1.5));
    });
    Keyframes::new(
        vec![(0.0, rest), (0.45, lowering), (1.0, seated)],
        Easing::Smoothstep,
    )
}

fn lying_down(rest: Articulation) -> Result<Keyframes<Articulation>> {
    let squat = keyed(rest, |a| {
        a.trunk = 0.6;
        a.neck = 0.2;
        arms(a, Limb::new(0.9, 0.3));
        legs(a, Limb::new(1.9, -2.3));
    });
    let sitting = keyed(rest, |a| {
        a.trunk = -0.15;
        a.neck = 0.1;
        arms(a, Limb::new(-0.5, 0.0));
        legs(a, Limb::new(1.45, -0.05));
    });
    let supine = keyed(rest, |a| {
        a.rotation = -1.45;
        a.trunk = -0.1;
        a.neck = 0.1;
        arms(a, Limb::new(0.05, 0.0));
        legs(a, Limb::new(0.05, 0.0));
    });
    Keyframes::new(
        vec![(0.0, rest), (0.3, squat), (0.6, sitting), (1.0, supine)],
        Easing::Smoothstep,
    )
}

fn forward_rolling(rest: Articulation) -> Result<Keyframes<Articulation>> {
    let tuck = keyed(rest, |a| {
        a.trunk = 1.0;
        a.neck = 0.7;
        arms(a, Limb::new(1.6, 0.4));
        legs(a, Limb::new(2.0, -2.4));
    });
    let rolled = |rotation: f32, advance: f32| {
        keyed(tuck, |a| {
            a.rotation = rotation;
            a.advance = advance;
        })
    };
    let finish = keyed(rest, |a| {
        a.rotation = TAU;
        a.advance = 1.35;
    });
    Keyframes::new(
        vec![
            (0.0, rest),
            (0.25, tuck),
            (0.45, rolled(1.6, 0.5)),
            (0.65, rolled(3.2, 0.9)),
            (0.8, rolled(4.8, 1.2)),
            (0.9, rolled(TAU, 1.3)),
            (1.0, finish),
        ],
        Easing::Smoothstep,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::LIMB_CHAINS;

    const EPS: f32 = 1e-3;

    fn library() -> ActionLibrary {
        ActionLibrary::new()
    }

    #[test]
    fn parses_every_action_name() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>().unwrap(), action);
        }
        assert_eq!("Jumping-Up".parse::<Action>().unwrap(), Action::JumpingUp);
        let err = "moonwalk".parse::<Action>().unwrap_err();
        assert!(matches!(err, PldError::UnknownAction(name) if name == "moonwalk"));
    }

    #[test]
    fn periodic_actions_loop_seamlessly() {
        let library = library();
        for action in Action::ALL {
            if action.kind() != ActionKind::Periodic {
                continue;
            }
            let spec = library.spec(action).unwrap();
            let start = spec.evaluate(0.0);
            let end = spec.evaluate(1.0);
            assert!(start.max_deviation(&end) < EPS, "{action} pops on wrap");
        }
    }

    #[test]
    fn limbs_stay_rigid_for_every_action() {
        let library = library();
        let dims = *library.dimensions();
        for action in Action::ALL {
            let spec = library.spec(action).unwrap();
            for step in 0..=200 {
                let pose = spec.evaluate(step as f32 / 200.0);
                for (name, chain) in LIMB_CHAINS {
                    let (upper, lower) = pose.segment_lengths(chain);
                    let (want_upper, want_lower) = if name.ends_with("arm") {
                        (dims.upper_arm, dims.forearm)
                    } else {
                        (dims.thigh, dims.shin)
                    };
                    assert!((upper - want_upper).abs() < EPS, "{action} {name} upper");
                    assert!((lower - want_lower).abs() < EPS, "{action} {name} lower");
                }
            }
        }
    }

    #[test]
    fn motion_is_continuous_in_phase() {
        // Largest joint displacement allowed per thousandth of a cycle.
        const MAX_STEP: f32 = 0.03;
        let library = library();
        for action in Action::ALL {
            let spec = library.spec(action).unwrap();
            let mut previous = spec.evaluate(0.0);
            for step in 1..=1000 {
                let pose = spec.evaluate(step as f32 / 1000.0);
                assert!(
                    pose.max_deviation(&previous) < MAX_STEP,
                    "{action} jumps near phase {step}"
                );
                previous = pose;
            }
        }
    }

    #[test]
    fn transitional_actions_clamp_to_end_keyframes() {
        let library = library();
        for action in [
            Action::Bowing,
            Action::SittingDown,
            Action::LyingDown,
            Action::ForwardRolling,
        ] {
            let spec = library.spec(action).unwrap();
            let Motion::Keyframed(keyframes) = &spec.motion else {
                panic!("{action} should be keyframed");
            };
            let first = spec.skeleton.solve(keyframes.first());
            let last = spec.skeleton.solve(keyframes.last());

            assert_eq!(spec.evaluate(0.0), first);
            assert_eq!(spec.evaluate(-2.0), first);
            assert_eq!(spec.evaluate(1.0), last);
            assert_eq!(spec.evaluate(3.5), last);
        }
    }

    #[test]
    fn evaluation_is_total() {
        let library = library();
        for action in Action::ALL {
            let spec = library.spec(action).unwrap();
            for phase in [f32::NAN, f32::INFINITY, -f32::INFINITY, -0.3, 1.7, 42.0] {
                let pose = spec.evaluate(phase);
                assert!(pose.points().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
            }
        }
    }

    #[test]
    fn periodic_phases_outside_range_wrap() {
        let spec = library().spec(Action::Walking).unwrap();
        let wrapped = spec.evaluate(1.3);
        let direct = spec.evaluate(0.3);
        assert!(wrapped.max_deviation(&direct) < EPS);
    }

    #[test]
    fn waving_starts_at_rest_and_reaches_configured_amplitude() {
        let spec = library().spec(Action::WavingHand).unwrap();
        let Motion::WavingHand(wave) = spec.motion else {
            panic!("waving spec should carry wave parameters");
        };
        let rest = spec.rest_pose().get(Joint::RightWrist);

        assert!(spec.evaluate(0.0).get(Joint::RightWrist).distance(rest) < 1e-5);
        let peak = spec.evaluate(0.5).get(Joint::RightWrist);
        assert!(((peak.x - rest.x).abs() - wave.reach).abs() < 1e-3);
        assert!(peak.y > rest.y);
    }

    #[test]
    fn jumping_up_leaves_the_ground() {
        let spec = library().spec(Action::JumpingUp).unwrap();
        let ground = spec.skeleton.ground();
        assert!(spec.evaluate(0.5).lowest() > ground + 0.2);
        assert!((spec.evaluate(0.0).lowest() - ground).abs() < EPS);
    }

    #[test]
    fn sitting_lowers_the_hips() {
        let spec = library().spec(Action::SittingDown).unwrap();
        let standing = spec.evaluate(0.0).get(Joint::Torso).y;
        let seated = spec.evaluate(1.0).get(Joint::Torso).y;
        assert!(seated < standing - 0.3);
    }

    #[test]
    fn forward_roll_ends_upright_in_place_and_reports_its_travel() {
        let spec = library().spec(Action::ForwardRolling).unwrap();
        let start = spec.evaluate(0.0);
        let end = spec.evaluate(1.0);
        let upside_down = spec.evaluate(0.65);

        assert!(end.get(Joint::Head).y > end.get(Joint::Torso).y);
        assert!(upside_down.get(Joint::Head).y < upside_down.get(Joint::Torso).y);
        assert!(end.max_deviation(&start) < EPS);

        assert!((spec.travel_per_cycle - 1.35).abs() < 1e-6);
        assert_eq!(spec.advance(0.0), 0.0);
        assert!((spec.advance(1.0) - spec.travel_per_cycle).abs() < 1e-6);
        assert!(spec.advance(0.5) > 0.0 && spec.advance(0.5) < spec.travel_per_cycle);
    }

    #[test]
    fn stationary_actions_do_not_travel() {
        let library = library();
        for action in [Action::Bowing, Action::SittingDown, Action::WavingHand] {
            let spec = library.spec(action).unwrap();
            assert_eq!(spec.travel_per_cycle, 0.0);
            assert_eq!(spec.advance(0.7), 0.0);
        }
        let walking = library.spec(Action::Walking).unwrap();
        assert!((walking.advance(0.5) - 0.5 * walking.travel_per_cycle).abs() < 1e-6);
    }

    #[test]
    fn library_evaluates_by_name() {
        let library = library();
        let pose = library.evaluate("bowing", 0.5).unwrap();
        assert!(pose.get(Joint::Head).x > 0.3);
        assert!(library.evaluate("cartwheel", 0.5).is_err());
    }

    #[test]
    fn library_rejects_degenerate_dimensions() {
        let dims = BodyDimensions {
            thigh: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            ActionLibrary::with_dimensions(dims),
            Err(PldError::DegenerateChain { segment: "thigh", .. })
        ));
    }
}
