use serde::{Deserialize, Serialize};

use crate::{
    config::AnimationOptions,
    library::{Action, ActionKind, ActionLibrary, ActionSpec, Motion},
    modulation::{self, BodyProfile},
    skeleton::{Joint, Pose, JOINT_COUNT},
    Result,
};

/// Elapsed-time accumulator. The only mutable state of an animation.
///
/// Kept in `f64` so frame-sized deltas still register after days of looping.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnimationClock {
    pub time_seconds: f64,
}

impl AnimationClock {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    /// Negative and non-finite deltas leave the clock where it is.
    pub fn advance(&mut self, delta: f32) {
        if delta.is_finite() {
            self.time_seconds += f64::from(delta.max(0.0));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationStatus {
    Idle,
    Running,
    Paused,
    /// Reached only by transitional actions played without looping.
    Completed,
}

/// Clock plus the phase and lifecycle derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    pub clock: AnimationClock,
    pub phase: f32,
    pub status: AnimationStatus,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            clock: AnimationClock::default(),
            phase: 0.0,
            status: AnimationStatus::Idle,
        }
    }
}

impl AnimationState {
    pub fn elapsed(&self) -> f32 {
        self.clock.time_seconds as f32
    }

    /// Elapsed time measured in cycles (or durations) of `timing` seconds.
    fn cycles(&self, timing: f32) -> f64 {
        self.clock.time_seconds / f64::from(timing)
    }
}

/// Builds a ready-to-run animation for the action called `action`.
///
/// All validation happens here; once this succeeds, ticking and reading
/// positions cannot fail.
pub fn create_animation(
    action: &str,
    profile: BodyProfile,
    options: AnimationOptions,
) -> Result<Animation> {
    Animation::new(action.parse()?, profile, options)
}

/// One running point-light figure.
#[derive(Debug, Clone)]
pub struct Animation {
    spec: ActionSpec,
    profile: BodyProfile,
    options: AnimationOptions,
    state: AnimationState,
}

impl Animation {
    pub fn new(action: Action, profile: BodyProfile, options: AnimationOptions) -> Result<Self> {
        options.validate()?;

        let library = match options.dimensions {
            Some(dims) => ActionLibrary::with_dimensions(dims)?,
            None => ActionLibrary::new(),
        };
        let base = library.spec(action)?;
        let mut spec = modulation::apply(&base, &profile)?;
        if let Some(seconds) = options.duration_override {
            spec.timing = seconds;
        }
        if options.looping && spec.kind() == ActionKind::Transitional {
            // Actions whose posture ends away from the start play back to it.
            let seam = spec.evaluate(0.0).max_deviation(&spec.evaluate(1.0));
            if seam > SEAM_TOLERANCE {
                if let Motion::Keyframed(keyframes) = &spec.motion {
                    spec.motion = Motion::Keyframed(keyframes.there_and_back());
                    spec.timing *= 2.0;
                    spec.prepare();
                }
            }
            spec.cyclic = true;
        }

        tracing::debug!(
            action = %action,
            kind = ?spec.kind(),
            timing = spec.timing,
            looping = options.looping,
            "created animation"
        );

        Ok(Self {
            spec,
            profile,
            options,
            state: AnimationState::default(),
        })
    }

    pub fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    pub fn action(&self) -> Action {
        self.spec.action
    }

    pub fn profile(&self) -> &BodyProfile {
        &self.profile
    }

    pub fn options(&self) -> &AnimationOptions {
        &self.options
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn status(&self) -> AnimationStatus {
        self.state.status
    }

    pub fn phase(&self) -> f32 {
        self.state.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.state.elapsed()
    }

    pub fn joint_names(&self) -> [&'static str; JOINT_COUNT] {
        self.spec.joint_names()
    }

    /// Rest pose of the modulated skeleton.
    pub fn rest_pose(&self) -> Pose {
        self.spec.rest_pose()
    }

    /// Seconds between two frames at the configured frame rate.
    pub fn frame_interval(&self) -> f32 {
        1.0 / self.options.fps
    }

    /// Advances the clock by `dt` seconds. An idle animation starts running;
    /// paused and completed animations ignore the call.
    pub fn tick(&mut self, dt: f32) {
        match self.state.status {
            AnimationStatus::Paused | AnimationStatus::Completed => return,
            AnimationStatus::Idle => self.state.status = AnimationStatus::Running,
            AnimationStatus::Running => {}
        }

        self.state.clock.advance(dt);
        self.update_phase();
    }

    /// Advances by exactly one frame.
    pub fn step(&mut self) {
        self.tick(self.frame_interval());
    }

    pub fn start(&mut self) {
        if self.state.status == AnimationStatus::Idle {
            self.state.status = AnimationStatus::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.state.status == AnimationStatus::Running {
            self.state.status = AnimationStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state.status == AnimationStatus::Paused {
            self.state.status = AnimationStatus::Running;
        }
    }

    /// Rewinds to the first frame and returns to idle.
    pub fn reset(&mut self) {
        self.state = AnimationState::default();
    }

    pub fn current_pose(&self) -> Pose {
        self.spec.evaluate(self.state.phase)
    }

    /// Fifteen `(x, y)` pairs in joint order, in body space.
    pub fn current_positions(&self) -> Vec<(f32, f32)> {
        self.current_pose().to_pairs()
    }

    pub fn position(&self, joint: Joint) -> (f32, f32) {
        let point = self.current_pose().get(joint);
        (point.x, point.y)
    }

    /// Forward distance covered so far. Poses stay in place for every
    /// action; presentation layers may add this offset.
    pub fn travel(&self) -> f32 {
        let phase = self.state.phase;
        let completed = if self.spec.kind() == ActionKind::Transitional && !self.spec.cyclic {
            0.0
        } else {
            (self.state.cycles(self.spec.timing) - f64::from(phase)).round()
        };
        (completed * f64::from(self.spec.travel_per_cycle)) as f32 + self.spec.advance(phase)
    }

    /// Steps `count` frames and collects the pose after each one.
    pub fn frames(&mut self, count: usize) -> Vec<Pose> {
        (0..count)
            .map(|_| {
                self.step();
                self.current_pose()
            })
            .collect()
    }

    fn update_phase(&mut self) {
        let cycles = self.state.cycles(self.spec.timing);

        match self.spec.kind() {
            ActionKind::Periodic => self.state.phase = wrap(cycles),
            ActionKind::Transitional if self.spec.cyclic => self.state.phase = wrap(cycles),
            ActionKind::Transitional => {
                let phase = cycles.min(1.0) as f32;
                self.state.phase = phase;
                if phase >= 1.0 {
                    let elapsed = self.state.elapsed();
                    self.state.status = AnimationStatus::Completed;
                    tracing::debug!(action = %self.spec.action, elapsed, "animation completed");
                }
            }
        }
    }
}

/// Largest joint mismatch tolerated between the first and last keyframe of
/// an action before looping needs a return trip.
const SEAM_TOLERANCE: f32 = 1e-3;

fn wrap(cycles: f64) -> f32 {
    let phase = cycles.rem_euclid(1.0) as f32;
    if phase >= 1.0 {
        0.0
    } else {
        phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        modulation::{Emotion, Gender, Weight},
        PldError,
    };

    fn happy_light_woman() -> BodyProfile {
        BodyProfile::new(Gender::Woman, Weight::Light, Emotion::Happy)
    }

    #[test]
    fn clock_ignores_negative_and_non_finite_deltas() {
        let mut clock = AnimationClock::default();
        clock.advance(0.5);
        clock.advance(-3.0);
        clock.advance(f32::NAN);
        clock.advance(f32::INFINITY);
        assert_eq!(clock.time_seconds, 0.5);
        clock.reset();
        assert_eq!(clock.time_seconds, 0.0);
    }

    #[test]
    fn waving_scenario() {
        let mut animation = create_animation(
            "waving_hand",
            happy_light_woman(),
            AnimationOptions::default().with_fps(30.0),
        )
        .unwrap();
        let rest = animation.rest_pose().get(Joint::RightWrist);

        animation.tick(0.0);
        assert_eq!(animation.status(), AnimationStatus::Running);
        let (x, y) = animation.position(Joint::RightWrist);
        assert!((x - rest.x).abs() < 1e-5 && (y - rest.y).abs() < 1e-5);

        let Motion::WavingHand(wave) = animation.spec().motion else {
            panic!("waving spec should carry wave parameters");
        };
        animation.tick(animation.spec().cycle_length() * 0.5);
        let (x, _) = animation.position(Joint::RightWrist);
        let displacement = (x - rest.x).abs();
        assert!((displacement - wave.reach).abs() <= 0.05 * wave.reach);
    }

    #[test]
    fn sitting_down_completes_and_holds() {
        let mut animation = create_animation(
            "sitting_down",
            BodyProfile::default(),
            AnimationOptions::default().looping(false),
        )
        .unwrap();
        let duration = animation.spec().cycle_length();

        animation.tick(duration * 0.5);
        assert_eq!(animation.status(), AnimationStatus::Running);
        animation.tick(duration);
        assert_eq!(animation.status(), AnimationStatus::Completed);
        assert_eq!(animation.phase(), 1.0);

        let held = animation.current_positions();
        animation.tick(1.0);
        animation.tick(0.25);
        assert_eq!(animation.current_positions(), held);
        assert_eq!(animation.status(), AnimationStatus::Completed);
    }

    #[test]
    fn looping_sit_returns_to_standing() {
        let mut animation = create_animation(
            "sitting_down",
            BodyProfile::default(),
            AnimationOptions::default().looping(true),
        )
        .unwrap();
        let standing = animation.current_pose();
        let cycle = animation.spec().cycle_length();

        animation.tick(cycle * 0.5);
        let seated = animation.current_pose();
        assert!(seated.get(Joint::Torso).y < standing.get(Joint::Torso).y - 0.3);

        animation.tick(cycle * 0.5);
        assert_eq!(animation.status(), AnimationStatus::Running);
        assert!(animation.current_pose().max_deviation(&standing) < 1e-3);
    }

    #[test]
    fn looping_roll_wraps_without_reversing() {
        let animation = create_animation(
            "forward_rolling",
            BodyProfile::default(),
            AnimationOptions::default().looping(true),
        )
        .unwrap();
        let base = ActionLibrary::new().spec(Action::ForwardRolling).unwrap();
        let Motion::Keyframed(keyframes) = &animation.spec().motion else {
            panic!("rolling should be keyframed");
        };
        let Motion::Keyframed(base_keyframes) = &base.motion else {
            panic!("rolling should be keyframed");
        };
        assert_eq!(keyframes.frames().len(), base_keyframes.frames().len());
        assert!(animation.spec().cyclic);
    }

    #[test]
    fn rolling_reports_travel_without_moving_the_pose() {
        let mut looped = create_animation(
            "forward_rolling",
            BodyProfile::default(),
            AnimationOptions::default().looping(true),
        )
        .unwrap();
        let per_roll = looped.spec().travel_per_cycle;
        let cycle = looped.spec().cycle_length();
        assert!(per_roll > 1.0);

        looped.tick(cycle * 0.999);
        let before_wrap = looped.current_pose();
        let travel_before = looped.travel();
        looped.tick(cycle * 0.002);
        assert!(looped.current_pose().max_deviation(&before_wrap) < 0.05);
        assert!((looped.travel() - travel_before).abs() < 0.01);

        looped.tick(cycle * 0.499);
        let expected = per_roll + looped.spec().advance(looped.phase());
        assert!((looped.travel() - expected).abs() < 1e-3);

        let mut once = create_animation(
            "forward_rolling",
            BodyProfile::default(),
            AnimationOptions::default(),
        )
        .unwrap();
        once.tick(cycle * 3.0);
        assert_eq!(once.status(), AnimationStatus::Completed);
        assert!((once.travel() - per_roll).abs() < 1e-6);
        let start = once.spec().evaluate(0.0);
        assert!(once.current_pose().max_deviation(&start) < 1e-3);
    }

    #[test]
    fn phase_keeps_resolution_after_days_of_looping() {
        let mut animation = create_animation(
            "walking",
            BodyProfile::default(),
            AnimationOptions::default().with_fps(60.0).with_duration(4.0),
        )
        .unwrap();
        animation.tick(259_200.0);
        let before = animation.phase();
        for _ in 0..60 {
            animation.step();
        }
        let advanced = (animation.phase() - before).rem_euclid(1.0);
        let expected = 60.0 / 60.0 / 4.0;
        assert!((advanced - expected).abs() < 1e-4, "advanced {advanced}");

        let mut previous = animation.phase();
        for _ in 0..10 {
            animation.step();
            assert!(animation.phase() != previous);
            previous = animation.phase();
        }
    }

    #[test]
    fn reads_are_idempotent_and_have_fifteen_entries() {
        for action in Action::ALL {
            let mut animation =
                Animation::new(action, happy_light_woman(), AnimationOptions::default()).unwrap();
            for _ in 0..90 {
                animation.step();
                let first = animation.current_positions();
                let second = animation.current_positions();
                assert_eq!(first.len(), JOINT_COUNT);
                assert_eq!(first, second);
            }
            assert_eq!(animation.joint_names(), action.view().joint_names());
        }
    }

    #[test]
    fn periodic_phase_wraps_with_elapsed_time() {
        let mut animation = create_animation(
            "walking",
            BodyProfile::default(),
            AnimationOptions::default().with_duration(2.0),
        )
        .unwrap();
        animation.tick(5.0);
        assert!((animation.phase() - 0.5).abs() < 1e-5);
        assert_eq!(animation.status(), AnimationStatus::Running);
        assert!((animation.travel() - 2.5 * animation.spec().travel_per_cycle).abs() < 1e-4);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut animation =
            create_animation("running", BodyProfile::default(), AnimationOptions::default())
                .unwrap();
        animation.tick(0.1);
        animation.pause();
        let frozen = animation.current_positions();
        animation.tick(0.2);
        assert_eq!(animation.status(), AnimationStatus::Paused);
        assert_eq!(animation.current_positions(), frozen);
        assert_eq!(animation.elapsed(), 0.1);

        animation.resume();
        animation.tick(0.2);
        assert!((animation.elapsed() - 0.3).abs() < 1e-6);

        animation.reset();
        assert_eq!(animation.status(), AnimationStatus::Idle);
        assert_eq!(animation.phase(), 0.0);
    }

    #[test]
    fn frames_step_at_the_configured_rate() {
        let mut animation = create_animation(
            "jumping_up",
            BodyProfile::default(),
            AnimationOptions::default().with_fps(25.0),
        )
        .unwrap();
        let frames = animation.frames(50);
        assert_eq!(frames.len(), 50);
        assert!((animation.elapsed() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn construction_fails_fast() {
        let unknown = create_animation("moonwalk", BodyProfile::default(), Default::default());
        assert!(matches!(unknown, Err(PldError::UnknownAction(_))));

        let bad_fps = create_animation(
            "walking",
            BodyProfile::default(),
            AnimationOptions::default().with_fps(-5.0),
        );
        assert!(matches!(bad_fps, Err(PldError::InvalidOptions(_))));

        for options in [
            AnimationOptions::default().with_fps(1e-39),
            AnimationOptions::default().with_duration(1e-45),
        ] {
            let frozen = create_animation("walking", BodyProfile::default(), options);
            assert!(matches!(frozen, Err(PldError::InvalidOptions(_))));
        }

        let options = AnimationOptions {
            dimensions: Some(crate::skeleton::BodyDimensions {
                upper_arm: 0.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        let degenerate = create_animation("bowing", BodyProfile::default(), options);
        assert!(matches!(degenerate, Err(PldError::DegenerateChain { .. })));
    }
}
